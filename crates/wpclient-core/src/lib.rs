//! wpclient-core
//!
//! Core of the WikiPathways client:
//! - pathway/reference/search data models
//! - the query gateway seam and its reconnecting adapter
//! - the session cache directory for converted documents
//! - the fetch -> convert -> persist -> open -> update-state -> highlight pipeline
//! - session state, enablement and the reference-key highlighter
//! - the foreground controller (`PathwayClient`) that owns session state
//!
//! Hosts (desktop editors, the CLI) plug in through `host::DocumentHost`;
//! concrete webservice transports plug in through `gateway::ServiceConnector`.

pub mod cache;
pub mod client;
pub mod config;
pub mod convert;
pub mod errors;
pub mod events;
pub mod gateway;
pub mod highlight;
pub mod host;
pub mod model;
pub mod pipeline;
pub mod progress;
pub mod session;
pub mod task;

pub use crate::errors::{ClientError, ClientResult};

/// Default values shared by the client and its hosts.
pub mod defaults {
    /// Default WikiPathways webservice base URL.
    pub const ENDPOINT_URL: &str = "https://webservice.wikipathways.org/";
    /// Name of the session cache directory under the plugin data dir.
    pub const CACHE_SUBDIR: &str = "wpclient-cache";
    /// Extension of cached documents.
    pub const CACHE_EXT: &str = "gpml";
    /// Name of the startup parameter carrying a pathway id.
    pub const STARTUP_PARAMETER: &str = "wp.id";
    /// Identifier-mapping connection prefix; the species name is appended.
    pub const ID_MAPPER_PREFIX: &str = "idmapper-bridgerest:http://webservice.bridgedb.org/";
    /// Per-request timeout for gateway calls.
    pub const REQUEST_TIMEOUT_MS: u64 = 30_000;
}

/// Convenience re-exports.
pub mod prelude {
    pub use crate::cache::DocumentCache;
    pub use crate::client::{ClientAction, PathwayClient};
    pub use crate::config::{validate_config, ClientConfig, EndpointSetting};
    pub use crate::convert::{DocumentConverter, GpmlConverter};
    pub use crate::events::{EventCategory, HostEvent, ListenerRegistry, MenuEntry};
    pub use crate::gateway::{GatewayError, GatewayResult, QueryGateway, ReconnectingGateway};
    pub use crate::highlight::{highlight, DocumentView, ModelView, Region, ViewElement};
    pub use crate::host::{DocumentHost, HostError};
    pub use crate::model::{
        CurationTag, DataNode, DocumentIdentifier, LocalDocumentModel, PathwayInfo, ReferenceKey,
        RemoteDocument, SearchResult,
    };
    pub use crate::pipeline::{
        FetchOpenPipeline, OpenError, OpenErrorKind, OpenOutcome, OpenReport, Step,
    };
    pub use crate::progress::{NullProgress, ProgressSink};
    pub use crate::session::{Enablement, SessionState};
    pub use crate::task::TaskHandle;
    pub use crate::{ClientError, ClientResult};
}
