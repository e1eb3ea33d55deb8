//! Query gateway: the core's view of the remote pathway service.
//!
//! Two layers:
//! - `PathwayService`: raw remote calls on one live connection, implemented by a transport
//!   crate (HTTP/JSON, SOAP, an in-memory fake).
//! - `QueryGateway`: what the pipeline and client consume. `ReconnectingGateway` implements it
//!   over any `ServiceConnector`, re-reading the endpoint setting before every call and
//!   reconnecting when it changed. It also owns progress naming and set-based dedup of
//!   browse results.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use crate::config::{parse_endpoint, EndpointSetting};
use crate::model::{
    CurationTag, DocumentIdentifier, LocalDocumentModel, PathwayInfo, ReferenceKey,
    RemoteDocument, SearchResult,
};
use crate::progress::ProgressSink;

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Message used when the configured endpoint is not a usable URL.
pub const INVALID_URL_MESSAGE: &str = "Can not connect to WikiPathways.\nInvalid URL.";

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// Endpoint unreachable or misconfigured.
    #[error("{0}")]
    NotConnected(String),

    /// The requested record does not exist remotely.
    #[error("not found: {0}")]
    NotFound(String),

    /// The service answered with a fault.
    #[error("service fault: {0}")]
    Service(String),

    /// The service answered with a body that could not be decoded.
    #[error("could not decode service response: {0}")]
    Decode(String),

    /// A write was attempted without a valid login.
    #[error("not authorized: {0}")]
    Unauthorized(String),

    #[error("operation not supported by this service: {0}")]
    Unsupported(&'static str),
}

/// Raw remote operations on one connection.
#[async_trait]
pub trait PathwayService: Send + Sync + 'static {
    async fn get_pathway(&self, id: &str, revision: u64) -> GatewayResult<RemoteDocument>;
    async fn list_pathways(&self, organism: Option<&str>) -> GatewayResult<Vec<PathwayInfo>>;
    async fn find_by_text(
        &self,
        text: &str,
        organism: Option<&str>,
    ) -> GatewayResult<Vec<SearchResult>>;
    async fn find_by_xrefs(&self, keys: &[ReferenceKey]) -> GatewayResult<Vec<SearchResult>>;
    async fn list_organisms(&self) -> GatewayResult<Vec<String>>;
    async fn curation_tags(&self, id: &str) -> GatewayResult<Vec<CurationTag>>;
    async fn curation_tags_by_name(&self, tag: &str) -> GatewayResult<Vec<CurationTag>>;
    async fn pathway_info(&self, id: &str) -> GatewayResult<PathwayInfo>;

    async fn find_by_literature(&self, _reference: &str) -> GatewayResult<Vec<SearchResult>> {
        Err(GatewayError::Unsupported("findPathwaysByLiterature"))
    }

    async fn xref_list(&self, _id: &str, _namespace: &str) -> GatewayResult<Vec<String>> {
        Err(GatewayError::Unsupported("getXrefList"))
    }

    async fn login(&self, _user: &str, _password: &str) -> GatewayResult<()> {
        Err(GatewayError::Unsupported("login"))
    }

    async fn create_pathway(&self, _gpml: &str) -> GatewayResult<PathwayInfo> {
        Err(GatewayError::Unsupported("createPathway"))
    }

    async fn update_pathway(
        &self,
        _id: &str,
        _gpml: &str,
        _description: &str,
        _revision: u64,
    ) -> GatewayResult<()> {
        Err(GatewayError::Unsupported("updatePathway"))
    }

    async fn save_curation_tag(
        &self,
        _id: &str,
        _tag: &str,
        _text: &str,
        _revision: u64,
    ) -> GatewayResult<()> {
        Err(GatewayError::Unsupported("saveCurationTag"))
    }
}

/// Creates a `PathwayService` for an endpoint URL.
pub trait ServiceConnector: Send + Sync + 'static {
    type Service: PathwayService;

    fn connect(&self, endpoint: &Url) -> GatewayResult<Self::Service>;
}

/// Operations the pipeline and client consume.
///
/// Every call may fail with `GatewayError::NotConnected`.
#[async_trait]
pub trait QueryGateway: Send + Sync + 'static {
    async fn fetch_by_id(
        &self,
        id: &DocumentIdentifier,
        progress: Option<&dyn ProgressSink>,
    ) -> GatewayResult<RemoteDocument>;

    async fn fetch_by_reference_keys(
        &self,
        keys: &[ReferenceKey],
        progress: Option<&dyn ProgressSink>,
    ) -> GatewayResult<Vec<SearchResult>>;

    async fn search_by_text(
        &self,
        text: &str,
        organism: Option<&str>,
        progress: Option<&dyn ProgressSink>,
    ) -> GatewayResult<Vec<SearchResult>>;

    async fn find_by_literature_reference(
        &self,
        reference: &str,
        progress: Option<&dyn ProgressSink>,
    ) -> GatewayResult<Vec<SearchResult>>;

    async fn browse_all(
        &self,
        progress: Option<&dyn ProgressSink>,
    ) -> GatewayResult<HashSet<PathwayInfo>>;

    async fn browse_by_organism(
        &self,
        organism: &str,
        progress: Option<&dyn ProgressSink>,
    ) -> GatewayResult<HashSet<PathwayInfo>>;

    async fn browse_by_curation_tag(
        &self,
        tag: &str,
        progress: Option<&dyn ProgressSink>,
    ) -> GatewayResult<HashSet<PathwayInfo>>;

    async fn browse_by_organism_and_curation_tag(
        &self,
        organism: &str,
        tag: &str,
        progress: Option<&dyn ProgressSink>,
    ) -> GatewayResult<HashSet<PathwayInfo>>;

    async fn list_organisms(
        &self,
        progress: Option<&dyn ProgressSink>,
    ) -> GatewayResult<Vec<String>>;

    async fn curation_tags(
        &self,
        id: &str,
        progress: Option<&dyn ProgressSink>,
    ) -> GatewayResult<HashSet<CurationTag>>;

    async fn pathway_info(
        &self,
        id: &str,
        progress: Option<&dyn ProgressSink>,
    ) -> GatewayResult<PathwayInfo>;

    async fn xref_list(
        &self,
        id: &str,
        namespace: &str,
        progress: Option<&dyn ProgressSink>,
    ) -> GatewayResult<Vec<String>>;

    async fn login(&self, user: &str, password: &str) -> GatewayResult<()>;

    async fn upload(&self, document: &LocalDocumentModel) -> GatewayResult<PathwayInfo>;

    async fn update(
        &self,
        document: &LocalDocumentModel,
        id: &str,
        revision: u64,
        description: &str,
    ) -> GatewayResult<()>;

    async fn update_curation_tag(
        &self,
        tag: &str,
        id: &str,
        description: &str,
        revision: u64,
    ) -> GatewayResult<()>;
}

struct Connection<S> {
    endpoint: String,
    service: Arc<S>,
}

/// `QueryGateway` over a connector, reconnecting whenever the endpoint setting changes.
pub struct ReconnectingGateway<C: ServiceConnector> {
    connector: C,
    endpoint: EndpointSetting,
    current: Mutex<Option<Connection<C::Service>>>,
}

impl<C: ServiceConnector> ReconnectingGateway<C> {
    pub fn new(connector: C, endpoint: EndpointSetting) -> Self {
        Self {
            connector,
            endpoint,
            current: Mutex::new(None),
        }
    }

    pub fn endpoint(&self) -> &EndpointSetting {
        &self.endpoint
    }

    /// Return the live service, (re)connecting if the configured endpoint changed.
    fn service(&self) -> GatewayResult<Arc<C::Service>> {
        let wanted = self.endpoint.get();
        let mut current = self.current.lock();

        if let Some(conn) = current.as_ref() {
            if conn.endpoint == wanted {
                return Ok(conn.service.clone());
            }
        }

        let url = parse_endpoint(&wanted).ok_or_else(|| {
            warn!(endpoint = %wanted, "rejecting invalid pathway service URL");
            GatewayError::NotConnected(INVALID_URL_MESSAGE.to_string())
        })?;

        let service = Arc::new(self.connector.connect(&url)?);
        info!(endpoint = %wanted, "connected to pathway service");
        *current = Some(Connection {
            endpoint: wanted,
            service: service.clone(),
        });
        Ok(service)
    }
}

fn task(progress: Option<&dyn ProgressSink>, name: &str) {
    if let Some(p) = progress {
        p.set_task_name(name);
    }
}

fn report(progress: Option<&dyn ProgressSink>, message: &str) {
    if let Some(p) = progress {
        p.report(message);
    }
}

#[async_trait]
impl<C: ServiceConnector> QueryGateway for ReconnectingGateway<C> {
    async fn fetch_by_id(
        &self,
        id: &DocumentIdentifier,
        progress: Option<&dyn ProgressSink>,
    ) -> GatewayResult<RemoteDocument> {
        let service = self.service()?;
        task(progress, &format!("Get pathway {}.", id.id));
        service.get_pathway(&id.id, id.wire_revision()).await
    }

    async fn fetch_by_reference_keys(
        &self,
        keys: &[ReferenceKey],
        progress: Option<&dyn ProgressSink>,
    ) -> GatewayResult<Vec<SearchResult>> {
        let service = self.service()?;
        task(progress, "Find pathways containing\nxrefs.");
        service.find_by_xrefs(keys).await
    }

    async fn search_by_text(
        &self,
        text: &str,
        organism: Option<&str>,
        progress: Option<&dyn ProgressSink>,
    ) -> GatewayResult<Vec<SearchResult>> {
        let service = self.service()?;
        match organism {
            Some(o) => task(progress, &format!("Search for \"{text}\" in {o} pathways.")),
            None => task(progress, &format!("Search for \"{text}\".")),
        }
        service.find_by_text(text, organism).await
    }

    async fn find_by_literature_reference(
        &self,
        reference: &str,
        progress: Option<&dyn ProgressSink>,
    ) -> GatewayResult<Vec<SearchResult>> {
        let service = self.service()?;
        task(progress, &format!("Search for literature reference \"{reference}\"."));
        service.find_by_literature(reference).await
    }

    async fn browse_all(
        &self,
        progress: Option<&dyn ProgressSink>,
    ) -> GatewayResult<HashSet<PathwayInfo>> {
        let service = self.service()?;
        task(progress, "Browsing WikiPathways");
        Ok(service.list_pathways(None).await?.into_iter().collect())
    }

    async fn browse_by_organism(
        &self,
        organism: &str,
        progress: Option<&dyn ProgressSink>,
    ) -> GatewayResult<HashSet<PathwayInfo>> {
        let service = self.service()?;
        task(progress, "Browse WikiPathways");
        report(progress, &format!("Get pathways for species {organism}"));
        Ok(service.list_pathways(Some(organism)).await?.into_iter().collect())
    }

    async fn browse_by_curation_tag(
        &self,
        tag: &str,
        progress: Option<&dyn ProgressSink>,
    ) -> GatewayResult<HashSet<PathwayInfo>> {
        let service = self.service()?;
        task(progress, "Browse WikiPathways");
        report(progress, &format!("Get pathways with curation tag: {tag}"));
        let tags = service.curation_tags_by_name(tag).await?;
        Ok(tags.into_iter().map(|t| t.pathway).collect())
    }

    async fn browse_by_organism_and_curation_tag(
        &self,
        organism: &str,
        tag: &str,
        progress: Option<&dyn ProgressSink>,
    ) -> GatewayResult<HashSet<PathwayInfo>> {
        let tagged = self.browse_by_curation_tag(tag, progress).await?;
        report(progress, &format!("Filter pathways for species {organism}"));
        Ok(tagged.into_iter().filter(|info| info.species == organism).collect())
    }

    async fn list_organisms(
        &self,
        progress: Option<&dyn ProgressSink>,
    ) -> GatewayResult<Vec<String>> {
        let service = self.service()?;
        task(progress, "Test connection to WikiPathways");
        report(progress, "Get list of organisms from WikiPathways");
        service.list_organisms().await
    }

    async fn curation_tags(
        &self,
        id: &str,
        progress: Option<&dyn ProgressSink>,
    ) -> GatewayResult<HashSet<CurationTag>> {
        let service = self.service()?;
        task(progress, "Retrieve curation tag");
        report(progress, &format!("Get curation tags for pathway {id}"));
        Ok(service.curation_tags(id).await?.into_iter().collect())
    }

    async fn pathway_info(
        &self,
        id: &str,
        progress: Option<&dyn ProgressSink>,
    ) -> GatewayResult<PathwayInfo> {
        let service = self.service()?;
        task(progress, &format!("Get pathway {id}."));
        service.pathway_info(id).await
    }

    async fn xref_list(
        &self,
        id: &str,
        namespace: &str,
        progress: Option<&dyn ProgressSink>,
    ) -> GatewayResult<Vec<String>> {
        let service = self.service()?;
        task(progress, "Retrieve Xref List");
        service.xref_list(id, namespace).await
    }

    async fn login(&self, user: &str, password: &str) -> GatewayResult<()> {
        self.service()?.login(user, password).await
    }

    async fn upload(&self, document: &LocalDocumentModel) -> GatewayResult<PathwayInfo> {
        self.service()?.create_pathway(&document.gpml).await
    }

    async fn update(
        &self,
        document: &LocalDocumentModel,
        id: &str,
        revision: u64,
        description: &str,
    ) -> GatewayResult<()> {
        self.service()?
            .update_pathway(id, &document.gpml, description, revision)
            .await
    }

    async fn update_curation_tag(
        &self,
        tag: &str,
        id: &str,
        description: &str,
        revision: u64,
    ) -> GatewayResult<()> {
        self.service()?
            .save_curation_tag(id, tag, description, revision)
            .await
    }
}
