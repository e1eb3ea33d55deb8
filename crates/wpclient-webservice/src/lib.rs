//! wpclient-webservice
//!
//! HTTP/JSON transport for the WikiPathways webservice:
//! - `WebserviceClient` implements `wpclient_core::gateway::PathwayService`
//! - `WebserviceConnector` plugs it into `ReconnectingGateway`
//! - `wire` holds the JSON envelopes and their mapping onto core models

pub mod client;
pub mod constants;
pub mod wire;

pub use crate::client::{gateway, WebserviceClient, WebserviceConnector, WebserviceGateway};
