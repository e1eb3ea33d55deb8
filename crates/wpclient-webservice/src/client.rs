//! HTTP client for the WikiPathways webservice.
//!
//! Every remote method is one request against `<base>/<method>` with `format=json`.
//! Reads are GETs with query parameters; writes are form POSTs carrying the
//! credentials obtained from `login`.

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use url::Url;

use wpclient_core::config::EndpointSetting;
use wpclient_core::defaults;
use wpclient_core::gateway::{
    GatewayError, GatewayResult, PathwayService, ReconnectingGateway, ServiceConnector,
};
use wpclient_core::model::{CurationTag, PathwayInfo, ReferenceKey, RemoteDocument, SearchResult};

use crate::constants::{self, system_code, FORMAT_PARAM, USER_AGENT};
use crate::wire;

type Params = Vec<(&'static str, String)>;

/// Longest service body quoted in a fault message.
const FAULT_SNIPPET_CHARS: usize = 200;

#[derive(Debug, Clone)]
struct Credentials {
    user: String,
    key: String,
}

/// One live connection to a webservice endpoint.
#[derive(Debug)]
pub struct WebserviceClient {
    http: reqwest::Client,
    base: Url,
    auth: Mutex<Option<Credentials>>,
}

impl WebserviceClient {
    pub fn new(endpoint: &Url, timeout: Duration) -> GatewayResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(cannot_connect)?;

        let mut base = endpoint.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Ok(Self {
            http,
            base,
            auth: Mutex::new(None),
        })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Name of the logged-in user, if any.
    pub fn user(&self) -> Option<String> {
        self.auth.lock().as_ref().map(|c| c.user.clone())
    }

    fn method_url(&self, method: &str) -> GatewayResult<Url> {
        self.base
            .join(method)
            .map_err(cannot_connect)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        method: &'static str,
        params: Params,
    ) -> GatewayResult<T> {
        let url = self.method_url(method)?;
        debug!(method, %url, "webservice request");
        let resp = self
            .http
            .get(url)
            .query(&params)
            .query(&[FORMAT_PARAM])
            .send()
            .await
            .map_err(|e| transport(method, e))?;
        decode(method, resp).await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        method: &'static str,
        mut params: Params,
    ) -> GatewayResult<T> {
        let creds = self.credentials(method)?;
        params.push(("auth", creds.key));
        params.push(("username", creds.user));

        let url = self.method_url(method)?;
        debug!(method, %url, "webservice write");
        let resp = self
            .http
            .post(url)
            .query(&[FORMAT_PARAM])
            .form(&params)
            .send()
            .await
            .map_err(|e| transport(method, e))?;
        decode(method, resp).await
    }

    fn credentials(&self, method: &str) -> GatewayResult<Credentials> {
        self.auth
            .lock()
            .clone()
            .ok_or_else(|| GatewayError::Unauthorized(format!("{method} requires a login")))
    }
}

fn cannot_connect(err: impl std::fmt::Display) -> GatewayError {
    GatewayError::NotConnected(format!("Can not connect to WikiPathways.\n{err}"))
}

fn transport(method: &str, err: reqwest::Error) -> GatewayError {
    if err.is_decode() {
        return GatewayError::Decode(format!("{method}: {err}"));
    }
    warn!(method, error = %err, "webservice unreachable");
    GatewayError::NotConnected(format!("Can not connect to WikiPathways.\n{method}: {err}"))
}

async fn decode<T: DeserializeOwned>(method: &str, resp: reqwest::Response) -> GatewayResult<T> {
    let status = resp.status();
    let body = resp.bytes().await.map_err(|e| transport(method, e))?;

    if !status.is_success() {
        return Err(classify_status(method, status, &String::from_utf8_lossy(&body)));
    }

    serde_json::from_slice(&body).map_err(|e| GatewayError::Decode(format!("{method}: {e}")))
}

/// Map a non-success response to a gateway error.
pub(crate) fn classify_status(method: &str, status: StatusCode, body: &str) -> GatewayError {
    let snippet: String = body.trim().chars().take(FAULT_SNIPPET_CHARS).collect();
    let lower = snippet.to_ascii_lowercase();

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            GatewayError::Unauthorized(format!("{method}: {snippet}"))
        }
        StatusCode::NOT_FOUND => GatewayError::NotFound(format!("{method}: {snippet}")),
        _ if lower.contains("not found") || lower.contains("does not exist") => {
            GatewayError::NotFound(format!("{method}: {snippet}"))
        }
        _ => GatewayError::Service(format!("{method}: HTTP {}: {snippet}", status.as_u16())),
    }
}

#[async_trait]
impl PathwayService for WebserviceClient {
    async fn get_pathway(&self, id: &str, revision: u64) -> GatewayResult<RemoteDocument> {
        let resp: wire::GetPathwayResponse = self
            .get(
                constants::GET_PATHWAY,
                vec![("pwId", id.to_string()), ("revision", revision.to_string())],
            )
            .await?;
        resp.pathway.try_into()
    }

    async fn list_pathways(&self, organism: Option<&str>) -> GatewayResult<Vec<PathwayInfo>> {
        let mut params = Params::new();
        if let Some(o) = organism {
            params.push(("organism", o.to_string()));
        }
        let resp: wire::ListPathwaysResponse = self.get(constants::LIST_PATHWAYS, params).await?;
        Ok(resp.pathways.into_iter().map(Into::into).collect())
    }

    async fn find_by_text(
        &self,
        text: &str,
        organism: Option<&str>,
    ) -> GatewayResult<Vec<SearchResult>> {
        let mut params = vec![("query", text.to_string())];
        if let Some(o) = organism {
            params.push(("species", o.to_string()));
        }
        let resp: wire::FindResponse = self.get(constants::FIND_BY_TEXT, params).await?;
        Ok(resp.result.into_iter().map(Into::into).collect())
    }

    async fn find_by_xrefs(&self, keys: &[ReferenceKey]) -> GatewayResult<Vec<SearchResult>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let mut params = Params::with_capacity(keys.len() * 2);
        for key in keys {
            params.push(("ids", key.identifier.clone()));
            params.push(("codes", system_code(&key.namespace).to_string()));
        }
        let resp: wire::FindResponse = self.get(constants::FIND_BY_XREF, params).await?;
        Ok(resp.result.into_iter().map(Into::into).collect())
    }

    async fn list_organisms(&self) -> GatewayResult<Vec<String>> {
        let resp: wire::OrganismsResponse =
            self.get(constants::LIST_ORGANISMS, Params::new()).await?;
        Ok(resp.organisms)
    }

    async fn curation_tags(&self, id: &str) -> GatewayResult<Vec<CurationTag>> {
        let resp: wire::TagsResponse = self
            .get(constants::GET_CURATION_TAGS, vec![("pwId", id.to_string())])
            .await?;
        Ok(resp.tags.into_iter().map(Into::into).collect())
    }

    async fn curation_tags_by_name(&self, tag: &str) -> GatewayResult<Vec<CurationTag>> {
        let resp: wire::TagsResponse = self
            .get(constants::GET_CURATION_TAGS_BY_NAME, vec![("tagName", tag.to_string())])
            .await?;
        Ok(resp.tags.into_iter().map(Into::into).collect())
    }

    async fn pathway_info(&self, id: &str) -> GatewayResult<PathwayInfo> {
        let resp: wire::PathwayInfoResponse = self
            .get(constants::GET_PATHWAY_INFO, vec![("pwId", id.to_string())])
            .await?;
        Ok(resp.pathway_info.into())
    }

    async fn find_by_literature(&self, reference: &str) -> GatewayResult<Vec<SearchResult>> {
        let resp: wire::FindResponse = self
            .get(constants::FIND_BY_LITERATURE, vec![("query", reference.to_string())])
            .await?;
        Ok(resp.result.into_iter().map(Into::into).collect())
    }

    async fn xref_list(&self, id: &str, namespace: &str) -> GatewayResult<Vec<String>> {
        let resp: wire::XrefsResponse = self
            .get(
                constants::GET_XREF_LIST,
                vec![("pwId", id.to_string()), ("code", system_code(namespace).to_string())],
            )
            .await?;
        Ok(resp.xrefs)
    }

    async fn login(&self, user: &str, password: &str) -> GatewayResult<()> {
        let resp: wire::AuthResponse = self
            .get(
                constants::LOGIN,
                vec![("name", user.to_string()), ("pass", password.to_string())],
            )
            .await?;
        if resp.auth.trim().is_empty() {
            return Err(GatewayError::Unauthorized(format!("login rejected for {user}")));
        }
        info!(user, "logged in to webservice");
        *self.auth.lock() = Some(Credentials {
            user: user.to_string(),
            key: resp.auth,
        });
        Ok(())
    }

    async fn create_pathway(&self, gpml: &str) -> GatewayResult<PathwayInfo> {
        let resp: wire::PathwayInfoResponse = self
            .post(constants::CREATE_PATHWAY, vec![("gpml", gpml.to_string())])
            .await?;
        Ok(resp.pathway_info.into())
    }

    async fn update_pathway(
        &self,
        id: &str,
        gpml: &str,
        description: &str,
        revision: u64,
    ) -> GatewayResult<()> {
        let resp: wire::SuccessResponse = self
            .post(
                constants::UPDATE_PATHWAY,
                vec![
                    ("pwId", id.to_string()),
                    ("description", description.to_string()),
                    ("gpml", gpml.to_string()),
                    ("revision", revision.to_string()),
                ],
            )
            .await?;
        require_success(constants::UPDATE_PATHWAY, resp)
    }

    async fn save_curation_tag(
        &self,
        id: &str,
        tag: &str,
        text: &str,
        revision: u64,
    ) -> GatewayResult<()> {
        let resp: wire::SuccessResponse = self
            .post(
                constants::SAVE_CURATION_TAG,
                vec![
                    ("pwId", id.to_string()),
                    ("tagName", tag.to_string()),
                    ("text", text.to_string()),
                    ("revision", revision.to_string()),
                ],
            )
            .await?;
        require_success(constants::SAVE_CURATION_TAG, resp)
    }
}

fn require_success(method: &str, resp: wire::SuccessResponse) -> GatewayResult<()> {
    if resp.success {
        Ok(())
    } else {
        Err(GatewayError::Service(format!("{method}: service reported failure")))
    }
}

/// Builds a `WebserviceClient` per endpoint.
#[derive(Debug, Clone)]
pub struct WebserviceConnector {
    timeout: Duration,
}

impl WebserviceConnector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for WebserviceConnector {
    fn default() -> Self {
        Self::new(Duration::from_millis(defaults::REQUEST_TIMEOUT_MS))
    }
}

impl ServiceConnector for WebserviceConnector {
    type Service = WebserviceClient;

    fn connect(&self, endpoint: &Url) -> GatewayResult<WebserviceClient> {
        WebserviceClient::new(endpoint, self.timeout)
    }
}

/// Query gateway backed by the HTTP webservice.
pub type WebserviceGateway = ReconnectingGateway<WebserviceConnector>;

pub fn gateway(endpoint: EndpointSetting, timeout: Duration) -> WebserviceGateway {
    ReconnectingGateway::new(WebserviceConnector::new(timeout), endpoint)
}
