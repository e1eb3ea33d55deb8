//! JSON envelopes of the webservice and their conversion into core models.
//!
//! The service is loose with scalar types: revisions and timestamps arrive as strings or
//! numbers, search scores as a number, a string or a one-entry object. Everything is
//! normalized here so the rest of the crate sees `wpclient_core::model` types only.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use wpclient_core::gateway::GatewayError;
use wpclient_core::model::{CurationTag, PathwayInfo, RemoteDocument, SearchResult};

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
    })
}

#[derive(Debug, Clone, Deserialize)]
pub struct WsPathwayInfo {
    pub id: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub species: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub revision: String,
}

impl From<WsPathwayInfo> for PathwayInfo {
    fn from(w: WsPathwayInfo) -> Self {
        PathwayInfo {
            id: w.id,
            url: w.url,
            name: w.name,
            species: w.species,
            revision: w.revision,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WsPathway {
    #[serde(flatten)]
    pub info: WsPathwayInfo,
    #[serde(default)]
    pub gpml: String,
}

impl TryFrom<WsPathway> for RemoteDocument {
    type Error = GatewayError;

    fn try_from(w: WsPathway) -> Result<Self, Self::Error> {
        let revision = w.info.revision.trim().parse::<u64>().map_err(|_| {
            GatewayError::Decode(format!(
                "pathway {} has non-numeric revision {:?}",
                w.info.id, w.info.revision
            ))
        })?;
        Ok(RemoteDocument {
            id: w.info.id,
            revision,
            name: w.info.name,
            species: w.info.species,
            url: w.info.url,
            gpml: w.gpml,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WsIndexField {
    pub name: String,
    #[serde(default)]
    pub values: Value,
}

impl WsIndexField {
    fn joined(&self) -> String {
        match &self.values {
            Value::Array(items) => items
                .iter()
                .map(scalar_text)
                .collect::<Vec<_>>()
                .join(", "),
            other => scalar_text(other),
        }
    }
}

fn scalar_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WsSearchResult {
    #[serde(flatten)]
    pub info: WsPathwayInfo,
    #[serde(default)]
    pub score: Value,
    #[serde(default)]
    pub fields: Vec<WsIndexField>,
}

/// Scores come as `1.5`, `"1.5"` or `{"0": "1.5"}`.
fn score_of(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Object(map) => map.values().next().and_then(score_of),
        _ => None,
    }
}

impl From<WsSearchResult> for SearchResult {
    fn from(w: WsSearchResult) -> Self {
        let fields: BTreeMap<String, String> = w
            .fields
            .iter()
            .map(|f| (f.name.clone(), f.joined()))
            .collect();
        SearchResult {
            score: score_of(&w.score),
            info: w.info.into(),
            fields,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WsCurationTag {
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    pub pathway: WsPathwayInfo,
    #[serde(default, deserialize_with = "lenient_string")]
    pub revision: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub time_modified: String,
    #[serde(default)]
    pub user_modified: String,
}

impl From<WsCurationTag> for CurationTag {
    fn from(w: WsCurationTag) -> Self {
        CurationTag {
            name: w.name,
            display_name: w.display_name,
            pathway: w.pathway.into(),
            revision: w.revision,
            text: w.text,
            time_modified: w.time_modified,
            user_modified: w.user_modified,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GetPathwayResponse {
    pub pathway: WsPathway,
}

#[derive(Debug, Deserialize)]
pub struct ListPathwaysResponse {
    #[serde(default)]
    pub pathways: Vec<WsPathwayInfo>,
}

#[derive(Debug, Deserialize)]
pub struct FindResponse {
    #[serde(default)]
    pub result: Vec<WsSearchResult>,
}

#[derive(Debug, Deserialize)]
pub struct OrganismsResponse {
    #[serde(default)]
    pub organisms: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct TagsResponse {
    #[serde(default)]
    pub tags: Vec<WsCurationTag>,
}

#[derive(Debug, Deserialize)]
pub struct PathwayInfoResponse {
    #[serde(rename = "pathwayInfo")]
    pub pathway_info: WsPathwayInfo,
}

#[derive(Debug, Deserialize)]
pub struct XrefsResponse {
    #[serde(default)]
    pub xrefs: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    pub auth: String,
}

#[derive(Debug, Deserialize)]
pub struct SuccessResponse {
    #[serde(default)]
    pub success: bool,
}
