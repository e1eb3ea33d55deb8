//! Configuration structures for wpclient-core.
//!
//! The core crate does not read environment variables or preference files. Hosts build a
//! `ClientConfig` explicitly and may keep an `EndpointSetting` handle to change the
//! service URL at runtime (the gateway re-reads it before every call).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use url::Url;

use crate::defaults;
use crate::errors::{ClientError, ClientResult};

/// Global configuration container.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Webservice base URL at startup.
    pub endpoint: String,
    /// Plugin data directory; the cache lives in `<data_dir>/<cache_subdir>`.
    pub data_dir: PathBuf,
    pub cache_subdir: String,
    /// Startup parameter: open this pathway once the client starts.
    pub startup: Option<StartupParameter>,
    pub request_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::ENDPOINT_URL.to_string(),
            data_dir: std::env::temp_dir().join("wpclient"),
            cache_subdir: defaults::CACHE_SUBDIR.to_string(),
            startup: None,
            request_timeout_ms: defaults::REQUEST_TIMEOUT_MS,
        }
    }
}

impl ClientConfig {
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_startup(mut self, startup: StartupParameter) -> Self {
        self.startup = Some(startup);
        self
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.data_dir.join(&self.cache_subdir)
    }
}

/// The `wp.id` startup parameter family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupParameter {
    pub pathway_id: String,
    /// Prefix of the identifier-mapping connection; the opened species is appended.
    pub id_mapper_prefix: String,
}

impl StartupParameter {
    pub fn new(pathway_id: impl Into<String>) -> Self {
        Self {
            pathway_id: pathway_id.into(),
            id_mapper_prefix: defaults::ID_MAPPER_PREFIX.to_string(),
        }
    }

    pub fn id_mapper_connection(&self, species: &str) -> String {
        format!("{}{}", self.id_mapper_prefix, species)
    }
}

/// Shared, runtime-mutable service URL setting.
///
/// Cloning yields another handle to the same value.
#[derive(Debug, Clone)]
pub struct EndpointSetting {
    inner: Arc<RwLock<String>>,
}

impl EndpointSetting {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(url.into())),
        }
    }

    pub fn get(&self) -> String {
        self.inner.read().clone()
    }

    pub fn set(&self, url: impl Into<String>) {
        *self.inner.write() = url.into();
    }
}

/// Parse an endpoint string as an absolute http(s) URL.
pub fn parse_endpoint(raw: &str) -> Option<Url> {
    let url = Url::parse(raw.trim()).ok()?;
    match url.scheme() {
        "http" | "https" if url.has_host() => Some(url),
        _ => None,
    }
}

/// Validate a full configuration object.
pub fn validate_config(cfg: &ClientConfig) -> ClientResult<()> {
    if parse_endpoint(&cfg.endpoint).is_none() {
        return Err(ClientError::invalid_config(format!(
            "endpoint must be an absolute http(s) URL, got {:?}",
            cfg.endpoint
        )));
    }

    let subdir = Path::new(&cfg.cache_subdir);
    if cfg.cache_subdir.trim().is_empty() || subdir.components().count() != 1 {
        return Err(ClientError::invalid_config(
            "cache_subdir must be a single non-empty path component",
        ));
    }

    if cfg.request_timeout_ms == 0 {
        return Err(ClientError::invalid_config(
            "request_timeout_ms must be greater than zero",
        ));
    }

    if let Some(startup) = &cfg.startup {
        if startup.pathway_id.trim().is_empty() {
            return Err(ClientError::invalid_config("startup pathway id must not be empty"));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = ClientConfig::default();
        validate_config(&cfg).unwrap();
        assert!(cfg.cache_dir().ends_with(defaults::CACHE_SUBDIR));
    }

    #[test]
    fn invalid_endpoint_detected() {
        let cfg = ClientConfig::default().with_endpoint("webservice.wikipathways.org");
        assert!(validate_config(&cfg).is_err());
        let cfg = ClientConfig::default().with_endpoint("ftp://example.org/");
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn nested_cache_subdir_detected() {
        let mut cfg = ClientConfig::default();
        cfg.cache_subdir = "a/b".to_string();
        assert!(validate_config(&cfg).is_err());
        cfg.cache_subdir = "".to_string();
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn endpoint_setting_is_shared() {
        let a = EndpointSetting::new("http://one/");
        let b = a.clone();
        b.set("http://two/");
        assert_eq!(a.get(), "http://two/");
    }

    #[test]
    fn id_mapper_connection_appends_species() {
        let p = StartupParameter::new("WP4");
        assert_eq!(
            p.id_mapper_connection("Homo sapiens"),
            "idmapper-bridgerest:http://webservice.bridgedb.org/Homo sapiens"
        );
    }
}
