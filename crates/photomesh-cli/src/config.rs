//! Loading `photomesh.toml` and applying environment overrides.

use photomesh_core::{PhotomeshError, PhotomeshResult};
use photomesh_generation::GeneratorConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Environment variable that overrides `generator.api_key`.
pub const API_KEY_ENV: &str = "PHOTOMESH_GENERATOR_API_KEY";

/// Top-level config file.
#[derive(Debug, Deserialize)]
pub struct PhotomeshConfig {
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
}

/// `[server]` section.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Request body cap for `/upload`.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl Default for PhotomeshConfig {
    fn default() -> Self {
        Self {
            static_dir: default_static_dir(),
            server: ServerConfig::default(),
            generator: GeneratorConfig::default(),
        }
    }
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("./static")
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8000
}
fn default_max_upload_bytes() -> usize {
    20 * 1024 * 1024
}

impl PhotomeshConfig {
    pub fn parse(raw: &str) -> PhotomeshResult<Self> {
        let config: Self = toml::from_str(raw)
            .map_err(|e| PhotomeshError::Config(format!("invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from disk. A missing file yields the defaults.
    pub async fn load(path: &Path) -> PhotomeshResult<Self> {
        match tokio::fs::read_to_string(path).await {
            Ok(raw) => Self::parse(&raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "Config file not found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(PhotomeshError::Config(format!(
                "failed to read config file '{}': {e}",
                path.display()
            ))),
        }
    }

    /// Let the environment supply the generator API key.
    pub fn apply_env_overrides(&mut self, api_key: Option<String>) {
        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            self.generator.api_key = Some(key);
        }
    }

    pub fn validate(&self) -> PhotomeshResult<()> {
        if self.server.max_upload_bytes == 0 {
            return Err(PhotomeshError::Config(
                "server.max_upload_bytes must be greater than zero".to_string(),
            ));
        }
        self.generator.validate()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use photomesh_generation::GeneratorProvider;

    #[test]
    fn empty_file_uses_defaults() {
        let config = PhotomeshConfig::parse("").unwrap();
        assert_eq!(config.static_dir, PathBuf::from("./static"));
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.generator.provider, GeneratorProvider::Stub);
    }

    #[test]
    fn full_file() {
        let config = PhotomeshConfig::parse(
            r#"
            static_dir = "/var/lib/photomesh"

            [server]
            port = 9100
            max_upload_bytes = 1048576

            [generator]
            provider = "http"
            base_url = "https://gen.internal"
            timeout_secs = 30

            [generator.retry_policy]
            max_retries = 1
            backoff_base_ms = 200
            backoff_max_ms = 400
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.max_upload_bytes, 1_048_576);
        assert_eq!(config.generator.provider, GeneratorProvider::Http);
        assert_eq!(config.generator.timeout_secs, 30);
    }

    #[test]
    fn http_without_url_is_rejected() {
        let err = PhotomeshConfig::parse("[generator]\nprovider = \"http\"").unwrap_err();
        assert!(matches!(err, PhotomeshError::Config(_)));
    }

    #[test]
    fn unknown_provider_is_rejected() {
        assert!(PhotomeshConfig::parse("[generator]\nprovider = \"magic\"").is_err());
    }

    #[test]
    fn env_key_overrides_file() {
        let mut config = PhotomeshConfig::parse("[generator]\napi_key = \"from-file\"").unwrap();
        config.apply_env_overrides(Some(String::new()));
        assert_eq!(config.generator.api_key.as_deref(), Some("from-file"));
        config.apply_env_overrides(Some("from-env".to_string()));
        assert_eq!(config.generator.api_key.as_deref(), Some("from-env"));
    }

    #[tokio::test]
    async fn missing_file_yields_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let config = PhotomeshConfig::load(&tmp.path().join("absent.toml")).await.unwrap();
        assert_eq!(config.server.port, 8000);
    }
}
