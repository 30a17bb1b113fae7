use crate::http::HttpGenerator;
use crate::retry::{RetryPolicy, RetryingGenerator};
use crate::stub::StubGenerator;
use crate::ModelGenerator;
use photomesh_core::{PhotomeshError, PhotomeshResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Which generation backend to run against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorProvider {
    /// Local stand-in with fixed delays and placeholder artifacts.
    #[default]
    Stub,
    /// Remote image-to-3D service.
    Http,
}

/// `[generator]` section of the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default)]
    pub provider: GeneratorProvider,
    /// Remote service root; required for `http`.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_edit_delay_ms")]
    pub edit_delay_ms: u64,
    /// Stub only: write placeholder model files under the static root.
    #[serde(default = "default_true")]
    pub write_placeholders: bool,
    #[serde(default)]
    pub retry_policy: Option<RetryPolicy>,
}

fn default_timeout_secs() -> u64 {
    120
}
fn default_initial_delay_ms() -> u64 {
    3_000
}
fn default_edit_delay_ms() -> u64 {
    5_000
}
fn default_true() -> bool {
    true
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            provider: GeneratorProvider::default(),
            base_url: None,
            api_key: None,
            timeout_secs: default_timeout_secs(),
            initial_delay_ms: default_initial_delay_ms(),
            edit_delay_ms: default_edit_delay_ms(),
            write_placeholders: true,
            retry_policy: None,
        }
    }
}

impl GeneratorConfig {
    /// Reject combinations that cannot produce a working backend.
    pub fn validate(&self) -> PhotomeshResult<()> {
        if self.provider == GeneratorProvider::Http {
            match self.base_url.as_deref().map(str::trim) {
                Some(url) if url.starts_with("http://") || url.starts_with("https://") => {}
                Some(url) => {
                    return Err(PhotomeshError::Config(format!(
                        "generator.base_url must be an http(s) URL, got '{url}'"
                    )))
                }
                None => {
                    return Err(PhotomeshError::Config(
                        "generator.base_url is required when provider = \"http\"".to_string(),
                    ))
                }
            }
        }
        if self.timeout_secs == 0 {
            return Err(PhotomeshError::Config(
                "generator.timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Build the configured backend, wrapped in a [`RetryingGenerator`] when a
/// retry policy is present. `artifact_root` is where the stub writes
/// placeholder models.
pub fn build_generator(
    config: &GeneratorConfig,
    artifact_root: &Path,
) -> PhotomeshResult<Arc<dyn ModelGenerator>> {
    config.validate()?;

    let backend: Arc<dyn ModelGenerator> = match config.provider {
        GeneratorProvider::Stub => {
            let mut stub = StubGenerator::new(
                Duration::from_millis(config.initial_delay_ms),
                Duration::from_millis(config.edit_delay_ms),
            );
            if config.write_placeholders {
                stub = stub.with_artifact_root(artifact_root);
            }
            info!(
                initial_delay_ms = config.initial_delay_ms,
                edit_delay_ms = config.edit_delay_ms,
                "Using stub model generator"
            );
            Arc::new(stub)
        }
        GeneratorProvider::Http => {
            let base_url = config.base_url.clone().unwrap_or_default();
            info!(%base_url, timeout_secs = config.timeout_secs, "Using HTTP model generator");
            Arc::new(HttpGenerator::new(
                base_url,
                config.api_key.clone(),
                Duration::from_secs(config.timeout_secs),
            )?)
        }
    };

    Ok(match &config.retry_policy {
        Some(policy) => {
            info!(max_retries = policy.max_retries, "Generator retries enabled");
            Arc::new(RetryingGenerator::new(backend, policy.clone()))
        }
        None => backend,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_stub() {
        let config: GeneratorConfig = toml::from_str("").unwrap();
        assert_eq!(config.provider, GeneratorProvider::Stub);
        assert_eq!(config.timeout_secs, 120);
        assert!(config.write_placeholders);
        assert!(config.retry_policy.is_none());
    }

    #[test]
    fn http_requires_base_url() {
        let config: GeneratorConfig = toml::from_str("provider = \"http\"").unwrap();
        assert!(matches!(config.validate(), Err(PhotomeshError::Config(_))));

        let config: GeneratorConfig =
            toml::from_str("provider = \"http\"\nbase_url = \"ftp://x\"").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_retry_policy() {
        let config: GeneratorConfig = toml::from_str(
            r#"
            provider = "http"
            base_url = "http://localhost:9000"

            [retry_policy]
            max_retries = 2
            backoff_base_ms = 100
            backoff_max_ms = 1000
            "#,
        )
        .unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.retry_policy.unwrap().max_retries, 2);
    }

    #[tokio::test]
    async fn builds_stub_without_placeholders() {
        let tmp = tempfile::tempdir().unwrap();
        let config = GeneratorConfig {
            initial_delay_ms: 0,
            edit_delay_ms: 0,
            write_placeholders: false,
            ..GeneratorConfig::default()
        };

        let gen = build_generator(&config, tmp.path()).unwrap();
        let model = gen.generate_initial(&["images/a.jpg".to_string()]).await.unwrap();

        assert_eq!(model, crate::stub::INITIAL_MODEL_REF);
        assert!(!tmp.path().join("models").exists());
    }
}
