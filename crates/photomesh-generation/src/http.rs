use crate::{EditOutcome, ModelGenerator};
use async_trait::async_trait;
use photomesh_core::{PhotomeshError, PhotomeshResult};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

/// Client for a remote image-to-3D service speaking JSON over HTTP.
///
/// - `POST {base}/v1/generate/initial` with `{"images": [...]}` returns
///   `{"model_url": "..."}`.
/// - `POST {base}/v1/generate/edit` with `{"images", "prompt", "step_index"}`
///   returns `{"model_url": "...", "edited_images": [...]}`.
pub struct HttpGenerator {
    base_url: String,
    api_key: Option<String>,
    http: reqwest::Client,
}

#[derive(Serialize)]
struct InitialRequest<'a> {
    images: &'a [String],
}

#[derive(Serialize)]
struct EditRequest<'a> {
    images: &'a [String],
    prompt: &'a str,
    step_index: usize,
}

#[derive(Deserialize)]
struct InitialResponse {
    model_url: String,
}

#[derive(Deserialize)]
struct EditResponse {
    model_url: String,
    #[serde(default)]
    edited_images: Option<Vec<String>>,
}

impl HttpGenerator {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> PhotomeshResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PhotomeshError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
            http,
        })
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> PhotomeshResult<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = format!("{}{path}", self.base_url);

        let mut req = self.http.post(&url).json(body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req.send().await.map_err(|e| {
            if e.is_timeout() {
                PhotomeshError::ExternalService(format!("timeout calling {url}"))
            } else {
                PhotomeshError::ExternalService(format!("request to {url} failed: {e}"))
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            warn!(%url, status = status.as_u16(), "Generation service returned an error");
            return Err(PhotomeshError::ExternalService(format!(
                "generation service error {status}: {text}"
            )));
        }

        resp.json::<R>().await.map_err(|e| {
            if e.is_timeout() {
                PhotomeshError::ExternalService(format!("timeout reading response from {url}"))
            } else {
                PhotomeshError::ExternalService(format!("invalid response from {url}: {e}"))
            }
        })
    }
}

#[async_trait]
impl ModelGenerator for HttpGenerator {
    async fn generate_initial(&self, images: &[String]) -> PhotomeshResult<String> {
        info!(image_count = images.len(), "Requesting initial generation");
        let resp: InitialResponse = self
            .post("/v1/generate/initial", &InitialRequest { images })
            .await?;
        Ok(resp.model_url)
    }

    async fn generate_edit(
        &self,
        images: &[String],
        prompt: &str,
        step_index: usize,
    ) -> PhotomeshResult<EditOutcome> {
        info!(step_index, image_count = images.len(), "Requesting edit");
        let resp: EditResponse = self
            .post(
                "/v1/generate/edit",
                &EditRequest {
                    images,
                    prompt,
                    step_index,
                },
            )
            .await?;

        Ok(EditOutcome {
            model_reference: resp.model_url,
            images: resp.edited_images.unwrap_or_else(|| images.to_vec()),
        })
    }
}
