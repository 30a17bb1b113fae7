use crate::{EditOutcome, ModelGenerator};
use async_trait::async_trait;
use photomesh_core::{PhotomeshError, PhotomeshResult};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Reference returned for every initial generation.
pub const INITIAL_MODEL_REF: &str = "models/result_initial.glb";

const INITIAL_PLACEHOLDER: &[u8] = b"dummy 3d model content";
const EDIT_PLACEHOLDER: &[u8] = b"dummy edited 3d model content";

/// Reference returned for the edit that lands at `step_index`.
pub fn edit_model_ref(step_index: usize) -> String {
    format!("models/result_step_{step_index}.glb")
}

/// Stand-in for the real pipeline: sleeps, then hands back deterministic
/// references. Edits return the input images unchanged.
///
/// With an artifact root set, placeholder bytes are written under
/// `<root>/models/` so the returned references resolve to real files.
#[derive(Debug, Clone)]
pub struct StubGenerator {
    initial_delay: Duration,
    edit_delay: Duration,
    artifact_root: Option<PathBuf>,
}

impl StubGenerator {
    pub fn new(initial_delay: Duration, edit_delay: Duration) -> Self {
        Self {
            initial_delay,
            edit_delay,
            artifact_root: None,
        }
    }

    /// No delay and no files; for tests.
    pub fn instant() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    pub fn with_artifact_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.artifact_root = Some(root.into());
        self
    }

    async fn pause(delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    async fn write_placeholder(
        root: &Path,
        reference: &str,
        bytes: &[u8],
        overwrite: bool,
    ) -> PhotomeshResult<()> {
        let path = root.join(reference);
        if !overwrite && tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                PhotomeshError::ExternalService(format!(
                    "failed to prepare {}: {e}",
                    parent.display()
                ))
            })?;
        }
        tokio::fs::write(&path, bytes).await.map_err(|e| {
            PhotomeshError::ExternalService(format!("failed to write {}: {e}", path.display()))
        })
    }
}

impl Default for StubGenerator {
    fn default() -> Self {
        Self::new(Duration::from_secs(3), Duration::from_secs(5))
    }
}

#[async_trait]
impl ModelGenerator for StubGenerator {
    async fn generate_initial(&self, images: &[String]) -> PhotomeshResult<String> {
        info!(image_count = images.len(), "Stub initial generation started");
        Self::pause(self.initial_delay).await;

        if let Some(root) = &self.artifact_root {
            Self::write_placeholder(root, INITIAL_MODEL_REF, INITIAL_PLACEHOLDER, false).await?;
        }

        info!(model = INITIAL_MODEL_REF, "Stub initial generation finished");
        Ok(INITIAL_MODEL_REF.to_string())
    }

    async fn generate_edit(
        &self,
        images: &[String],
        prompt: &str,
        step_index: usize,
    ) -> PhotomeshResult<EditOutcome> {
        info!(step_index, prompt, image_count = images.len(), "Stub edit started");
        Self::pause(self.edit_delay).await;

        let model_reference = edit_model_ref(step_index);
        if let Some(root) = &self.artifact_root {
            Self::write_placeholder(root, &model_reference, EDIT_PLACEHOLDER, true).await?;
        }

        info!(step_index, model = %model_reference, "Stub edit finished");
        Ok(EditOutcome {
            model_reference,
            images: images.to_vec(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn images() -> Vec<String> {
        vec!["images/s1_a.jpg".into(), "images/s1_b.jpg".into()]
    }

    #[tokio::test]
    async fn initial_reference_is_fixed() {
        let stub = StubGenerator::instant();
        assert_eq!(stub.generate_initial(&images()).await.unwrap(), INITIAL_MODEL_REF);
    }

    #[tokio::test]
    async fn edit_echoes_images_and_indexes_model() {
        let stub = StubGenerator::instant();
        let out = stub.generate_edit(&images(), "add a red hat", 4).await.unwrap();
        assert_eq!(out.model_reference, "models/result_step_4.glb");
        assert_eq!(out.images, images());
    }

    #[tokio::test]
    async fn placeholders_land_under_artifact_root() {
        let tmp = tempfile::tempdir().unwrap();
        let stub = StubGenerator::instant().with_artifact_root(tmp.path());

        stub.generate_initial(&images()).await.unwrap();
        stub.generate_edit(&images(), "x", 1).await.unwrap();

        let initial = std::fs::read(tmp.path().join(INITIAL_MODEL_REF)).unwrap();
        assert_eq!(initial, INITIAL_PLACEHOLDER);
        let edited = std::fs::read(tmp.path().join("models/result_step_1.glb")).unwrap();
        assert_eq!(edited, EDIT_PLACEHOLDER);
    }

    #[tokio::test]
    async fn existing_initial_artifact_is_kept() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("models")).unwrap();
        std::fs::write(tmp.path().join(INITIAL_MODEL_REF), b"real model").unwrap();

        let stub = StubGenerator::instant().with_artifact_root(tmp.path());
        stub.generate_initial(&images()).await.unwrap();

        let kept = std::fs::read(tmp.path().join(INITIAL_MODEL_REF)).unwrap();
        assert_eq!(kept, b"real model");
    }
}
