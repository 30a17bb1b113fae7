use photomesh_core::{PhotomeshError, PhotomeshResult, SessionId, Step};
use photomesh_generation::ModelGenerator;
use photomesh_session::{SessionStore, SessionView};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{info, warn};

/// Drives the upload → generate → edit workflow for every session.
///
/// Generation and edit calls for the same session are serialized so each
/// observes the history left by the previous one; calls for different
/// sessions run concurrently. Uploads and reads never wait on an in-flight
/// generation.
pub struct WorkflowController {
    store: Arc<dyn SessionStore>,
    generator: Arc<dyn ModelGenerator>,
    in_flight: Mutex<HashMap<SessionId, Arc<Mutex<()>>>>,
}

impl WorkflowController {
    pub fn new(store: Arc<dyn SessionStore>, generator: Arc<dyn ModelGenerator>) -> Self {
        Self {
            store,
            generator,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Record an uploaded image and return the session's image count.
    pub async fn upload_image(&self, id: &SessionId, image: impl Into<String>) -> usize {
        let image = image.into();
        let count = self.store.append_image(id, image.clone()).await;
        info!(session_id = %id, image = %image, image_count = count, "Image recorded");
        count
    }

    /// Generate a model from every image uploaded so far.
    ///
    /// Fails with `InvalidRequest` when the session has no images, including
    /// when it was never created.
    pub async fn generate_initial(&self, id: &SessionId) -> PhotomeshResult<Step> {
        if self.store.get_session(id).await.images.is_empty() {
            warn!(session_id = %id, "Initial generation requested without images");
            return Err(no_images(id));
        }

        let _guard = self.lock_session(id).await;
        let view = self.store.get_session(id).await;
        if view.images.is_empty() {
            return Err(no_images(id));
        }

        let step_index = view.next_step_index();
        info!(
            session_id = %id,
            step_index,
            image_count = view.images.len(),
            "Starting initial generation"
        );

        let model = self
            .generator
            .generate_initial(&view.images)
            .await
            .map_err(|e| external(id, "initial generation", e))?;

        let step = self
            .store
            .append_step(id, Step::initial(step_index, model, view.images))
            .await?;
        info!(
            session_id = %id,
            step_index,
            model = %step.model_reference,
            "Initial model recorded"
        );
        Ok(step)
    }

    /// Apply a prompt to the session's images and regenerate the model.
    ///
    /// Fails with `NotFound` when the session was never created; no session
    /// is created in that case.
    pub async fn edit_model(&self, id: &SessionId, prompt: &str) -> PhotomeshResult<Step> {
        if !self.store.contains(id).await {
            warn!(session_id = %id, "Edit requested for unknown session");
            return Err(PhotomeshError::NotFound(format!("session '{id}' not found")));
        }

        let _guard = self.lock_session(id).await;
        let view = self.store.get_session(id).await;
        let step_index = view.next_step_index();
        info!(session_id = %id, step_index, prompt, "Starting edit");

        let outcome = self
            .generator
            .generate_edit(&view.images, prompt, step_index)
            .await
            .map_err(|e| external(id, "edit", e))?;

        let step = self
            .store
            .append_step(
                id,
                Step::edit(step_index, outcome.model_reference, outcome.images, prompt),
            )
            .await?;
        info!(session_id = %id, step_index, model = %step.model_reference, "Edit recorded");
        Ok(step)
    }

    /// Images and history for the session; empty for unknown sessions.
    pub async fn get_history(&self, id: &SessionId) -> SessionView {
        self.store.get_session(id).await
    }

    async fn lock_session(&self, id: &SessionId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut in_flight = self.in_flight.lock().await;
            in_flight.entry(id.clone()).or_default().clone()
        };
        lock.lock_owned().await
    }
}

fn no_images(id: &SessionId) -> PhotomeshError {
    PhotomeshError::InvalidRequest(format!(
        "no images uploaded for session '{id}'; upload images first"
    ))
}

fn external(id: &SessionId, op: &str, err: PhotomeshError) -> PhotomeshError {
    warn!(session_id = %id, error = %err, "{op} failed");
    match err {
        PhotomeshError::ExternalService(_) => err,
        other => PhotomeshError::ExternalService(other.to_string()),
    }
}
