use crate::session::{Session, SessionView};
use async_trait::async_trait;
use photomesh_core::{PhotomeshError, PhotomeshResult, SessionId, Step};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Process-lifetime mapping from session id to session state.
///
/// Sequences are only ever appended to; nothing is edited in place or removed.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Return the session, creating an empty one on first use.
    async fn ensure_session(&self, id: &SessionId) -> SessionView;

    /// Return the session, or an empty view if it was never created.
    /// Never creates a session.
    async fn get_session(&self, id: &SessionId) -> SessionView;

    /// Whether the session has been created.
    async fn contains(&self, id: &SessionId) -> bool;

    /// Append an image reference (creating the session if needed) and return
    /// the new image count.
    async fn append_image(&self, id: &SessionId, image: String) -> usize;

    /// Append a step to an existing session's history.
    ///
    /// `step.step_index` must equal the current history length.
    async fn append_step(&self, id: &SessionId, step: Step) -> PhotomeshResult<Step>;

    /// Number of sessions tracked.
    async fn session_count(&self) -> usize;
}

/// `HashMap` behind a `tokio` read-write lock. Good enough for a single
/// process; nothing survives a restart.
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn ensure_session(&self, id: &SessionId) -> SessionView {
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(id.clone())
            .or_insert_with(|| {
                debug!(session_id = %id, "Session created");
                Session::new(id.clone())
            })
            .view()
    }

    async fn get_session(&self, id: &SessionId) -> SessionView {
        let sessions = self.sessions.read().await;
        sessions
            .get(id)
            .map_or_else(|| SessionView::empty(id.clone()), Session::view)
    }

    async fn contains(&self, id: &SessionId) -> bool {
        self.sessions.read().await.contains_key(id)
    }

    async fn append_image(&self, id: &SessionId, image: String) -> usize {
        let mut sessions = self.sessions.write().await;
        let session = sessions.entry(id.clone()).or_insert_with(|| {
            debug!(session_id = %id, "Session created");
            Session::new(id.clone())
        });
        session.add_image(image)
    }

    async fn append_step(&self, id: &SessionId, step: Step) -> PhotomeshResult<Step> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| PhotomeshError::NotFound(format!("session '{id}' not found")))?;

        let expected = session.history.len();
        if step.step_index != expected {
            return Err(PhotomeshError::InvalidRequest(format!(
                "step index {} does not follow history of length {expected}",
                step.step_index
            )));
        }

        session.add_step(step.clone());
        Ok(step)
    }

    async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sid(raw: &str) -> SessionId {
        SessionId::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn get_session_does_not_create() {
        let store = InMemorySessionStore::new();
        let view = store.get_session(&sid("ghost")).await;

        assert!(view.is_empty());
        assert!(!store.contains(&sid("ghost")).await);
        assert_eq!(store.session_count().await, 0);
    }

    #[tokio::test]
    async fn ensure_session_is_idempotent() {
        let store = InMemorySessionStore::new();
        let id = sid("s1");

        store.ensure_session(&id).await;
        store.append_image(&id, "images/s1_a.jpg".into()).await;
        let view = store.ensure_session(&id).await;

        assert_eq!(view.images, vec!["images/s1_a.jpg".to_string()]);
        assert_eq!(store.session_count().await, 1);
    }

    #[tokio::test]
    async fn append_step_rejects_gaps() {
        let store = InMemorySessionStore::new();
        let id = sid("s1");
        store.ensure_session(&id).await;

        let err = store
            .append_step(&id, Step::initial(1, "m.glb", vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, PhotomeshError::InvalidRequest(_)));
        assert!(store.get_session(&id).await.history.is_empty());
    }

    #[tokio::test]
    async fn append_step_requires_session() {
        let store = InMemorySessionStore::new();
        let err = store
            .append_step(&sid("nope"), Step::initial(0, "m.glb", vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, PhotomeshError::NotFound(_)));
        assert_eq!(store.session_count().await, 0);
    }
}
