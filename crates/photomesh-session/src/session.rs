use chrono::{DateTime, Utc};
use photomesh_core::{SessionId, Step};
use serde::{Deserialize, Serialize};

/// Workflow state owned by the store for a single session.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    /// Image references in upload order.
    pub images: Vec<String>,
    /// Append-only generation history.
    pub history: Vec<Step>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(id: SessionId) -> Self {
        let now = Utc::now();
        Self {
            id,
            images: Vec::new(),
            history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn add_image(&mut self, image: String) -> usize {
        self.updated_at = Utc::now();
        self.images.push(image);
        self.images.len()
    }

    pub fn add_step(&mut self, step: Step) {
        self.updated_at = Utc::now();
        self.history.push(step);
    }

    /// Snapshot handed out to callers.
    pub fn view(&self) -> SessionView {
        SessionView {
            session_id: self.id.clone(),
            images: self.images.clone(),
            history: self.history.clone(),
        }
    }
}

/// Copy of a session's images and history.
///
/// Unknown sessions are represented by [`SessionView::empty`] rather than an
/// error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionView {
    pub session_id: SessionId,
    pub images: Vec<String>,
    pub history: Vec<Step>,
}

impl SessionView {
    pub fn empty(session_id: SessionId) -> Self {
        Self {
            session_id,
            images: Vec::new(),
            history: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty() && self.history.is_empty()
    }

    /// Index the next appended step will receive.
    pub fn next_step_index(&self) -> usize {
        self.history.len()
    }

    pub fn latest_step(&self) -> Option<&Step> {
        self.history.last()
    }
}
