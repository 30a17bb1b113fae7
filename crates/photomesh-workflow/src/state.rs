use photomesh_session::SessionView;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a session stands, computed from its images and history.
///
/// There is no terminal state: edits can always be applied once generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    /// No images uploaded.
    Empty,
    /// At least one image, no history yet.
    Collecting,
    /// At least one step recorded.
    Generated,
}

impl WorkflowState {
    pub fn of(view: &SessionView) -> Self {
        if !view.history.is_empty() {
            Self::Generated
        } else if !view.images.is_empty() {
            Self::Collecting
        } else {
            Self::Empty
        }
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Empty => "empty",
            Self::Collecting => "collecting",
            Self::Generated => "generated",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use photomesh_core::{SessionId, Step};

    #[test]
    fn derived_from_view() {
        let mut view = SessionView::empty(SessionId::parse("s").unwrap());
        assert_eq!(WorkflowState::of(&view), WorkflowState::Empty);

        view.images.push("images/s_a.jpg".into());
        assert_eq!(WorkflowState::of(&view), WorkflowState::Collecting);

        view.history.push(Step::initial(0, "m.glb", view.images.clone()));
        assert_eq!(WorkflowState::of(&view), WorkflowState::Generated);
        assert_eq!(WorkflowState::Generated.to_string(), "generated");
    }
}
