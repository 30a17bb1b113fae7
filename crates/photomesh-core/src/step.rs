use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Origin of a history step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    /// Model synthesised from the session's uploaded images.
    Initial,
    /// Model regenerated from a natural-language edit.
    Edit,
}

/// One recorded outcome in a session's history.
///
/// Field names on the wire match what camera clients already consume:
/// `step`, `type` and `model_url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Position in history; equals the number of prior steps.
    #[serde(rename = "step")]
    pub step_index: usize,
    /// Whether this step is an initial generation or an edit.
    #[serde(rename = "type")]
    pub kind: StepKind,
    /// Reference to the produced model artifact.
    #[serde(rename = "model_url")]
    pub model_reference: String,
    /// Image references associated with this step.
    pub images: Vec<String>,
    /// Edit instruction; only present on edit steps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    /// When the step was recorded.
    pub created_at: DateTime<Utc>,
}

impl Step {
    /// Build an `initial` step from the images it was generated from.
    pub fn initial(
        step_index: usize,
        model_reference: impl Into<String>,
        images: Vec<String>,
    ) -> Self {
        Self {
            step_index,
            kind: StepKind::Initial,
            model_reference: model_reference.into(),
            images,
            prompt: None,
            created_at: Utc::now(),
        }
    }

    /// Build an `edit` step carrying the prompt that produced it.
    pub fn edit(
        step_index: usize,
        model_reference: impl Into<String>,
        images: Vec<String>,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            step_index,
            kind: StepKind::Edit,
            model_reference: model_reference.into(),
            images,
            prompt: Some(prompt.into()),
            created_at: Utc::now(),
        }
    }
}
