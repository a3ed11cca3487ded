use serde::Serialize;

/// A rule a form failed. Reported alongside the totals, never raised.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Issue {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            label: None,
        }
    }

    pub fn for_label(code: &'static str, label: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            label: Some(label.into()),
        }
    }
}
