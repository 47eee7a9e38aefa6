use serde::{Deserialize, Serialize};

/// What the form returned for one submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Submission {
    /// Text of the result panel, possibly empty or a placeholder page.
    Text(String),
    /// The form explicitly reported that nothing matched.
    NotFound,
}

impl Submission {
    pub fn text(&self) -> Option<&str> {
        match self {
            Submission::Text(text) => Some(text),
            Submission::NotFound => None,
        }
    }
}

/// Last rendered page, captured for offline debugging.
#[derive(Debug, Clone, Default)]
pub struct PageDump {
    pub html: String,
    /// PNG bytes, for drivers that render.
    pub screenshot: Option<Vec<u8>>,
}
