// Junk detection for form responses and stored result files

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

/// Byte size of the placeholder page the form serves instead of an answer.
pub const DEFAULT_JUNK_FILE_SIZE: u64 = 1417;

pub const DEFAULT_JUNK_PHRASES: [&str; 3] = [
    "FIND VOTER REGISTRATION STATUS",
    "Your search did not return any results",
    "Please correct the errors below and try again",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Classification {
    Success,
    NotFound,
    Junk,
}

/// What counts as a placeholder instead of a real answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JunkRules {
    /// Case-sensitive substrings; any hit marks the text as junk.
    pub phrases: Vec<String>,
    /// Stored files of exactly this size are junk without being read.
    pub junk_file_size: Option<u64>,
}

impl Default for JunkRules {
    fn default() -> Self {
        Self {
            phrases: DEFAULT_JUNK_PHRASES.iter().map(|p| p.to_string()).collect(),
            junk_file_size: Some(DEFAULT_JUNK_FILE_SIZE),
        }
    }
}

impl JunkRules {
    pub fn classify_text(&self, text: Option<&str>) -> Classification {
        match text {
            None => Classification::NotFound,
            Some(text) if text.trim().is_empty() => Classification::NotFound,
            Some(text) if self.phrases.iter().any(|p| text.contains(p.as_str())) => {
                Classification::Junk
            }
            Some(_) => Classification::Success,
        }
    }

    /// Size-only verdict: `Some(Junk)` on the placeholder size, otherwise the
    /// content has to be inspected.
    pub fn classify_size(&self, size: u64) -> Option<Classification> {
        match self.junk_file_size {
            Some(junk) if junk == size => Some(Classification::Junk),
            _ => None,
        }
    }

    /// Classify a stored file, checking its size before reading it.
    pub fn classify_file(&self, path: &Path) -> io::Result<Classification> {
        let size = fs::metadata(path)?.len();
        if let Some(verdict) = self.classify_size(size) {
            return Ok(verdict);
        }
        let content = fs::read_to_string(path)?;
        Ok(self.classify_text(Some(&content)))
    }
}
