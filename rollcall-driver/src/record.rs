use serde::{Deserialize, Serialize};
use std::fmt;

/// One fully specified lookup submitted to the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRecord {
    pub jurisdiction: String,
    pub postal_code: String,
    pub first_name: String,
    pub last_name: String,
    /// Always `MM/DD/YYYY`.
    pub date_of_birth: String,
}

impl fmt::Display for QueryRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({}, {}, {})",
            self.first_name, self.last_name, self.date_of_birth, self.postal_code, self.jurisdiction
        )
    }
}
