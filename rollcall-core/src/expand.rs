// Turns raw input rows into submittable query records

use crate::dates::{ExpansionMode, SeedDate, day_wrap_dates, is_valid_date, offset_dates};
use crate::input::RawInputRecord;
use crate::resolver::Resolver;
use rollcall_driver::QueryRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Date expansion settings for rows that do not carry their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpansionConfig {
    /// Used for rows without a row count.
    pub default_mode: ExpansionMode,
    /// Used for rows with a row count but no increment.
    pub day_increment: i64,
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self {
            default_mode: ExpansionMode::DayWrap,
            day_increment: 1,
        }
    }
}

pub struct Expander<'a> {
    resolver: Resolver<'a>,
    options: ExpansionConfig,
}

impl<'a> Expander<'a> {
    pub fn new(resolver: Resolver<'a>, options: ExpansionConfig) -> Self {
        Self { resolver, options }
    }

    fn candidate_dates(&self, row: &RawInputRecord) -> Vec<String> {
        let mode = match row.row_count {
            Some(_) => ExpansionMode::Offset,
            // An offset default needs a count; without one only the seed is used
            None if self.options.default_mode == ExpansionMode::Offset => ExpansionMode::Single,
            None => self.options.default_mode,
        };

        let dates = match mode {
            ExpansionMode::Offset => offset_dates(
                row.seed,
                row.row_count.unwrap_or(1),
                row.day_increment.unwrap_or(self.options.day_increment),
            ),
            ExpansionMode::DayWrap => day_wrap_dates(row.seed),
            ExpansionMode::Single => vec![row.seed.to_string()],
        };

        // A zero increment repeats the seed; keep first occurrences only
        let mut seen = HashSet::new();
        dates.into_iter().filter(|d| seen.insert(d.clone())).collect()
    }

    /// One query record per candidate date, all sharing the row's
    /// resolved jurisdiction.
    pub fn expand(&self, row: &RawInputRecord) -> Vec<QueryRecord> {
        let postal = Some(row.postal_code.as_str()).filter(|code| !code.is_empty());
        let jurisdiction = self.resolver.jurisdiction_for(&row.city, postal);

        let records: Vec<QueryRecord> = self
            .candidate_dates(row)
            .into_iter()
            .map(|date_of_birth| QueryRecord {
                jurisdiction: jurisdiction.clone(),
                postal_code: row.postal_code.clone(),
                first_name: row.first_name.clone(),
                last_name: row.last_name.clone(),
                date_of_birth,
            })
            .filter(|record| {
                let ok = is_submittable(record);
                if !ok {
                    warn!("Line {}: dropping unsubmittable record {}", row.line, record);
                }
                ok
            })
            .collect();

        debug!(
            "Line {}: {} expanded to {} record(s) in {}",
            row.line,
            row.identity(),
            records.len(),
            jurisdiction
        );
        records
    }

    pub fn expand_all(&self, rows: &[RawInputRecord]) -> Vec<QueryRecord> {
        rows.iter().flat_map(|row| self.expand(row)).collect()
    }
}

/// Non-empty jurisdiction and a real `MM/DD/YYYY` date.
pub fn is_submittable(record: &QueryRecord) -> bool {
    if record.jurisdiction.trim().is_empty() {
        return false;
    }
    match record.date_of_birth.parse::<SeedDate>() {
        Ok(date) => {
            record.date_of_birth.len() == 10 && is_valid_date(date.month(), date.day(), date.year())
        }
        Err(_) => false,
    }
}
