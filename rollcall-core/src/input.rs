// Input record file parsing

use crate::dates::{MAX_OFFSET_COUNT, SeedDate};
use crate::delimited::{detect_delimiter, split_fields};
use crate::error::InputError;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Lines starting with these (any case) are header rows.
const HEADER_TOKENS: [&str; 2] = ["city", "county"];

/// One parsed line of the input file, before resolution and date expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawInputRecord {
    /// 1-based line number in the source file.
    pub line: usize,
    pub city: String,
    pub postal_code: String,
    pub first_name: String,
    pub last_name: String,
    pub seed: SeedDate,
    pub row_count: Option<usize>,
    pub day_increment: Option<i64>,
}

impl RawInputRecord {
    pub fn identity(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

fn is_header(line: &str) -> bool {
    let lowered = line.trim_start().to_lowercase();
    HEADER_TOKENS.iter().any(|token| {
        lowered
            .strip_prefix(token)
            .is_some_and(|rest| !rest.starts_with(|c: char| c.is_alphanumeric()))
    })
}

fn required(value: &str, line: usize, field: &'static str) -> Result<String, InputError> {
    let value = value.trim();
    if value.is_empty() {
        Err(InputError::EmptyField { line, field })
    } else {
        Ok(value.to_string())
    }
}

/// Parse one line. Blank lines, `#` comments and headers yield `Ok(None)`.
pub fn parse_input_line(line_no: usize, line: &str) -> Result<Option<RawInputRecord>, InputError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') || is_header(trimmed) {
        return Ok(None);
    }

    let fields = split_fields(trimmed, detect_delimiter(trimmed));
    if !(5..=7).contains(&fields.len()) {
        return Err(InputError::WrongFieldCount {
            line: line_no,
            found: fields.len(),
        });
    }

    let seed = fields[4]
        .trim()
        .parse::<SeedDate>()
        .map_err(|source| InputError::BadSeedDate { line: line_no, source })?;

    let row_count = match fields.get(5).map(|f| f.trim()) {
        Some(value) => match value.parse::<usize>() {
            Ok(count) if count <= MAX_OFFSET_COUNT => Some(count),
            _ => {
                return Err(InputError::BadNumber {
                    line: line_no,
                    field: "row count",
                    value: value.to_string(),
                });
            }
        },
        None => None,
    };

    let day_increment = match fields.get(6).map(|f| f.trim()) {
        Some(value) => Some(value.parse::<i64>().map_err(|_| InputError::BadNumber {
            line: line_no,
            field: "day increment",
            value: value.to_string(),
        })?),
        None => None,
    };

    Ok(Some(RawInputRecord {
        line: line_no,
        city: required(&fields[0], line_no, "city")?,
        postal_code: fields[1].trim().to_string(),
        first_name: required(&fields[2], line_no, "first name")?,
        last_name: required(&fields[3], line_no, "last name")?,
        seed,
        row_count,
        day_increment,
    }))
}

/// Parse every line, logging and dropping the malformed ones.
pub fn parse_input(text: &str) -> Vec<RawInputRecord> {
    let mut records = Vec::new();
    for (index, line) in text.lines().enumerate() {
        match parse_input_line(index + 1, line) {
            Ok(Some(record)) => records.push(record),
            Ok(None) => {}
            Err(e) => warn!("Skipping invalid input row: {} ({})", e, line.trim()),
        }
    }
    records
}

pub fn load_input_file(path: &Path) -> Result<Vec<RawInputRecord>, InputError> {
    let text = fs::read_to_string(path)?;
    let records = parse_input(&text);
    info!("Read {} input row(s) from {}", records.len(), path.display());
    Ok(records)
}
