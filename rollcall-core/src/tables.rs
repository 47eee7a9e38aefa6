// Reference tables: municipality -> jurisdictions, postal code -> jurisdiction/city

use crate::delimited::split_fields;
use crate::error::TableError;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Suffixes dropped to register the colloquial form of a municipality name.
/// Only the first one found is applied.
const COLLOQUIAL_SUFFIXES: [&str; 3] = [" borough", " township", " city"];

const REFERENCE_EXTENSIONS: [&str; 3] = ["csv", "tsv", "txt"];

/// Lines of the postal listing we care about start with this.
pub const POSTAL_LINE_PREFIX: &str = "ZIP Code";

/// Municipality name to jurisdiction set, built once and read-only afterwards.
///
/// Keys are lowercased and trimmed. Jurisdictions are uppercased and keep the
/// order in which they were first seen, without duplicates.
#[derive(Debug, Clone, Default)]
pub struct JurisdictionTable {
    entries: HashMap<String, Vec<String>>,
}

impl JurisdictionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, municipality: &str, jurisdiction: &str) {
        let key = municipality.trim().to_lowercase();
        let jurisdiction = jurisdiction.trim().to_uppercase();
        if key.is_empty() || jurisdiction.is_empty() {
            return;
        }

        let colloquial = COLLOQUIAL_SUFFIXES
            .iter()
            .find_map(|suffix| key.strip_suffix(suffix))
            .map(|stripped| stripped.trim().to_string())
            .filter(|stripped| !stripped.is_empty());

        self.push(key, &jurisdiction);
        if let Some(stripped) = colloquial {
            self.push(stripped, &jurisdiction);
        }
    }

    fn push(&mut self, key: String, jurisdiction: &str) {
        let slot = self.entries.entry(key).or_default();
        if !slot.iter().any(|j| j == jurisdiction) {
            slot.push(jurisdiction.to_string());
        }
    }

    /// All jurisdictions for an already-normalized key.
    pub fn candidates(&self, key: &str) -> Option<&[String]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// The jurisdiction for `key`, if exactly one is known.
    pub fn unique(&self, key: &str) -> Option<&str> {
        match self.candidates(key) {
            Some([only]) => Some(only.as_str()),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Load every reference file in `dir`, in file-name order.
    ///
    /// Only an unreadable directory is an error; bad files and rows are
    /// logged and skipped.
    pub fn load_dir(dir: &Path) -> Result<Self, TableError> {
        let read_dir = fs::read_dir(dir).map_err(|source| TableError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut files: Vec<PathBuf> = read_dir
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && has_reference_extension(path))
            .collect();
        files.sort();

        let mut table = Self::new();
        for path in &files {
            match table.load_file(path) {
                Ok(rows) => debug!("Loaded {} rows from {}", rows, path.display()),
                Err(e) => warn!("Skipping reference file: {}", e),
            }
        }

        info!(
            "Jurisdiction table ready: {} names from {} file(s)",
            table.len(),
            files.len()
        );
        Ok(table)
    }

    pub fn load_file(&mut self, path: &Path) -> Result<usize, TableError> {
        let text = fs::read_to_string(path).map_err(|source| TableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path.display().to_string();
        self.load_reference(&text, &name)
    }

    /// Parse one delimited table with `municipality` and `county` columns.
    /// Returns the number of rows stored.
    pub fn load_reference(&mut self, text: &str, source: &str) -> Result<usize, TableError> {
        let mut lines = text
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty());

        let (_, header) = lines
            .next()
            .ok_or_else(|| TableError::NoHeader(source.to_string()))?;
        let header = header.trim_start_matches('\u{feff}');

        let (sep, municipality_col, county_col) = ['\t', ',']
            .into_iter()
            .find_map(|sep| {
                let columns = split_fields(header, sep);
                let find = |name: &str| {
                    columns
                        .iter()
                        .position(|c| c.trim().eq_ignore_ascii_case(name))
                };
                Some((sep, find("municipality")?, find("county")?))
            })
            .ok_or_else(|| TableError::MissingColumns(source.to_string()))?;

        let mut stored = 0;
        for (index, line) in lines {
            let fields = split_fields(line, sep);
            match (fields.get(municipality_col), fields.get(county_col)) {
                (Some(municipality), Some(county))
                    if !municipality.trim().is_empty() && !county.trim().is_empty() =>
                {
                    self.insert(municipality, county);
                    stored += 1;
                }
                _ => warn!("Skipping row {} in {}: missing municipality or county", index + 1, source),
            }
        }
        Ok(stored)
    }
}

fn has_reference_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| REFERENCE_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

/// Postal code to jurisdiction and to lowercase city name.
#[derive(Debug, Clone, Default)]
pub struct PostalIndex {
    jurisdictions: HashMap<String, String>,
    cities: HashMap<String, String>,
}

impl PostalIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty `jurisdiction` records only the city for the code.
    pub fn insert(&mut self, code: &str, city: &str, jurisdiction: &str) {
        let code = code.trim();
        if code.is_empty() {
            return;
        }
        self.cities.insert(code.to_string(), city.trim().to_lowercase());
        let jurisdiction = jurisdiction.trim();
        if !jurisdiction.is_empty() {
            self.jurisdictions
                .insert(code.to_string(), jurisdiction.to_uppercase());
        }
    }

    pub fn jurisdiction(&self, code: &str) -> Option<&str> {
        self.jurisdictions.get(code).map(String::as_str)
    }

    pub fn city(&self, code: &str) -> Option<&str> {
        self.cities.get(code).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }

    /// Parse the flat listing: `ZIP Code <code>\t<city>[\t<jurisdiction>]`.
    /// Every other line is ignored.
    pub fn parse(text: &str) -> Self {
        let mut index = Self::new();
        for line in text.lines() {
            let Some(rest) = line.trim().strip_prefix(POSTAL_LINE_PREFIX) else {
                continue;
            };
            let parts: Vec<&str> = rest.split('\t').collect();
            if parts.len() < 2 {
                debug!("Ignoring short postal line: {}", line.trim());
                continue;
            }
            index.insert(parts[0], parts[1], parts.get(2).copied().unwrap_or_default());
        }
        index
    }

    pub fn load_file(path: &Path) -> Result<Self, TableError> {
        let text = fs::read_to_string(path).map_err(|source| TableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let index = Self::parse(&text);
        info!("Postal index ready: {} codes from {}", index.len(), path.display());
        Ok(index)
    }
}
