// Flat-file result store keyed by record identity

use crate::classify::{Classification, JunkRules};
use rollcall_driver::QueryRecord;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const FILE_PREFIX: &str = "results_";
const FILE_SUFFIX: &str = ".txt";

/// Longest key kept verbatim; file names stay well under the usual 255-byte
/// limit once the prefix and suffix are added.
pub const MAX_KEY_BYTES: usize = 200;

/// Hex digits of the digest appended to a shortened key.
const DIGEST_CHARS: usize = 16;

/// How a record maps to its result file.
///
/// `FirstLast` matches files written by earlier runs, but two different
/// people with the same name share one file. `Full` adds postal code and date
/// of birth to the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyPolicy {
    #[default]
    FirstLast,
    Full,
}

impl KeyPolicy {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "first-last" | "name" => Some(KeyPolicy::FirstLast),
            "full" | "record" => Some(KeyPolicy::Full),
            _ => None,
        }
    }

    pub fn key_for(&self, record: &QueryRecord) -> IdentityKey {
        let parts: Vec<&str> = match self {
            KeyPolicy::FirstLast => vec![record.first_name.as_str(), record.last_name.as_str()],
            KeyPolicy::Full => vec![
                record.first_name.as_str(),
                record.last_name.as_str(),
                record.postal_code.as_str(),
                record.date_of_birth.as_str(),
            ],
        };
        let key = parts
            .iter()
            .map(|part| sanitize(part.trim()))
            .collect::<Vec<_>>()
            .join("_");
        IdentityKey(bound_length(key))
    }
}

/// File-name-safe identity of a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey(String);

impl IdentityKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '-',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// Over-long keys keep a prefix cut on a char boundary plus a digest of the
/// full key, so distinct identities stay distinct.
fn bound_length(key: String) -> String {
    if key.len() <= MAX_KEY_BYTES {
        return key;
    }
    let digest = blake3::hash(key.as_bytes()).to_hex();
    let mut cut = MAX_KEY_BYTES - DIGEST_CHARS - 1;
    while !key.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}_{}", &key[..cut], &digest.as_str()[..DIGEST_CHARS])
}

/// What the store holds for a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoredResult {
    Missing,
    Usable,
    Junk,
}

/// One text file per identity under `root`.
#[derive(Debug, Clone)]
pub struct ResultStore {
    root: PathBuf,
}

impl ResultStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: &IdentityKey) -> PathBuf {
        self.root.join(format!("{}{}{}", FILE_PREFIX, key, FILE_SUFFIX))
    }

    pub fn exists(&self, key: &IdentityKey) -> bool {
        self.path_for(key).is_file()
    }

    /// Create the store directory if it does not exist yet.
    pub fn ensure_root(&self) -> io::Result<()> {
        fs::create_dir_all(&self.root)
    }

    /// Overwrites any previous result for `key`.
    pub fn write(&self, key: &IdentityKey, text: &str) -> io::Result<PathBuf> {
        self.ensure_root()?;
        let path = self.path_for(key);
        fs::write(&path, text)?;
        debug!("Wrote {} bytes to {}", text.len(), path.display());
        Ok(path)
    }

    pub fn size_of(&self, key: &IdentityKey) -> Option<u64> {
        fs::metadata(self.path_for(key)).ok().map(|m| m.len())
    }

    pub fn read(&self, key: &IdentityKey) -> io::Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Returns whether a file was actually removed.
    pub fn remove(&self, key: &IdentityKey) -> io::Result<bool> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Anything short of a real answer (junk, empty, unreadable) is `Junk`.
    pub fn lookup(&self, key: &IdentityKey, rules: &JunkRules) -> StoredResult {
        let path = self.path_for(key);
        if !path.is_file() {
            return StoredResult::Missing;
        }
        match rules.classify_file(&path) {
            Ok(Classification::Success) => StoredResult::Usable,
            Ok(_) => StoredResult::Junk,
            Err(e) => {
                warn!("Cannot inspect {}: {}", path.display(), e);
                StoredResult::Junk
            }
        }
    }

    /// Every result file in the store, sorted by name.
    pub fn entries(&self) -> io::Result<Vec<PathBuf>> {
        let read_dir = match fs::read_dir(&self.root) {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut entries = Vec::new();
        for entry in read_dir {
            let path = entry?.path();
            let is_result = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(FILE_PREFIX) && n.ends_with(FILE_SUFFIX));
            if is_result && path.is_file() {
                entries.push(path);
            }
        }
        entries.sort();
        Ok(entries)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
    pub scanned: usize,
    pub junk: Vec<PathBuf>,
    pub removed: usize,
}

/// Find stored results that are not real answers, deleting them if `purge`.
pub fn sweep(store: &ResultStore, rules: &JunkRules, purge: bool) -> io::Result<SweepReport> {
    let mut report = SweepReport::default();

    for path in store.entries()? {
        report.scanned += 1;
        let verdict = match rules.classify_file(&path) {
            Ok(verdict) => verdict,
            Err(e) => {
                warn!("Cannot inspect {}: {}", path.display(), e);
                continue;
            }
        };
        if verdict == Classification::Success {
            continue;
        }

        warn!("Junk result file: {}", path.display());
        if purge {
            fs::remove_file(&path)?;
            report.removed += 1;
        }
        report.junk.push(path);
    }
    Ok(report)
}
