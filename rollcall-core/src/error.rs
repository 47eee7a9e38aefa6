use rollcall_driver::DriverError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateError {
    #[error("malformed date '{0}', expected M/D/YYYY")]
    Malformed(String),

    #[error("{month:02}/{day:02}/{year} is not a calendar date")]
    Invalid { month: u32, day: u32, year: i32 },
}

#[derive(Error, Debug)]
pub enum InputError {
    #[error("line {line}: expected 5 to 7 fields, found {found}")]
    WrongFieldCount { line: usize, found: usize },

    #[error("line {line}: empty {field}")]
    EmptyField { line: usize, field: &'static str },

    #[error("line {line}: {source}")]
    BadSeedDate {
        line: usize,
        #[source]
        source: DateError,
    },

    #[error("line {line}: {field} '{value}' is not a number")]
    BadNumber {
        line: usize,
        field: &'static str,
        value: String,
    },

    #[error("cannot read input file: {0}")]
    Io(#[from] io::Error),
}

#[derive(Error, Debug)]
pub enum TableError {
    #[error("{0}: no header row")]
    NoHeader(String),

    #[error("{0}: missing municipality/county columns")]
    MissingColumns(String),

    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("could not acquire a form session: {0}")]
    SessionAcquisition(#[source] DriverError),

    #[error("result store failure: {0}")]
    Store(#[from] io::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
