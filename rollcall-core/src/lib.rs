pub mod batch;
pub mod classify;
pub mod config;
pub mod dates;
pub mod delimited;
pub mod error;
pub mod expand;
pub mod input;
pub mod orchestrator;
pub mod pacing;
pub mod resolver;
pub mod store;
pub mod tables;

pub use rollcall_driver::{FormDriver, QueryRecord};
