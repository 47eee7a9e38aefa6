pub mod commands;
pub mod handlers;
pub mod logging;

// Re-export commonly used handler functions for convenience
pub use handlers::{apply_overrides, describe_resolution, expand_input, load_config, load_tables};

// Re-export batch functionality from rollcall-core
pub use rollcall_core::batch::{BatchOptions, BatchReport, execute_batch, generate_run_report};

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);
