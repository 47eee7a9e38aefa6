pub mod driver;
pub mod error;
pub mod http;
pub mod record;
pub mod scripted;
pub mod submission;

pub use driver::FormDriver;
pub use error::DriverError;
pub use http::{FieldMap, FormSpec, HttpFormDriver};
pub use record::QueryRecord;
pub use scripted::{ScriptStep, ScriptedDriver};
pub use submission::{PageDump, Submission};
