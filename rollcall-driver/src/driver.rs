use crate::error::Result;
use crate::record::QueryRecord;
use crate::submission::{PageDump, Submission};

/// Capability interface over whatever renders and submits the lookup form.
///
/// A `Session` is one browser-equivalent context: cookies, hidden form state
/// and the last rendered page. The engine owns at most one at a time and
/// always hands it back through [`FormDriver::close`].
#[allow(async_fn_in_trait)]
pub trait FormDriver {
    type Session;

    /// Start a fresh session with the form loaded and ready for input.
    async fn open(&mut self) -> Result<Self::Session>;

    /// Fill in and submit the form for `record`.
    async fn submit(&mut self, session: &mut Self::Session, record: &QueryRecord)
        -> Result<Submission>;

    /// Reload the form page, discarding any previous result.
    async fn refresh(&mut self, session: &mut Self::Session) -> Result<()>;

    async fn close(&mut self, session: Self::Session);

    async fn capture_page_dump(&mut self, session: &mut Self::Session) -> Result<PageDump>;
}
