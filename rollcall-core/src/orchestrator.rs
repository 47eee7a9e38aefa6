// Retry orchestrator: drives the form driver record by record, recycling the
// session on a schedule and whenever the form starts serving placeholders.

use crate::classify::{Classification, JunkRules};
use crate::error::EngineError;
use crate::pacing::{Pacer, TokioPacer, jitter};
use crate::store::{IdentityKey, KeyPolicy, ResultStore, StoredResult};
use rollcall_driver::{FormDriver, PageDump, QueryRecord, Submission};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub const PAGE_DUMP_FILE: &str = "page_source.html";
pub const SCREENSHOT_FILE: &str = "error_screenshot.png";

/// Retry budget and pacing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Restart the session after this many submissions on it; 0 disables.
    pub recycle_every: usize,
    /// Extra attempts for a record after junk responses.
    pub max_junk_retries: u32,
    pub cooldown_min_secs: u64,
    pub cooldown_max_secs: u64,
    /// Pause after each record before the next one.
    pub settle_millis: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            recycle_every: 15,
            max_junk_retries: 2,
            cooldown_min_secs: 10,
            cooldown_max_secs: 15,
            settle_millis: 1000,
        }
    }
}

impl RetryPolicy {
    fn cooldown(&self) -> Duration {
        jitter(
            Duration::from_secs(self.cooldown_min_secs),
            Duration::from_secs(self.cooldown_max_secs),
        )
    }

    fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_millis)
    }
}

/// Result of a single submission attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultOutcome {
    Success(String),
    NotFound,
    Junk(String),
    DriverError(String),
}

/// How a record left the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// A usable result was already stored.
    Skipped,
    Saved,
    NotFound,
    /// Junk persisted after the retry budget ran out.
    JunkSaved,
    /// The answer could not be written for this record.
    StoreFailed,
    /// Stop was requested before the record finished.
    Interrupted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum RecordState {
    Pending,
    SessionRecycling,
    Searching,
    Success(String),
    NoResult,
    JunkRetry,
    JunkExhausted(String),
    Done(Disposition),
}

/// Counters for one batch.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub processed: usize,
    pub skipped: usize,
    pub saved: usize,
    pub not_found: usize,
    pub junk_retries: usize,
    pub junk_exhausted: usize,
    pub driver_errors: usize,
    pub store_errors: usize,
    pub recycles: usize,
    pub aborted: bool,
    pub interrupted: bool,
}

/// The one live session plus its bookkeeping. Only the run loop touches it.
struct SessionState<S> {
    handle: Option<S>,
    /// Submissions made on `handle`, retries included.
    requests_since_restart: usize,
    stale: bool,
    last_dump: Option<PageDump>,
}

impl<S> SessionState<S> {
    fn new() -> Self {
        Self {
            handle: None,
            requests_since_restart: 0,
            stale: false,
            last_dump: None,
        }
    }
}

/// Callback for reporting `(done, total)` after each record.
pub type RunProgressCallback = Arc<dyn Fn(usize, usize) + Send + Sync>;

pub struct Orchestrator<D: FormDriver, P: Pacer = TokioPacer> {
    driver: D,
    pacer: P,
    store: ResultStore,
    rules: JunkRules,
    keys: KeyPolicy,
    policy: RetryPolicy,
    artifact_dir: PathBuf,
    stop: Arc<AtomicBool>,
    progress_callback: Option<RunProgressCallback>,
    summary: RunSummary,
}

impl<D: FormDriver, P: Pacer> Orchestrator<D, P> {
    pub fn new(driver: D, pacer: P, store: ResultStore) -> Self {
        Self {
            driver,
            pacer,
            store,
            rules: JunkRules::default(),
            keys: KeyPolicy::default(),
            policy: RetryPolicy::default(),
            artifact_dir: PathBuf::from("."),
            stop: Arc::new(AtomicBool::new(false)),
            progress_callback: None,
            summary: RunSummary::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_rules(mut self, rules: JunkRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_key_policy(mut self, keys: KeyPolicy) -> Self {
        self.keys = keys;
        self
    }

    pub fn with_artifact_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifact_dir = dir.into();
        self
    }

    /// Shared flag checked between records and attempts; set it to stop early.
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = stop;
        self
    }

    pub fn with_progress_callback(mut self, callback: RunProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn pacer(&self) -> &P {
        &self.pacer
    }

    /// Counters of the most recent run, including an aborted one.
    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Process `records` in order. The active session is closed on every
    /// exit path.
    pub async fn run(&mut self, records: &[QueryRecord]) -> Result<RunSummary, EngineError> {
        self.summary = RunSummary {
            total: records.len(),
            ..RunSummary::default()
        };
        info!("Starting batch of {} record(s)", records.len());

        let mut session = SessionState::new();
        let outcome = self.run_records(records, &mut session).await;

        if let Some(handle) = session.handle.take() {
            self.driver.close(handle).await;
        }

        match outcome {
            Ok(()) => {
                info!(
                    "Batch finished: {} saved, {} skipped, {} not found, {} junk kept",
                    self.summary.saved,
                    self.summary.skipped,
                    self.summary.not_found,
                    self.summary.junk_exhausted
                );
                Ok(self.summary.clone())
            }
            Err(e) => {
                self.summary.aborted = true;
                error!(
                    "Batch aborted after {} of {} record(s): {}",
                    self.summary.processed, self.summary.total, e
                );
                Err(e)
            }
        }
    }

    async fn run_records(
        &mut self,
        records: &[QueryRecord],
        session: &mut SessionState<D::Session>,
    ) -> Result<(), EngineError> {
        if !records.is_empty() {
            self.store.ensure_root()?;
        }

        for (index, record) in records.iter().enumerate() {
            if self.stop_requested() {
                warn!("Stop requested, leaving {} record(s) unprocessed", records.len() - index);
                self.summary.interrupted = true;
                break;
            }

            info!("Processing record {} of {}: {}", index + 1, records.len(), record);
            let disposition = self.process_record(record, session).await?;
            if disposition == Disposition::Interrupted {
                self.summary.interrupted = true;
                break;
            }

            self.summary.processed += 1;
            if let Some(callback) = &self.progress_callback {
                callback(self.summary.processed, self.summary.total);
            }
        }
        Ok(())
    }

    async fn process_record(
        &mut self,
        record: &QueryRecord,
        session: &mut SessionState<D::Session>,
    ) -> Result<Disposition, EngineError> {
        let key = self.keys.key_for(record);
        let mut junk_retries = 0u32;
        let mut searched = false;
        let mut state = RecordState::Pending;

        let disposition = loop {
            state = match state {
                RecordState::Pending => match self.store.lookup(&key, &self.rules) {
                    StoredResult::Usable => {
                        info!("Skipping {}: result already stored", key);
                        RecordState::Done(Disposition::Skipped)
                    }
                    stored => {
                        if stored == StoredResult::Junk {
                            warn!("Junk result on file for {}, removing it", key);
                            if let Err(e) = self.store.remove(&key) {
                                warn!("Cannot remove junk result for {}: {}", key, e);
                            }
                        }
                        if self.session_due(session) {
                            RecordState::SessionRecycling
                        } else {
                            RecordState::Searching
                        }
                    }
                },
                RecordState::SessionRecycling => {
                    if self.stop_requested() {
                        RecordState::Done(Disposition::Interrupted)
                    } else {
                        self.recycle_session(session).await?;
                        RecordState::Searching
                    }
                }
                RecordState::Searching => {
                    if self.stop_requested() {
                        RecordState::Done(Disposition::Interrupted)
                    } else {
                        session.requests_since_restart += 1;
                        searched = true;
                        info!("Searching for {} (attempt {})", key, junk_retries + 1);
                        match self.search(session, record).await {
                            ResultOutcome::Success(text) => RecordState::Success(text),
                            ResultOutcome::NotFound => RecordState::NoResult,
                            ResultOutcome::DriverError(cause) => {
                                warn!("Driver error for {}: {}", key, cause);
                                self.summary.driver_errors += 1;
                                RecordState::NoResult
                            }
                            ResultOutcome::Junk(text) => {
                                warn!("Junk results detected for {}", key);
                                if junk_retries < self.policy.max_junk_retries {
                                    RecordState::JunkRetry
                                } else {
                                    RecordState::JunkExhausted(text)
                                }
                            }
                        }
                    }
                }
                RecordState::Success(text) => match self.store.write(&key, &text) {
                    Ok(path) => {
                        info!("Valid results saved to '{}'", path.display());
                        RecordState::Done(Disposition::Saved)
                    }
                    Err(e) => {
                        error!("Cannot save results for {}: {}", key, e);
                        RecordState::Done(Disposition::StoreFailed)
                    }
                },
                RecordState::NoResult => {
                    info!("No results obtained for {}", key);
                    RecordState::Done(Disposition::NotFound)
                }
                RecordState::JunkRetry => {
                    junk_retries += 1;
                    self.summary.junk_retries += 1;
                    warn!(
                        "Retrying {} after session restart ({}/{})",
                        key, junk_retries, self.policy.max_junk_retries
                    );
                    session.stale = true;
                    RecordState::SessionRecycling
                }
                RecordState::JunkExhausted(text) => match self.store.write(&key, &text) {
                    Ok(path) => {
                        warn!(
                            "Max retries reached for {}, junk results saved to '{}' for manual review",
                            key,
                            path.display()
                        );
                        RecordState::Done(Disposition::JunkSaved)
                    }
                    Err(e) => {
                        error!(
                            "Max retries reached for {}, junk results could not be saved: {}",
                            key, e
                        );
                        RecordState::Done(Disposition::StoreFailed)
                    }
                },
                RecordState::Done(disposition) => break disposition,
            };
        };

        match disposition {
            Disposition::Skipped => self.summary.skipped += 1,
            Disposition::Saved => self.summary.saved += 1,
            Disposition::NotFound => self.summary.not_found += 1,
            Disposition::JunkSaved => self.summary.junk_exhausted += 1,
            Disposition::StoreFailed => self.summary.store_errors += 1,
            Disposition::Interrupted => {}
        }

        if searched {
            self.release_page(session).await;
            self.pacer.pause(self.policy.settle()).await;
        }
        Ok(disposition)
    }

    fn session_due(&self, session: &SessionState<D::Session>) -> bool {
        session.handle.is_none()
            || session.stale
            || (self.policy.recycle_every > 0
                && session.requests_since_restart >= self.policy.recycle_every)
    }

    /// Close the current session (if any), cool down, and open a fresh one.
    async fn recycle_session(
        &mut self,
        session: &mut SessionState<D::Session>,
    ) -> Result<(), EngineError> {
        if let Some(mut old) = session.handle.take() {
            info!(
                "Restarting the session after {} request(s){}",
                session.requests_since_restart,
                if session.stale { " (stale)" } else { "" }
            );
            match self.driver.capture_page_dump(&mut old).await {
                Ok(dump) => session.last_dump = Some(dump),
                Err(e) => debug!("No page dump before restart: {}", e),
            }
            self.driver.close(old).await;
            self.summary.recycles += 1;

            let cooldown = self.policy.cooldown();
            info!("Cooling down for {:.1}s", cooldown.as_secs_f64());
            self.pacer.pause(cooldown).await;
        }

        match self.driver.open().await {
            Ok(handle) => {
                session.handle = Some(handle);
                session.requests_since_restart = 0;
                session.stale = false;
                Ok(())
            }
            Err(e) => {
                error!("Could not open a form session: {}", e);
                write_failure_artifacts(&self.artifact_dir, session.last_dump.as_ref());
                Err(EngineError::SessionAcquisition(e))
            }
        }
    }

    async fn search(
        &mut self,
        session: &mut SessionState<D::Session>,
        record: &QueryRecord,
    ) -> ResultOutcome {
        let Some(handle) = session.handle.as_mut() else {
            return ResultOutcome::DriverError("no active session".to_string());
        };

        match self.driver.submit(handle, record).await {
            Ok(Submission::NotFound) => ResultOutcome::NotFound,
            Ok(Submission::Text(text)) => match self.rules.classify_text(Some(&text)) {
                Classification::Success => ResultOutcome::Success(text),
                Classification::NotFound => ResultOutcome::NotFound,
                Classification::Junk => ResultOutcome::Junk(text),
            },
            Err(e) => ResultOutcome::DriverError(e.to_string()),
        }
    }

    /// Reset the page for the next record. A failed refresh only marks the
    /// session for replacement.
    async fn release_page(&mut self, session: &mut SessionState<D::Session>) {
        if let Some(handle) = session.handle.as_mut()
            && let Err(e) = self.driver.refresh(handle).await
        {
            warn!("Page refresh failed, session will be restarted: {}", e);
            session.stale = true;
        }
    }
}

/// Best effort: the abort is already being reported, so failures here only log.
fn write_failure_artifacts(dir: &Path, dump: Option<&PageDump>) {
    let Some(dump) = dump else {
        warn!("No rendered page available for failure diagnostics");
        return;
    };
    if let Err(e) = fs::create_dir_all(dir) {
        warn!("Cannot create artifact directory {}: {}", dir.display(), e);
        return;
    }

    let page = dir.join(PAGE_DUMP_FILE);
    match fs::write(&page, &dump.html) {
        Ok(()) => error!("Page source saved to {}", page.display()),
        Err(e) => warn!("Cannot write {}: {}", page.display(), e),
    }
    if let Some(png) = &dump.screenshot {
        let shot = dir.join(SCREENSHOT_FILE);
        match fs::write(&shot, png) {
            Ok(()) => error!("Screenshot saved to {}", shot.display()),
            Err(e) => warn!("Cannot write {}: {}", shot.display(), e),
        }
    }
}
