use crate::driver::FormDriver;
use crate::error::{DriverError, Result};
use crate::record::QueryRecord;
use crate::submission::{PageDump, Submission};
use std::collections::VecDeque;
use tracing::debug;

/// Canned outcome for one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptStep {
    Text(String),
    NotFound,
    Fail(String),
}

pub struct ScriptedSession {
    pub id: usize,
}

/// Replays canned outcomes instead of talking to a real form.
///
/// Submissions pop from the script and fall back to `fallback` once it runs
/// dry. Every call is counted so callers can assert on driver traffic.
pub struct ScriptedDriver {
    script: VecDeque<ScriptStep>,
    fallback: ScriptStep,
    max_opens: Option<usize>,
    pub opens: usize,
    pub closes: usize,
    pub refreshes: usize,
    pub submitted: Vec<QueryRecord>,
}

impl ScriptedDriver {
    pub fn new() -> Self {
        Self {
            script: VecDeque::new(),
            fallback: ScriptStep::NotFound,
            max_opens: None,
            opens: 0,
            closes: 0,
            refreshes: 0,
            submitted: Vec::new(),
        }
    }

    pub fn with_script(mut self, steps: impl IntoIterator<Item = ScriptStep>) -> Self {
        self.script = steps.into_iter().collect();
        self
    }

    pub fn with_fallback(mut self, step: ScriptStep) -> Self {
        self.fallback = step;
        self
    }

    /// Fail every `open` after the first `n` successful ones.
    pub fn with_max_opens(mut self, n: usize) -> Self {
        self.max_opens = Some(n);
        self
    }

    pub fn submissions(&self) -> usize {
        self.submitted.len()
    }

    /// Sessions opened but not yet closed.
    pub fn live_sessions(&self) -> usize {
        self.opens - self.closes
    }
}

impl Default for ScriptedDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl FormDriver for ScriptedDriver {
    type Session = ScriptedSession;

    async fn open(&mut self) -> Result<ScriptedSession> {
        if let Some(max) = self.max_opens
            && self.opens >= max
        {
            return Err(DriverError::Other("no more sessions available".to_string()));
        }
        self.opens += 1;
        debug!("Scripted session {} opened", self.opens);
        Ok(ScriptedSession { id: self.opens })
    }

    async fn submit(
        &mut self,
        session: &mut ScriptedSession,
        record: &QueryRecord,
    ) -> Result<Submission> {
        self.submitted.push(record.clone());
        let step = self.script.pop_front().unwrap_or_else(|| self.fallback.clone());
        debug!("Scripted session {} answers {:?}", session.id, step);
        match step {
            ScriptStep::Text(text) => Ok(Submission::Text(text)),
            ScriptStep::NotFound => Ok(Submission::NotFound),
            ScriptStep::Fail(reason) => Err(DriverError::MissingElement(reason)),
        }
    }

    async fn refresh(&mut self, _session: &mut ScriptedSession) -> Result<()> {
        self.refreshes += 1;
        Ok(())
    }

    async fn close(&mut self, session: ScriptedSession) {
        self.closes += 1;
        debug!("Scripted session {} closed", session.id);
    }

    async fn capture_page_dump(&mut self, session: &mut ScriptedSession) -> Result<PageDump> {
        Ok(PageDump {
            html: format!("<html><body>scripted session {}</body></html>", session.id),
            screenshot: Some(vec![0x89, b'P', b'N', b'G']),
        })
    }
}
