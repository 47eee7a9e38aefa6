// Wall-clock pacing between form interactions

use rand::Rng;
use std::time::Duration;

/// Supplies every wait the engine makes, so tests can skip real sleeps.
#[allow(async_fn_in_trait)]
pub trait Pacer {
    async fn pause(&mut self, duration: Duration);
}

/// Sleeps on the tokio clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioPacer;

impl Pacer for TokioPacer {
    async fn pause(&mut self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

/// Returns immediately and records what was asked for.
#[derive(Debug, Default, Clone)]
pub struct NoopPacer {
    pub pauses: Vec<Duration>,
}

impl NoopPacer {
    pub fn total(&self) -> Duration {
        self.pauses.iter().sum()
    }
}

impl Pacer for NoopPacer {
    async fn pause(&mut self, duration: Duration) {
        self.pauses.push(duration);
    }
}

/// Uniform random duration in `[min, max]`, millisecond resolution.
pub fn jitter(min: Duration, max: Duration) -> Duration {
    let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
    let lo_ms = lo.as_millis() as u64;
    let hi_ms = hi.as_millis() as u64;
    Duration::from_millis(rand::thread_rng().gen_range(lo_ms..=hi_ms))
}
