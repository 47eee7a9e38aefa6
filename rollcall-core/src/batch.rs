use crate::classify::JunkRules;
use crate::error::EngineError;
use crate::orchestrator::{Orchestrator, RetryPolicy, RunProgressCallback, RunSummary};
use crate::pacing::TokioPacer;
use crate::store::{KeyPolicy, ResultStore};
use indicatif::{ProgressBar, ProgressStyle};
use rollcall_driver::{FormDriver, QueryRecord};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

/// Options for configuring a batch run
pub struct BatchOptions {
    pub records: Vec<QueryRecord>,
    pub results_dir: PathBuf,
    pub artifact_dir: PathBuf,
    pub policy: RetryPolicy,
    pub rules: JunkRules,
    pub key_policy: KeyPolicy,
    pub show_progress_bars: bool,
    pub stop: Arc<AtomicBool>,
}

/// Outcome of a batch. The summary is filled in even when the run aborted.
pub struct BatchReport {
    pub summary: RunSummary,
    pub result: Result<(), EngineError>,
}

/// Execute a batch with the given options against `driver`
pub async fn execute_batch<D: FormDriver>(driver: D, options: BatchOptions) -> BatchReport {
    let BatchOptions {
        records,
        results_dir,
        artifact_dir,
        policy,
        rules,
        key_policy,
        show_progress_bars,
        stop,
    } = options;

    let progress_bar = if show_progress_bars {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(format!("Starting batch of {} records...", records.len()));
        Some(Arc::new(pb))
    } else {
        None
    };

    let mut orchestrator = Orchestrator::new(driver, TokioPacer, ResultStore::new(results_dir))
        .with_policy(policy)
        .with_rules(rules)
        .with_key_policy(key_policy)
        .with_artifact_dir(artifact_dir)
        .with_stop_flag(stop);

    if let Some(ref pb) = progress_bar {
        let pb_clone = pb.clone();
        let callback: RunProgressCallback = Arc::new(move |done: usize, total: usize| {
            pb_clone.set_message(format!("Searching... {}/{} records processed", done, total));
            pb_clone.tick();
        });
        orchestrator = orchestrator.with_progress_callback(callback);
    }

    let result = orchestrator.run(&records).await.map(|_| ());
    let summary = orchestrator.summary().clone();

    if let Some(ref pb) = progress_bar {
        pb.finish_with_message(format!(
            "Batch complete! {}/{} records processed",
            summary.processed, summary.total
        ));
    }

    BatchReport { summary, result }
}

/// Generate a plain-text report from a run summary
pub fn generate_run_report(summary: &RunSummary) -> String {
    let mut report = String::new();
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
    report.push_str("# Summary:\n");
    report.push_str(&format!(
        "  Records processed: {}/{}\n",
        summary.processed, summary.total
    ));
    report.push_str(&format!("  Results saved: {}\n", summary.saved));
    report.push_str(&format!("  Already stored: {}\n", summary.skipped));
    report.push_str(&format!("  No results: {}\n", summary.not_found));
    report.push_str(&format!(
        "  Junk kept for review: {}\n",
        summary.junk_exhausted
    ));
    report.push_str(&format!("  Junk retries: {}\n", summary.junk_retries));
    report.push_str(&format!("  Driver errors: {}\n", summary.driver_errors));
    if summary.store_errors > 0 {
        report.push_str(&format!("  Results not saved: {}\n", summary.store_errors));
    }
    report.push_str(&format!("  Session restarts: {}\n", summary.recycles));

    if summary.aborted {
        report.push_str("\n  Run aborted; rerun to pick up the remaining records.\n");
    } else if summary.interrupted {
        report.push_str("\n  Run interrupted; rerun to pick up the remaining records.\n");
    }

    report.push_str("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_mentions_abort() {
        let summary = RunSummary {
            total: 4,
            processed: 1,
            saved: 1,
            aborted: true,
            ..RunSummary::default()
        };
        let report = generate_run_report(&summary);
        assert!(report.contains("Records processed: 1/4"));
        assert!(report.contains("Run aborted"));
    }

    #[test]
    fn test_report_clean_run() {
        let summary = RunSummary {
            total: 2,
            processed: 2,
            saved: 1,
            not_found: 1,
            ..RunSummary::default()
        };
        let report = generate_run_report(&summary);
        assert!(report.contains("No results: 1"));
        assert!(!report.contains("rerun"));
        assert!(!report.contains("not saved"));
    }

    #[test]
    fn test_report_lists_unsaved_results() {
        let summary = RunSummary {
            total: 2,
            processed: 2,
            store_errors: 1,
            ..RunSummary::default()
        };
        assert!(generate_run_report(&summary).contains("Results not saved: 1"));
    }
}
