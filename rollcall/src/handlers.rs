use anyhow::{Context, Result, bail};
use clap::ArgMatches;
use colored::Colorize;
use rollcall_core::QueryRecord;
use rollcall_core::batch::{BatchOptions, execute_batch, generate_run_report};
use rollcall_core::config::{DataConfig, RollcallConfig};
use rollcall_core::dates::ExpansionMode;
use rollcall_core::expand::Expander;
use rollcall_core::input::load_input_file;
use rollcall_core::resolver::{Resolution, ResolvedVia, Resolver};
use rollcall_core::store::{KeyPolicy, ResultStore, sweep};
use rollcall_core::tables::{JurisdictionTable, PostalIndex};
use rollcall_driver::{HttpFormDriver, ScriptedDriver};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

pub fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

pub fn print_banner() {
    print_divider();
    println!(
        "{}",
        format!("  ROLLCALL v{}", env!("CARGO_PKG_VERSION"))
            .bright_white()
            .bold()
    );
    print_divider();
    println!();
}

/// Config file (explicit `--config` or the default location) without any
/// subcommand overrides.
pub fn load_config(args: &ArgMatches) -> Result<RollcallConfig> {
    let path = args.get_one::<PathBuf>("config").map(|p| expand_path(p));
    RollcallConfig::load_or_default(path.as_deref()).context("Failed to load configuration")
}

fn expand_path(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).as_ref())
}

/// Fold the flags shared by `run`, `expand` and `sweep` into `config`.
pub fn apply_overrides(config: &mut RollcallConfig, args: &ArgMatches) {
    if let Ok(Some(dir)) = args.try_get_one::<PathBuf>("results-dir") {
        config.store.results_dir = expand_path(dir);
    }
    if let Ok(Some(key)) = args.try_get_one::<String>("key")
        && let Some(policy) = KeyPolicy::from_str(key)
    {
        config.store.key = policy;
    }
    if let Ok(Some(mode)) = args.try_get_one::<String>("mode")
        && let Some(mode) = ExpansionMode::from_str(mode)
    {
        config.expansion.default_mode = mode;
    }
    if let Ok(Some(count)) = args.try_get_one::<usize>("recycle-every") {
        config.retry.recycle_every = *count;
    }
    if let Ok(Some(retries)) = args.try_get_one::<u32>("max-retries") {
        config.retry.max_junk_retries = *retries;
    }
}

/// Reference tables are optional: missing data only degrades resolution to
/// the literal municipality name.
pub fn load_tables(data: &DataConfig) -> (JurisdictionTable, PostalIndex) {
    let table = JurisdictionTable::load_dir(&expand_path(&data.reference_dir)).unwrap_or_else(|e| {
        warn!("No jurisdiction table loaded: {}", e);
        JurisdictionTable::new()
    });
    let postal = PostalIndex::load_file(&expand_path(&data.postal_file)).unwrap_or_else(|e| {
        warn!("No postal index loaded: {}", e);
        PostalIndex::new()
    });
    (table, postal)
}

/// Read, resolve and expand an input file into submittable records.
pub fn expand_input(
    input: &Path,
    config: &RollcallConfig,
    table: &JurisdictionTable,
    postal: &PostalIndex,
) -> Result<Vec<QueryRecord>> {
    let rows = load_input_file(input)
        .with_context(|| format!("Failed to read input file {}", input.display()))?;
    let expander = Expander::new(Resolver::new(table, postal), config.expansion);
    let records = expander.expand_all(&rows);
    info!(
        "{} input row(s) expanded to {} record(s)",
        rows.len(),
        records.len()
    );
    Ok(records)
}

pub fn describe_resolution(resolution: &Resolution) -> String {
    match &resolution.via {
        ResolvedVia::PostalCode => "postal code".to_string(),
        ResolvedVia::PostalCity => "postal code city".to_string(),
        ResolvedVia::Municipality => "municipality".to_string(),
        ResolvedVia::PostalDisambiguated => "municipality, settled by postal code".to_string(),
        ResolvedVia::Variation(name) => format!("name variation '{}'", name),
        ResolvedVia::Ambiguous(candidates) => {
            format!("ambiguous, first of {}", candidates.join(", "))
        }
        ResolvedVia::Unresolved => "no match, input used as-is".to_string(),
    }
}

pub async fn handle_run(args: &ArgMatches, mut config: RollcallConfig) -> Result<()> {
    apply_overrides(&mut config, args);
    let quiet = args.get_flag("quiet");
    let dry_run = args.get_flag("dry-run");
    let input = args
        .get_one::<PathBuf>("input")
        .context("--input is required")?;

    let (table, postal) = load_tables(&config.data);
    let records = expand_input(&expand_path(input), &config, &table, &postal)?;
    if records.is_empty() {
        println!("{} No records to submit", "⚠".yellow().bold());
        return Ok(());
    }

    if !quiet {
        println!("{} Records: {}", "→".blue(), records.len().to_string().bright_white());
        println!(
            "{} Results: {}",
            "→".blue(),
            config.store.results_dir.display().to_string().bright_white()
        );
        println!(
            "{} Session restart every {} record(s), {} junk retries\n",
            "→".blue(),
            config.retry.recycle_every,
            config.retry.max_junk_retries
        );
    }

    let stop = Arc::new(AtomicBool::new(false));
    let stop_clone = stop.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing the current step");
            stop_clone.store(true, Ordering::SeqCst);
        }
    });

    let options = BatchOptions {
        records,
        results_dir: config.store.results_dir.clone(),
        artifact_dir: config.store.artifact_dir.clone(),
        policy: config.retry.clone(),
        rules: config.junk.clone(),
        key_policy: config.store.key,
        show_progress_bars: !quiet,
        stop,
    };

    let report = if dry_run {
        println!("{} Dry run: no requests leave this machine", "⚠".yellow().bold());
        execute_batch(ScriptedDriver::new(), options).await
    } else {
        let Some(form) = config.driver.as_ref() else {
            bail!("No \"driver\" section in the config; add one or pass --dry-run");
        };
        let driver = HttpFormDriver::new(form).context("Invalid driver configuration")?;
        execute_batch(driver, options).await
    };

    print!("\n{}", generate_run_report(&report.summary));
    report.result.context("Batch aborted")?;
    if !report.summary.interrupted {
        println!("{} Run complete!", "✓".green().bold());
    }
    Ok(())
}

pub fn handle_resolve(args: &ArgMatches, config: &RollcallConfig) -> Result<()> {
    let municipality = args
        .get_one::<String>("MUNICIPALITY")
        .context("a municipality is required")?;
    let postal_code = args.get_one::<String>("postal-code").map(String::as_str);

    let (table, postal) = load_tables(&config.data);
    let resolution = Resolver::new(&table, &postal).resolve(municipality, postal_code);

    let marker = if resolution.is_guess() {
        "⚠".yellow().bold()
    } else {
        "✓".green().bold()
    };
    println!(
        "{} {} → {} ({})",
        marker,
        municipality,
        resolution.jurisdiction.bright_white().bold(),
        describe_resolution(&resolution)
    );
    Ok(())
}

pub fn handle_expand(args: &ArgMatches, mut config: RollcallConfig) -> Result<()> {
    apply_overrides(&mut config, args);
    let input = args
        .get_one::<PathBuf>("input")
        .context("--input is required")?;

    let (table, postal) = load_tables(&config.data);
    let records = expand_input(&expand_path(input), &config, &table, &postal)?;
    for record in &records {
        println!(
            "{}\t{}\t{}\t{}\t{}",
            record.jurisdiction,
            record.postal_code,
            record.first_name,
            record.last_name,
            record.date_of_birth
        );
    }
    if !args.get_flag("quiet") {
        eprintln!("{} {} record(s)", "✓".green().bold(), records.len());
    }
    Ok(())
}

pub fn handle_sweep(args: &ArgMatches, mut config: RollcallConfig) -> Result<()> {
    apply_overrides(&mut config, args);
    let purge = args.get_flag("purge");
    let store = ResultStore::new(&config.store.results_dir);

    let report = sweep(&store, &config.junk, purge).with_context(|| {
        format!(
            "Failed to sweep results in {}",
            config.store.results_dir.display()
        )
    })?;

    for path in &report.junk {
        println!("  {} {}", "•".yellow(), path.display());
    }
    println!(
        "{} Scanned {} result file(s), {} junk",
        "✓".green().bold(),
        report.scanned,
        report.junk.len()
    );
    if purge {
        println!("{} Removed {} file(s)", "✓".green().bold(), report.removed);
    } else if !report.junk.is_empty() {
        println!("{} Rerun with --purge to delete them", "→".blue());
    }
    Ok(())
}
