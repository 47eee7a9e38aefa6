use rollcall::commands::command_argument_builder;
use rollcall::handlers::*;
use rollcall_core::config::{DataConfig, RollcallConfig};
use rollcall_core::dates::ExpansionMode;
use rollcall_core::resolver::{Resolution, ResolvedVia};
use rollcall_core::store::KeyPolicy;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tempfile::{NamedTempFile, TempDir};

fn subcommand_matches(argv: &[&str]) -> clap::ArgMatches {
    let matches = command_argument_builder()
        .try_get_matches_from(argv)
        .unwrap();
    let (_, sub) = matches.subcommand().unwrap();
    sub.clone()
}

#[test]
fn test_run_flags_override_config() {
    let args = subcommand_matches(&[
        "rollcall",
        "run",
        "--input",
        "people.txt",
        "--results-dir",
        "out",
        "--key",
        "full",
        "--mode",
        "single",
        "--recycle-every",
        "5",
        "--max-retries",
        "1",
    ]);
    let mut config = RollcallConfig::default();
    apply_overrides(&mut config, &args);

    assert_eq!(config.store.results_dir, PathBuf::from("out"));
    assert_eq!(config.store.key, KeyPolicy::Full);
    assert_eq!(config.expansion.default_mode, ExpansionMode::Single);
    assert_eq!(config.retry.recycle_every, 5);
    assert_eq!(config.retry.max_junk_retries, 1);
}

#[test]
fn test_sweep_ignores_run_only_overrides() {
    let args = subcommand_matches(&["rollcall", "sweep", "--results-dir", "old", "--purge"]);
    let mut config = RollcallConfig::default();
    apply_overrides(&mut config, &args);

    assert_eq!(config.store.results_dir, PathBuf::from("old"));
    assert_eq!(config.store.key, KeyPolicy::FirstLast);
    assert!(args.get_flag("purge"));
}

#[test]
fn test_run_requires_input() {
    let result = command_argument_builder().try_get_matches_from(["rollcall", "run"]);
    assert!(result.is_err());
}

#[test]
fn test_unknown_mode_rejected() {
    let result = command_argument_builder().try_get_matches_from([
        "rollcall", "expand", "--input", "x.txt", "--mode", "weekly",
    ]);
    assert!(result.is_err());
}

#[test]
fn test_global_flags_after_subcommand() {
    let args = subcommand_matches(&["rollcall", "resolve", "Gettysburg", "-z", "17325", "-q"]);
    assert!(args.get_flag("quiet"));
    assert_eq!(
        args.get_one::<String>("postal-code").map(String::as_str),
        Some("17325")
    );
}

#[test]
fn test_load_config_from_file() -> Result<(), Box<dyn std::error::Error>> {
    let mut file = NamedTempFile::new()?;
    writeln!(file, r#"{{ "store": {{ "results_dir": "elsewhere" }} }}"#)?;
    let path = file.path().to_string_lossy().to_string();

    let matches = command_argument_builder()
        .try_get_matches_from(["rollcall", "--config", path.as_str(), "sweep"])?;
    let config = load_config(&matches)?;
    assert_eq!(config.store.results_dir, PathBuf::from("elsewhere"));
    Ok(())
}

#[test]
fn test_load_config_bad_json() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{{ not json").unwrap();
    let path = file.path().to_string_lossy().to_string();

    let matches = command_argument_builder()
        .try_get_matches_from(["rollcall", "--config", path.as_str(), "sweep"])
        .unwrap();
    assert!(load_config(&matches).is_err());
}

#[test]
fn test_load_tables_missing_data_is_empty() {
    let dir = TempDir::new().unwrap();
    let data = DataConfig {
        reference_dir: dir.path().join("absent"),
        postal_file: dir.path().join("absent.txt"),
    };
    let (table, postal) = load_tables(&data);
    assert!(table.is_empty());
    assert!(postal.is_empty());
}

#[test]
fn test_expand_input_end_to_end() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let reference = dir.path().join("csv-dataset");
    fs::create_dir(&reference)?;
    fs::write(
        reference.join("adams.csv"),
        "municipality,county\nGettysburg Borough,Adams\n",
    )?;
    let postal_file = dir.path().join("zip-codes.txt");
    fs::write(&postal_file, "ZIP Code 17401\tYork\tYork\n")?;
    let input = dir.path().join("input.txt");
    fs::write(
        &input,
        "City,Zip,First,Last,DOB\nGettysburg,,Jane,Doe,10/01/1990,3\nAnywhere,17401,John,Roe,1/1/1980,1\nbad row\n",
    )?;

    let mut config = RollcallConfig::default();
    config.data = DataConfig {
        reference_dir: reference,
        postal_file,
    };
    let (table, postal) = load_tables(&config.data);
    let records = expand_input(&input, &config, &table, &postal)?;

    assert_eq!(records.len(), 4);
    assert_eq!(records[0].jurisdiction, "ADAMS");
    assert_eq!(records[2].date_of_birth, "10/03/1990");
    assert_eq!(records[3].jurisdiction, "YORK");
    Ok(())
}

#[test]
fn test_expand_input_missing_file() {
    let config = RollcallConfig::default();
    let (table, postal) = load_tables(&config.data);
    let result = expand_input(
        &PathBuf::from("/nonexistent/rollcall/input.txt"),
        &config,
        &table,
        &postal,
    );
    assert!(result.is_err());
}

#[test]
fn test_describe_resolution() {
    let guess = Resolution {
        jurisdiction: "BERKS".to_string(),
        via: ResolvedVia::Ambiguous(vec!["BERKS".to_string(), "FRANKLIN".to_string()]),
    };
    assert_eq!(describe_resolution(&guess), "ambiguous, first of BERKS, FRANKLIN");

    let variation = Resolution {
        jurisdiction: "ADAMS".to_string(),
        via: ResolvedVia::Variation("gettysburg".to_string()),
    };
    assert_eq!(describe_resolution(&variation), "name variation 'gettysburg'");
}
