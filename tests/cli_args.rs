//! Integration tests for CLI argument handling
//!
//! Runs the aptscout binary with a throwaway cache directory.

use std::process::Command;

use tempfile::TempDir;

/// Helper to run the CLI with given args and capture output
fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_aptscout"))
        .args(args)
        .env("RUST_LOG", "info")
        .output()
        .expect("Failed to execute aptscout")
}

#[test]
fn test_help_flag_exits_successfully() {
    let output = run_cli(&["--help"]);
    assert!(output.status.success(), "Expected --help to exit successfully");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("aptscout"), "Help should mention aptscout");
    assert!(stdout.contains("--refresh"), "Help should mention --refresh flag");
    assert!(stdout.contains("--offline"), "Help should mention --offline flag");
}

#[test]
fn test_unknown_refresh_stage_prints_error_and_exits() {
    let output = run_cli(&["--refresh", "everything"]);
    assert!(!output.status.success(), "Expected invalid stage to fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("invalid value") || stderr.contains("everything"),
        "Should print error message about the refresh stage: {}",
        stderr
    );
}

#[test]
fn test_invalid_neighborhoods_fails() {
    let temp_dir = TempDir::new().unwrap();
    let cache_dir = temp_dir.path().to_str().unwrap();
    let output = run_cli(&["--offline", "--cache-dir", cache_dir, "--neighborhoods", "upper west"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("InvalidNeighborhoods"), "stderr: {}", stderr);
}

#[test]
fn test_offline_run_writes_no_cache_files() {
    let temp_dir = TempDir::new().unwrap();
    let cache_dir = temp_dir.path().to_str().unwrap();

    let output = run_cli(&["--offline", "--cache-dir", cache_dir, "--refresh", "all"]);

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
}

#[test]
fn test_missing_listing_export_fails() {
    let temp_dir = TempDir::new().unwrap();
    let cache_dir = temp_dir.path().to_str().unwrap();
    let missing = temp_dir.path().join("nope.json");

    let output = run_cli(&["--cache-dir", cache_dir, "--listings", missing.to_str().unwrap()]);

    assert!(!output.status.success());
}

#[cfg(test)]
mod unit_tests {
    //! Unit tests for CLI parsing that don't require running the binary

    use aptscout::app::RefreshPolicy;
    use aptscout::cli::{Cli, RefreshTarget, StartupConfig};
    use clap::Parser;

    #[test]
    fn test_cli_no_args_refreshes_nothing() {
        let cli = Cli::parse_from(["aptscout"]);
        let config = StartupConfig::from_cli(&cli).unwrap();
        assert_eq!(config.refresh, RefreshPolicy::default());
        assert!(!config.offline);
    }

    #[test]
    fn test_cli_refresh_values() {
        let cli = Cli::parse_from(["aptscout", "--refresh", "catalog", "--refresh", "stores"]);
        assert_eq!(cli.refresh, vec![RefreshTarget::Catalog, RefreshTarget::Stores]);
    }

    #[test]
    fn test_cli_default_amenities() {
        let cli = Cli::parse_from(["aptscout"]);
        let config = StartupConfig::from_cli(&cli).unwrap();
        assert_eq!(config.search.amenities, vec!["laundry", "doorman", "elevator"]);
    }
}
