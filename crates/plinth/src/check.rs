// SPDX-FileCopyrightText: 2026 Plinth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `plinth check`: load, validate and trial-configure a document.

use std::io::IsTerminal;
use std::path::Path;
use std::process::ExitCode;

use plinth::config::{ConfigError, PlinthConfig, render_errors};
use plinth::{CategoryType, ConfigureReport, Plinth, PlinthError};

#[derive(Debug, PartialEq)]
enum Status {
    Ok,
    Skip,
    Fail,
}

/// One line of check output.
#[derive(Debug, PartialEq)]
struct CheckLine {
    status: Status,
    label: String,
    message: String,
}

fn load(path: Option<&Path>) -> Result<PlinthConfig, Vec<ConfigError>> {
    match path {
        Some(path) => plinth::config::load_and_validate_path(path),
        None => plinth::config::load_and_validate(),
    }
}

/// Slice lines: which categories the document configures, with plugin keys.
fn slice_lines(config: &PlinthConfig) -> Vec<CheckLine> {
    CategoryType::ALL
        .into_iter()
        .map(|category| match config.slice(category) {
            Some(slice) if !slice.plugins.is_empty() => CheckLine {
                status: Status::Ok,
                label: category.config_key().to_string(),
                message: slice.plugins.keys().cloned().collect::<Vec<_>>().join(", "),
            },
            Some(_) => CheckLine {
                status: Status::Skip,
                label: category.config_key().to_string(),
                message: "slice has no plugins".to_string(),
            },
            None => CheckLine {
                status: Status::Skip,
                label: category.config_key().to_string(),
                message: "no slice".to_string(),
            },
        })
        .collect()
}

/// Report lines for the built-in plugins after a trial configure.
fn report_lines(report: &ConfigureReport) -> Vec<CheckLine> {
    let configured = report.configured.iter().map(|(category, key)| CheckLine {
        status: Status::Ok,
        label: format!("{}.{key}", category.config_key()),
        message: "configured".to_string(),
    });
    let failed = report.failures.iter().map(|f| CheckLine {
        status: Status::Fail,
        label: format!("{}.{}", f.category.config_key(), f.plugin_key),
        message: f.error.to_string(),
    });
    configured.chain(failed).collect()
}

async fn trial_configure(config: &PlinthConfig) -> Result<ConfigureReport, PlinthError> {
    let plinth = Plinth::new().with_builtin_plugins()?;
    let report = plinth.configure(config)?;
    plinth.shutdown().await?;
    Ok(report)
}

fn print_lines(title: &str, lines: &[CheckLine], use_color: bool) {
    println!("  {title}");
    for line in lines {
        let text = if use_color {
            use colored::Colorize;
            let mark = match line.status {
                Status::Ok => "✓".green(),
                Status::Skip => "-".dimmed(),
                Status::Fail => "✗".red(),
            };
            format!("    {mark} {:<20} {}", line.label, line.message)
        } else {
            let mark = match line.status {
                Status::Ok => "[OK]  ",
                Status::Skip => "[SKIP]",
                Status::Fail => "[FAIL]",
            };
            format!("    {mark} {:<20} {}", line.label, line.message)
        };
        println!("{text}");
    }
}

pub async fn run_check(path: Option<&Path>, plain: bool) -> ExitCode {
    let use_color = !plain && std::io::stdout().is_terminal();

    let config = match load(path) {
        Ok(config) => config,
        Err(errors) => {
            render_errors(&errors);
            return ExitCode::FAILURE;
        }
    };

    println!();
    println!("  plinth check (environment: {})", config.environment);
    println!("  {}", "-".repeat(50));
    print_lines("slices", &slice_lines(&config), use_color);

    let report = match trial_configure(&config).await {
        Ok(report) => report,
        Err(err) => {
            eprintln!("plinth: {err}");
            return ExitCode::FAILURE;
        }
    };
    let lines = report_lines(&report);
    if !lines.is_empty() {
        print_lines("built-in plugins", &lines, use_color);
    }
    println!();

    if report.is_success() {
        println!("  Configuration is valid.");
        ExitCode::SUCCESS
    } else {
        println!("  {} plugin(s) rejected their configuration.", report.failures.len());
        ExitCode::FAILURE
    }
}

#[cfg(test)]
mod tests {
    use plinth::config::load_config_from_str;

    use super::*;

    #[test]
    fn slice_lines_list_plugin_keys() {
        let config = load_config_from_str(
            "[storage.plugins.s3]\nbucket = \"b\"\n[storage.plugins.gcs]\n[api]\n",
        )
        .unwrap();
        let lines = slice_lines(&config);
        let storage = lines.iter().find(|l| l.label == "storage").unwrap();
        assert_eq!(storage.status, Status::Ok);
        assert_eq!(storage.message, "gcs, s3");
        let api = lines.iter().find(|l| l.label == "api").unwrap();
        assert_eq!(api.status, Status::Skip);
        assert_eq!(api.message, "slice has no plugins");
    }

    #[tokio::test]
    async fn trial_configure_reports_builtin_failures() {
        let config =
            load_config_from_str("[logging.plugins.tracing]\nmin_level = \"loud\"\n").unwrap();
        let report = trial_configure(&config).await.unwrap();
        let lines = report_lines(&report);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].status, Status::Fail);
        assert_eq!(lines[0].label, "logging.tracing");
    }

    #[tokio::test]
    async fn trial_configure_accepts_builtin_slices() {
        let config = load_config_from_str(
            "[logging.plugins.tracing]\nmin_level = \"debug\"\n[hub.plugins.bus]\n",
        )
        .unwrap();
        let report = trial_configure(&config).await.unwrap();
        assert!(report.is_success());
        assert_eq!(report_lines(&report).len(), 2);
    }

    #[test]
    fn missing_file_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(Some(&dir.path().join("nope.toml"))).is_err());
    }
}
