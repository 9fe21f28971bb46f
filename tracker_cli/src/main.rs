#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! `tracker`: run, simulate and check the solar tracker controller.

mod cli;
mod error_fmt;
mod rt;
mod run;

use std::path::Path;

use clap::Parser;
use eyre::WrapErr;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::{Cli, CliError, Commands, FILE_GUARD, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};

fn main() {
    // Panic and backtrace reports; returned errors are formatted below.
    let _ = color_eyre::install();

    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(err) = real_main(&cli) {
        tracing::error!(error = %err, "command failed");
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", format_error_json(&err));
        } else {
            eprintln!("{}", humanize(&err));
        }
        std::process::exit(exit_code_for_error(&err));
    }
}

fn real_main(cli: &Cli) -> eyre::Result<()> {
    let cfg = load_config(cli.config.as_deref(), cli.calibration.as_deref())?;
    init_tracing(cli.json, cli.log_level.as_deref(), &cfg.logging)?;
    tracing::debug!(
        config = ?cli.config,
        tick_hz = cfg.control.tick_hz,
        history_order = ?cfg.status.history_order,
        "configuration loaded"
    );

    match &cli.cmd {
        Commands::Run { exit_on_eof, cpu } => run::run(&cfg, *exit_on_eof, *cpu),
        Commands::Simulate(args) => run::simulate(&cfg, args),
        Commands::SelfCheck => run::self_check(&cfg),
    }
}

/// Defaults when no file is given; the calibration CSV replaces `[[sensors]]`.
fn load_config(path: Option<&Path>, calibration: Option<&Path>) -> eyre::Result<tracker_config::Config> {
    let mut cfg = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| CliError::InvalidConfig(format!("read {}: {e}", path.display())))?;
            tracker_config::load_toml(&text)
                .wrap_err_with(|| format!("parse config {}", path.display()))?
        }
        None => tracker_config::Config::default(),
    };
    if let Some(csv) = calibration {
        let rows = tracker_config::load_calibration_csv(csv)
            .map_err(|e| CliError::InvalidConfig(e.to_string()))?;
        cfg = cfg.with_sensors(rows);
    }
    cfg.validate()
        .map_err(|e| CliError::InvalidConfig(e.to_string()))?;
    Ok(cfg)
}

fn init_tracing(json: bool, cli_level: Option<&str>, logging: &tracker_config::Logging) -> eyre::Result<()> {
    // RUST_LOG wins, then --log-level, then [logging].level
    let level = cli_level
        .or(logging.level.as_deref())
        .unwrap_or("info");
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| CliError::InvalidConfig(format!("log level {level:?}: {e}")))?;

    let console_json = json.then(|| {
        fmt::layer()
            .json()
            .with_current_span(false)
            .with_writer(std::io::stderr)
    });
    let console_text = (!json).then(|| {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
    });

    let file_layer = match logging.file.as_deref() {
        Some(file) => {
            let path = Path::new(file);
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| CliError::InvalidConfig(format!("logging.file {file:?} has no file name")))?;
            let appender = match logging.rotation.as_deref() {
                Some("daily") => tracing_appender::rolling::daily(dir, name),
                Some("hourly") => tracing_appender::rolling::hourly(dir, name),
                _ => tracing_appender::rolling::never(dir, name),
            };
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            Some(fmt::layer().json().with_ansi(false).with_writer(writer))
        }
        None => None,
    };

    // A global subscriber may already exist (tests); keep it.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console_json)
        .with(console_text)
        .with(file_layer)
        .try_init();
    Ok(())
}
