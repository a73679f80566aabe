#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod cli;
mod commands;
mod devices;
mod error_fmt;
mod logging;
mod station;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use eyre::WrapErr;
use station_config::Config;
use station_core::StationError;

use crate::cli::{Cli, Commands, JSON_MODE};

fn main() {
    let cli = Cli::parse();
    let _ = color_eyre::install();
    let _ = JSON_MODE.set(cli.json);

    if let Err(err) = real_main(cli) {
        let json = JSON_MODE.get().copied().unwrap_or(false);
        if json {
            eprintln!("{}", error_fmt::format_error_json(&err));
        } else {
            eprintln!("{}", error_fmt::humanize(&err));
        }
        std::process::exit(error_fmt::exit_code_for_error(&err));
    }
}

fn load_config(path: Option<&std::path::Path>) -> eyre::Result<Config> {
    let cfg = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .wrap_err_with(|| format!("read config {}", path.display()))?;
            station_config::load_toml(&text)
                .map_err(|e| eyre::Report::new(StationError::Config(e.to_string())))
                .wrap_err("parse config")?
        }
        None => Config::default(),
    };
    cfg.validate()
        .map_err(|e| eyre::Report::new(StationError::Config(e.to_string())))?;
    Ok(cfg)
}

fn real_main(cli: Cli) -> eyre::Result<()> {
    let cfg = load_config(cli.config.as_deref())?;
    logging::init(&cli.log_level, cli.json, &cfg.logging)?;
    tracing::debug!(config = ?cli.config, "configuration loaded");

    match cli.cmd {
        Commands::Run { max_ms, calibrate } => {
            let shutdown = Arc::new(AtomicBool::new(false));
            let flag = Arc::clone(&shutdown);
            ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
                .wrap_err("install Ctrl-C handler")?;
            commands::run(&cfg, max_ms, calibrate, cli.json, &shutdown)
        }
        Commands::Replay { trace, calibrate } => {
            commands::replay(&cfg, &trace, calibrate, cli.json)
        }
        Commands::Simulate {
            grams,
            tag,
            registration_delay,
        } => commands::simulate(&cfg, grams, &tag, registration_delay, cli.json),
        Commands::CheckConfig => {
            println!("config OK");
            Ok(())
        }
        Commands::SelfCheck => {
            let raw = devices::self_check(&cfg)?;
            tracing::info!(raw, "self-check scale reading");
            println!("self-check ok");
            Ok(())
        }
    }
}
