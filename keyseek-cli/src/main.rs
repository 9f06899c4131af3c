//! keyseek: inspect continuation tokens and render page queries.

mod cli;
mod commands;
mod config;
mod log;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use crate::cli::Cli;
use crate::config::Config;
use crate::log::log;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        },
        Err(err) => {
            log!(error, "command failed", error: format!("{err:#}"));
            ExitCode::FAILURE
        },
    }
}

fn run(cli: &Cli) -> Result<String> {
    let (config, path) = Config::load(cli.config.as_deref())?;
    log::set_max_level(cli.log_level.unwrap_or(config.log_level));

    match &path {
        Some(path) => log!(debug, "config loaded", path: path.display()),
        None => log!(debug, "no config file, using defaults"),
    }

    let profile = config.profile(cli.profile.as_deref())?;
    commands::run(&cli.command, &config, &profile)
}
