mod cli;
mod commands;
mod config;
mod paths;
mod state;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Commands};
use config::Config;
use std::io;
use std::path::PathBuf;
use wpcli::{Client, ConnectionProfile};

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    pub config: Config,
    pub profile: ConnectionProfile,
    pub state_path: PathBuf,
}

impl Context {
    /// wp-cli client for the configured executable
    pub fn client(&self) -> Client {
        Client::new().with_program(self.config.wp_binary.clone())
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    if let Commands::Completions { shell } = cli.command {
        generate(shell, &mut Cli::command(), "wpsite", &mut io::stdout());
        return Ok(());
    }

    let config_path = match cli.config {
        Some(path) => path,
        None => paths::config_file()?,
    };
    let state_path = match cli.state {
        Some(path) => path,
        None => paths::state_file()?,
    };

    let mut config = Config::load_from(&config_path)?;
    config.apply_overrides(&cli.connection);

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        profile: config.connection.clone(),
        config,
        state_path,
    };
    log::debug!("Target site: {}", ctx.profile);

    match cli.command {
        Commands::Plugin(cmd) => commands::plugin::run(&ctx, cmd),
        Commands::Theme(cmd) => commands::theme::run(&ctx, cmd),
        Commands::Options(cmd) => commands::option::run(&ctx, cmd),
        Commands::Settings(cmd) => commands::settings::run(&ctx, cmd),
        Commands::User(cmd) => commands::user::run(&ctx, cmd),
        Commands::State { json } => commands::state::run(&ctx, json),
        Commands::Completions { .. } => Ok(()),
    }
}
