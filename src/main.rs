mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands, LogFormat};
use ffdiff::{CleanOptions, Settings};
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool, format: LogFormat) {
    let default_filter = if verbose {
        "ffdiff=debug,ff_diff=debug,info"
    } else {
        "info"
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_format);

    let settings = Settings::load()?;
    tracing::debug!(base_dir = %settings.base_dir.display(), "loaded settings");

    match &cli.command {
        Commands::Diff(options) => commands::diff(&settings, options),
        Commands::UnusedPrefsUserjs(options) => commands::unused_prefs(&settings, options),
        Commands::DefaultPrefsUserjs { userjs, output } => {
            commands::default_prefs_userjs(&settings, userjs, output)
        }
        Commands::DefaultPrefs {
            source,
            query,
            output,
        } => commands::default_prefs(&settings, source, query, output),
        Commands::Clean(args) => commands::clean(&settings, &CleanOptions::from(args)),
    }
}
