use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tempo_cli::commands::{entries, export, project, report, start, status, stop};
use tempo_cli::{App, Cli, Commands, Config, ProjectAction};

/// Load config and open the application context.
fn open_app(config_path: Option<&Path>) -> Result<(App, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let app = App::open(&config)?;
    Ok((app, config))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    match &cli.command {
        Some(Commands::Project { action }) => {
            let (app, _config) = open_app(cli.config.as_deref())?;
            match action {
                ProjectAction::Add { name } => project::add(&app, name)?,
                ProjectAction::List => project::list(&mut std::io::stdout(), &app)?,
            }
        }
        Some(Commands::Start { project: name }) => {
            let (mut app, _config) = open_app(cli.config.as_deref())?;
            start::run(&mut app, name)?;
        }
        Some(Commands::Stop { note }) => {
            let (mut app, _config) = open_app(cli.config.as_deref())?;
            stop::run(&mut app, note)?;
        }
        Some(Commands::Status { watch }) => {
            let (app, config) = open_app(cli.config.as_deref())?;
            if *watch {
                status::watch(&app)?;
            } else {
                status::run(&mut std::io::stdout(), &app, &config.database_path)?;
            }
        }
        Some(Commands::Report { json }) => {
            let (app, _config) = open_app(cli.config.as_deref())?;
            report::run(&app.db, *json)?;
        }
        Some(Commands::Entries { json }) => {
            let (app, _config) = open_app(cli.config.as_deref())?;
            entries::run(&mut std::io::stdout(), &app.db, *json)?;
        }
        Some(Commands::Export { output }) => {
            let (app, _config) = open_app(cli.config.as_deref())?;
            export::run(&app.db, output)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
