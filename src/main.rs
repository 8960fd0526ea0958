use anyhow::{Context, Result};
use chapterize::cli::{Cli, Commands, ConfigAction};
use chapterize::config::Config;
use chapterize::output::{render_status, render_summary};
use chapterize::pipeline::{Pipeline, Stage, clean_stages, stage_status};
use clap::{CommandFactory, Parser};
use owo_colors::OwoColorize;
use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "Error:".red(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        None => {
            let config = load_config(&cli)?;
            tracing::info!(version = %chapterize::version_string(), "starting pipeline");
            let pipeline = Pipeline::from_config(config)?;
            let summary = pipeline.run()?;
            print!("{}", render_summary(&summary, std::io::stdout().is_terminal()));
        }
        Some(Commands::Status) => {
            let config = load_config(&cli)?;
            println!("Stages (workdir: {}):", cli.workdir.display());
            print!(
                "{}",
                render_status(&stage_status(&config.paths), std::io::stdout().is_terminal())
            );
        }
        Some(Commands::Clean { stages, all }) => {
            let config = load_config(&cli)?;
            let stages: Vec<Stage> = if *all {
                Stage::ALL.to_vec()
            } else {
                stages.clone()
            };
            let removed = clean_stages(&config.paths, &stages)?;
            if removed.is_empty() {
                println!("{}", "Nothing to clean".dimmed());
            }
            for path in removed {
                println!("{} {}", "removed".green(), path.display());
            }
        }
        Some(Commands::Config { action }) => match action {
            ConfigAction::Show => {
                let config = load_config(&cli)?;
                print!("{}", config.to_toml()?);
            }
            ConfigAction::Path => {
                let path = cli.config.clone().unwrap_or_else(Config::default_path);
                println!("{}", path.display());
            }
        },
        Some(Commands::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(*shell, &mut cmd, "chapterize", &mut std::io::stdout());
        }
    }
    Ok(())
}

/// Layer configuration: file (or defaults), then environment, then command line.
fn load_config(cli: &Cli) -> Result<Config> {
    let config = match cli.config.as_deref() {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load_or_default(&Config::default_path())?,
    };

    let mut config = config.with_env_overrides()?;
    cli.apply_overrides(&mut config);
    Ok(config)
}

/// Install the fmt subscriber. `RUST_LOG` wins over the verbosity flags.
fn init_tracing(quiet: bool, verbose: u8) {
    let level = match (quiet, verbose) {
        (true, _) => LevelFilter::WARN,
        (false, 0) => LevelFilter::INFO,
        (false, 1) => LevelFilter::DEBUG,
        (false, _) => LevelFilter::TRACE,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
