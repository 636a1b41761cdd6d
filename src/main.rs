//! Command-line front end for the photofeed configuration engine.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use photofeed::host::HostEnvironment;
use photofeed::prefs::FilePrefs;
use photofeed::theme::LocalThemeFetcher;
use photofeed::{ConfigStore, LifecycleState};
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Debug, Parser)]
#[command(name = "photofeed", about = "Inspect and edit photofeed widget configuration")]
struct Cli {
    /// Path to the host environment YAML file
    #[arg(long, value_name = "FILE", default_value = "host.yaml")]
    host: PathBuf,

    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print every parameter with its flag, theming and value
    Show,
    /// Edit one user-configurable parameter
    Set { name: String, value: String },
    /// Restore one parameter to its default
    Reset { name: String },
    /// Print the configuration as a theme document
    ExportTheme,
    /// Print the persisted configuration blob
    Blob,
}

fn init_tracing(verbosity: u8) -> Result<()> {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("photofeed={level}").parse()?);
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let host = HostEnvironment::from_yaml_file(&cli.host)
        .and_then(HostEnvironment::validated)
        .with_context(|| format!("loading host environment from {}", cli.host.display()))?;
    let fetcher = LocalThemeFetcher::new(host.theme_root.clone());
    let prefs = FilePrefs::new(&host.prefs_path);

    let mut store = ConfigStore::new(host, prefs);
    let state = store
        .init(&fetcher)
        .await
        .context("initializing configuration")?;
    info!(%state, theme_status = %store.theme_status(), "configuration initialized");

    let outcome = match cli.command {
        Command::Show => show(&store),
        Command::Set { name, value } => store.save(&name, &value).map(|changed| {
            if !changed {
                eprintln!("{name}: unchanged");
            }
        }),
        Command::Reset { name } => match store.reset_to_default(&name) {
            Ok(true) => store.commit(),
            Ok(false) => {
                eprintln!("{name}: no default applied");
                Ok(())
            }
            Err(err) => Err(err),
        },
        Command::ExportTheme => store.export_theme_xml().map(|xml| print!("{xml}")),
        Command::Blob => {
            println!("{}", store.to_wire_text());
            Ok(())
        }
    };

    if let Err(err) = outcome {
        eprintln!("{}", err.text());
        return Ok(ExitCode::FAILURE);
    }
    if store.state() == LifecycleState::Errored {
        if let Some(err) = store.error() {
            eprintln!("{}", err.text());
        }
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn show(store: &ConfigStore<FilePrefs>) -> photofeed::Result<()> {
    println!("state: {}", store.state());
    println!("theme status: {}", store.theme_status());
    if let Some(err) = store.theme_error() {
        println!("theme error: {}", err.text().replace('\n', " | "));
    }
    for decl in store.schema().iter() {
        let name = decl.name.as_str();
        println!(
            "{name:<18} {} {:<8} {}",
            decl.flag,
            store.theming(name).as_str(),
            store.to_text(name)?
        );
    }
    Ok(())
}
