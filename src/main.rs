use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::{error, info};
use serde::Serialize;

use raceline::cache::ReplayStore;
use raceline::provider::RecordedSessionProvider;
use raceline::replay::{RaceCatalog, ReplayBuilder, SEASON_EVENTS};
use raceline::track::TrackBuilder;
use raceline::{AppConfig, RacelineError};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the races with retrievable data for the configured season
    Races,
    /// Build the replay dataset for one session
    Replay {
        #[arg(short, long)]
        year: Option<u16>,

        #[arg(short, long)]
        event: String,

        #[arg(short, long, default_value = "R")]
        session: String,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Build the normalized track shape for one event
    Track {
        #[arg(short, long)]
        year: Option<u16>,

        #[arg(short, long)]
        event: String,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Build replay and track data for every available event of the season
    Preload {
        #[arg(short, long)]
        year: Option<u16>,
    },
    /// Drop all cached documents
    ClearCache,
}

fn emit<T: Serialize>(document: &T, output: Option<&PathBuf>) -> Result<(), RacelineError> {
    let rendered = serde_json::to_string_pretty(document)
        .map_err(|e| RacelineError::StoreSerializeError { source: e })?;
    match output {
        Some(path) => {
            fs::write(path, rendered).map_err(|e| RacelineError::OutputIOError { source: e })?;
            info!("Wrote {:?}", path);
        }
        None => println!("{}", rendered),
    }
    Ok(())
}

fn preload(
    config: &AppConfig,
    provider: &RecordedSessionProvider,
    store: &dyn ReplayStore,
    year: u16,
) -> Result<(), RacelineError> {
    let replay_builder = ReplayBuilder::new(provider, store);
    let track_builder = TrackBuilder::new(provider, store);

    let mut loaded = 0usize;
    for event in SEASON_EVENTS {
        match replay_builder.build(year, event, "R") {
            Ok(document) => {
                info!(
                    "Preloaded {} {}: {} frames, {} drivers",
                    year,
                    event,
                    document.frames.len(),
                    document.drivers.len()
                );
                loaded += 1;
            }
            Err(e) => {
                info!("Skipping {} {}: {}", year, event, e);
                continue;
            }
        }
        if let Err(e) = track_builder.build(year, event) {
            error!("Could not build track for {} {}: {}", year, event, e);
        }
    }
    info!("Preloaded {}/{} events", loaded, SEASON_EVENTS.len());

    // refresh the race list while everything is warm
    RaceCatalog::new(provider, store, config.season).list()?;
    Ok(())
}

fn run(args: Args) -> Result<(), RacelineError> {
    let config = AppConfig::from_local_file().unwrap_or_default();
    let provider = RecordedSessionProvider::new(config.sessions_dir.clone());
    let store = config.make_store()?;

    match args.command {
        Commands::Races => {
            let races = RaceCatalog::new(&provider, &*store, config.season).list()?;
            emit(&races, None)
        }
        Commands::Replay {
            year,
            event,
            session,
            output,
        } => {
            let builder = ReplayBuilder::new(&provider, &*store);
            let document = builder.build(year.unwrap_or(config.season), &event, &session)?;
            emit(&document, output.as_ref())
        }
        Commands::Track {
            year,
            event,
            output,
        } => {
            let builder = TrackBuilder::new(&provider, &*store);
            let geometry = builder.build(year.unwrap_or(config.season), &event)?;
            emit(&geometry, output.as_ref())
        }
        Commands::Preload { year } => preload(
            &config,
            &provider,
            &*store,
            year.unwrap_or(config.season),
        ),
        Commands::ClearCache => {
            store.clear()?;
            info!("Cache cleared");
            Ok(())
        }
    }
}

fn main() {
    colog::init();

    ctrlc::set_handler(move || {
        println!("Exiting...");
        std::process::exit(0);
    })
    .expect("Could not set Ctrl-C handler");

    let args = Args::parse();
    if let Err(e) = run(args) {
        error!("{}", e);
        std::process::exit(1);
    }
}
