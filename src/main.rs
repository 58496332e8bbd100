mod config;
mod logging;
mod model;
mod plex_rs;
mod ports;
mod services;
mod spotify_rs;
#[cfg(test)]
mod test_utils;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use clap::{Parser, Subcommand};
use color_eyre::{Result, eyre::Context};

use crate::{
    config::Config,
    logging::init_tracing,
    model::PlaylistIndex,
    ports::{destination::DestinationCatalog, source::take_snapshot},
    services::{
        plex::client::PlexHttpAdapter,
        spotify::client::SpotifyHttpAdapter,
        sync::synchronizer::{PlaylistSynchronizer, SyncRunReport},
    },
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The config file to use
    #[arg(short, long, global = true, env = "PLAYLIST_TRANSFER_CONFIG")]
    config: Option<PathBuf>,

    /// Tracing filter, e.g. `info` or `playlist_transfer=debug`
    #[arg(long, default_value = "info", global = true, env = "LOG_LEVEL")]
    log_level: String,

    /// OTLP gRPC endpoint to export spans to
    #[arg(long, global = true, env = "OTLP_ENDPOINT")]
    otlp_endpoint: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Copy Plex playlists to Spotify
    Sync {
        /// Only transfer entries added after this time (RFC 3339), overrides `since`
        #[arg(long, value_parser = parse_since)]
        since: Option<DateTime<FixedOffset>>,
    },
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Create a default config file, if it doesn't exist
    CreateDefault,
    /// Print the path to the config file
    Path,
}

fn parse_since(s: &str) -> Result<DateTime<FixedOffset>, String> {
    DateTime::parse_from_rfc3339(s).map_err(|e| format!("`{}` is not an RFC 3339 time: {}", s, e))
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    match args.command {
        Commands::Config(config_commands) => {
            let path = Config::resolve_path(args.config)?;
            match config_commands {
                ConfigCommands::CreateDefault => {
                    if Config::create_default(&path)? {
                        println!("Created default config at {}", path.display());
                    } else {
                        println!("Config already exists at {}", path.display());
                    }
                }
                ConfigCommands::Path => println!("{}", path.display()),
            }
            Ok(())
        }
        Commands::Sync { since } => {
            let config =
                Config::load(args.config).wrap_err("Failed to load playlist-transfer config")?;

            let otlp_endpoint = args.otlp_endpoint.or(config.otlp_endpoint.clone());
            let tracer_provider = init_tracing(
                "playlist-transfer",
                otlp_endpoint.as_deref(),
                &args.log_level,
            )?;

            let result = run_sync(&config, since.map(|t| t.timestamp())).await;

            if let Some(provider) = tracer_provider {
                if let Err(e) = provider.shutdown() {
                    eprintln!("Failed to flush traces: {}", e);
                }
            }

            let report = result?;
            print_summary(&report);
            Ok(())
        }
    }
}

async fn run_sync(config: &Config, since: Option<i64>) -> Result<SyncRunReport> {
    let timeout = config.request_timeout()?;

    tracing::debug!("Connecting to Plex at {}", config.plex.server_url);
    let source = Arc::new(
        PlexHttpAdapter::connect(config.plex_server_url()?, config.plex_token()?, timeout).await?,
    );

    tracing::debug!("Connecting to Spotify");
    let destination =
        Arc::new(SpotifyHttpAdapter::connect(config.spotify_access_token()?, timeout).await?);

    let snapshot = take_snapshot(&*source).await?;
    let index = PlaylistIndex::new(
        destination
            .list_playlists()
            .await
            .wrap_err("Failed to index destination playlists")?,
    );
    tracing::info!("Found {} existing destination playlists", index.len());

    let synchronizer = PlaylistSynchronizer::new(
        source,
        destination,
        Arc::new(snapshot),
        Arc::new(index),
        config.sync_options(since),
    );

    Ok(synchronizer.sync_all().await)
}

fn print_summary(report: &SyncRunReport) {
    for playlist in &report.synced {
        println!(
            "{} '{}': {} new entries, {} matched, {} added",
            if playlist.created { "Created" } else { "Updated" },
            playlist.name,
            playlist.candidates,
            playlist.matched,
            playlist.tracks_added
        );
        for label in &playlist.unmatched {
            println!("    not found: {}", label);
        }
    }
    for failure in &report.failed {
        println!("Failed '{}': {:#}", failure.name, failure.error);
    }
    println!(
        "{} playlists synced, {} failed, {} tracks added, {} unmatched",
        report.synced.len(),
        report.failed.len(),
        report.tracks_added(),
        report.unmatched()
    );
}
