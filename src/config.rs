use std::path::{Path, PathBuf};
use std::time::Duration;

use color_eyre::eyre::{OptionExt, Result, WrapErr, eyre};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::model::Watermark;
use crate::services::sync::synchronizer::SyncOptions;

const DEFAULT_CONFIG: &str = r#"# playlist-transfer configuration

# Only entries added after this unix timestamp (seconds) are transferred.
since = 0

# Only sync these playlists. Leave empty to sync all of them.
playlists = []

# Never sync these playlists.
exclude = []

# HTTP timeout for every catalog request.
request_timeout = "10s"

[concurrency]
# Playlists transferred at the same time
playlists = 4
# Track lookups in flight per playlist
tracks = 8

[plex]
server_url = "http://localhost:32400"
# Falls back to the PLEX_TOKEN environment variable
# token = ""

[spotify]
# Falls back to the SPOTIFY_ACCESS_TOKEN environment variable
# access_token = ""
"#;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub since: i64,
    #[serde(default)]
    pub playlists: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default = "default_request_timeout")]
    request_timeout: String,
    #[serde(default)]
    pub concurrency: ConcurrencyConfig,
    pub plex: PlexConfig,
    #[serde(default)]
    pub spotify: SpotifyConfig,
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcurrencyConfig {
    #[serde(default = "default_playlist_concurrency")]
    pub playlists: usize,
    #[serde(default = "default_track_concurrency")]
    pub tracks: usize,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            playlists: default_playlist_concurrency(),
            tracks: default_track_concurrency(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlexConfig {
    pub server_url: String,
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpotifyConfig {
    #[serde(default)]
    pub access_token: Option<String>,
}

fn default_request_timeout() -> String {
    "10s".to_string()
}

fn default_playlist_concurrency() -> usize {
    4
}

fn default_track_concurrency() -> usize {
    8
}

impl Config {
    /// Load config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .wrap_err(format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&contents)
            .wrap_err(format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        Ok(config)
    }

    /// `<config_dir>/playlist-transfer/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|path| path.join("playlist-transfer").join("config.toml"))
    }

    /// The explicit path if one was given, else the default location.
    pub fn resolve_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
        match explicit {
            Some(path) => Ok(path),
            None => Self::default_path().ok_or_eyre("Could not determine the config directory"),
        }
    }

    pub fn load(explicit: Option<PathBuf>) -> Result<Self> {
        let path = Self::resolve_path(explicit)?;
        if !path.exists() {
            return Err(eyre!(
                "Config file not found at {}, run `playlist-transfer config create-default`",
                path.display()
            ));
        }
        Self::from_file(&path)
    }

    /// Write the commented default config unless a file already exists. Returns
    /// `false` when nothing was written.
    pub fn create_default(path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .wrap_err(format!("Failed to create directory {}", parent.display()))?;
        }
        std::fs::write(path, DEFAULT_CONFIG)
            .wrap_err(format!("Failed to write config file: {}", path.display()))?;
        Ok(true)
    }

    pub fn request_timeout(&self) -> Result<Duration> {
        humantime::parse_duration(&self.request_timeout).wrap_err(format!(
            "Invalid request_timeout '{}'",
            self.request_timeout
        ))
    }

    pub fn plex_server_url(&self) -> Result<Url> {
        Url::parse(&self.plex.server_url)
            .wrap_err(format!("Invalid Plex server URL '{}'", self.plex.server_url))
    }

    pub fn plex_token(&self) -> Result<String> {
        self.plex
            .token
            .clone()
            .or_else(|| std::env::var("PLEX_TOKEN").ok())
            .ok_or_eyre("No Plex token configured, set [plex] token or PLEX_TOKEN")
    }

    pub fn spotify_access_token(&self) -> Result<String> {
        self.spotify
            .access_token
            .clone()
            .or_else(|| std::env::var("SPOTIFY_ACCESS_TOKEN").ok())
            .ok_or_eyre(
                "No Spotify access token configured, set [spotify] access_token or SPOTIFY_ACCESS_TOKEN",
            )
    }

    /// Options for one run. `since` overrides the configured watermark.
    pub fn sync_options(&self, since: Option<i64>) -> SyncOptions {
        SyncOptions {
            watermark: Watermark(since.unwrap_or(self.since)),
            playlists: self.playlists.clone(),
            exclude: self.exclude.clone(),
            playlist_concurrency: self.concurrency.playlists,
            track_concurrency: self.concurrency.tracks,
        }
    }
}
