use std::collections::HashMap;
use std::time::Duration;

use color_eyre::eyre::{OptionExt, Result, WrapErr};
use reqwest::Client;
use url::Url;

use crate::model::{Playlist, Track};
use crate::plex_rs::all_tracks::{
    find_music_section_id, get_all_tracks_paginated, get_library_sections, get_track,
};
use crate::plex_rs::playlist::{get_playlist_items, get_playlists, is_music_playlist};
use crate::ports::source::SourceCatalog;

const LIBRARY_PAGE_SIZE: u32 = 1000;
const PLAYLIST_PAGE_SIZE: u32 = 500;

/// Plex Media Server as the source catalog.
pub struct PlexHttpAdapter {
    client: Client,
    server_url: Url,
    token: String,
    music_section_id: String,
}

impl PlexHttpAdapter {
    /// Check the token against the server and locate its music library.
    pub async fn connect(server_url: Url, token: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .wrap_err("Failed to build Plex HTTP client")?;

        let sections = get_library_sections(&client, &server_url, &token)
            .await
            .wrap_err(format!(
                "Failed to log into Plex server at {}, check the server URL and token",
                server_url
            ))?;
        let music_section_id = find_music_section_id(&sections)
            .ok_or_eyre("No music library section found on Plex server")?
            .to_string();

        tracing::debug!("Using Plex music section {}", music_section_id);

        Ok(Self {
            client,
            server_url,
            token,
            music_section_id,
        })
    }
}

#[async_trait::async_trait]
impl SourceCatalog for PlexHttpAdapter {
    async fn list_all_tracks(&self) -> Result<HashMap<String, Track>> {
        let tracks = get_all_tracks_paginated(
            &self.client,
            &self.server_url,
            &self.token,
            &self.music_section_id,
            LIBRARY_PAGE_SIZE,
        )
        .await?;

        Ok(tracks
            .into_iter()
            .map(|t| (t.rating_key.clone(), t.into_track()))
            .collect())
    }

    async fn list_playlists(&self) -> Result<Vec<Playlist>> {
        let plex_playlists = get_playlists(&self.client, &self.server_url, &self.token).await?;

        let mut playlists = Vec::new();
        for plex_playlist in plex_playlists.into_iter().filter(is_music_playlist) {
            let items = get_playlist_items(
                &self.client,
                &self.server_url,
                &self.token,
                &plex_playlist.rating_key,
                PLAYLIST_PAGE_SIZE,
            )
            .await
            .wrap_err(format!(
                "Failed to fetch items of Plex playlist '{}'",
                plex_playlist.title
            ))?;

            tracing::debug!(
                "Plex playlist '{}' has {} items",
                plex_playlist.title,
                items.len()
            );

            playlists.push(Playlist {
                name: plex_playlist.title,
                entries: items.into_iter().map(|i| i.into_entry()).collect(),
                last_modified: plex_playlist.updated_at.unwrap_or_default(),
            });
        }

        Ok(playlists)
    }

    async fn resolve_track(&self, track_id: &str) -> Result<Track> {
        let track = get_track(&self.client, &self.server_url, &self.token, track_id).await?;
        Ok(track.into_track())
    }
}
