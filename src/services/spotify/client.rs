use std::time::Duration;

use color_eyre::eyre::{Result, WrapErr};

use crate::model::DestinationPlaylist;
use crate::ports::destination::{DestinationCatalog, SearchOutcome, TrackIdPage};
use crate::spotify_rs::client::{SearchResult, SpotifyApiError, SpotifyClient};
use crate::spotify_rs::types::SpotifyPlaylist;

/// Spotify as the destination catalog.
pub struct SpotifyHttpAdapter {
    client: SpotifyClient,
    user_id: String,
}

impl SpotifyHttpAdapter {
    /// Validate the access token by fetching the current user, playlists are created under them.
    pub async fn connect(access_token: String, timeout: Duration) -> Result<Self> {
        let client =
            SpotifyClient::new(access_token, timeout).wrap_err("Failed to build Spotify client")?;
        Self::from_client(client).await
    }

    pub async fn from_client(client: SpotifyClient) -> Result<Self> {
        let user = client
            .get_current_user()
            .await
            .wrap_err("Failed to log into Spotify, check the access token")?;

        tracing::info!(
            "Logged into Spotify as {}",
            user.display_name.as_deref().unwrap_or(&user.id)
        );

        Ok(Self {
            client,
            user_id: user.id,
        })
    }
}

fn to_destination_playlist(playlist: SpotifyPlaylist) -> DestinationPlaylist {
    DestinationPlaylist {
        id: playlist.id,
        name: playlist.name,
    }
}

#[async_trait::async_trait]
impl DestinationCatalog for SpotifyHttpAdapter {
    async fn list_playlists(&self) -> Result<Vec<DestinationPlaylist>> {
        let playlists = self
            .client
            .get_user_playlists()
            .await
            .wrap_err("Failed to list Spotify playlists")?;
        Ok(playlists.into_iter().map(to_destination_playlist).collect())
    }

    async fn create_playlist(&self, name: &str) -> Result<DestinationPlaylist> {
        let playlist = self
            .client
            .create_playlist(&self.user_id, name)
            .await
            .wrap_err(format!("Failed to create Spotify playlist '{}'", name))?;
        Ok(to_destination_playlist(playlist))
    }

    async fn search_track(&self, title: &str, artist: &str) -> Result<SearchOutcome> {
        match self.client.search_tracks(title, artist).await {
            Ok(SearchResult::TrackIds(ids)) => Ok(SearchOutcome::Hits(ids)),
            Ok(SearchResult::Malformed(reason)) => Ok(SearchOutcome::Malformed { reason }),
            // An undecodable body is the same kind of failure as a malformed one
            Err(SpotifyApiError::FailedToParseResponse(e)) => Ok(SearchOutcome::Malformed {
                reason: e.to_string(),
            }),
            Err(e) => Err(e).wrap_err(format!("Search for '{} - {}' failed", title, artist)),
        }
    }

    async fn playlist_track_ids_page(
        &self,
        playlist_id: &str,
        cursor: Option<String>,
    ) -> Result<TrackIdPage> {
        let page = self
            .client
            .get_playlist_items_page(playlist_id, cursor)
            .await
            .wrap_err(format!("Failed to list tracks of playlist {}", playlist_id))?;

        Ok(TrackIdPage {
            ids: page
                .items
                .into_iter()
                .filter_map(|item| item.track.and_then(|t| t.id))
                .collect(),
            next: page.next,
        })
    }

    async fn add_tracks(&self, playlist_id: &str, track_ids: &[String]) -> Result<()> {
        self.client
            .add_tracks_to_playlist(playlist_id, track_ids)
            .await
            .wrap_err(format!(
                "Failed to add {} tracks to playlist {}",
                track_ids.len(),
                playlist_id
            ))
    }
}
