use std::time::Duration;

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::spotify_rs::types::{
    AddTracksRequest, CreatePlaylistRequest, SpotifyPage, SpotifyPlaylist, SpotifyPlaylistItem,
    SpotifySearchResponse, SpotifyUser,
};

pub const SPOTIFY_API_URL: &str = "https://api.spotify.com/v1";

#[derive(Debug, thiserror::Error)]
pub enum SpotifyApiError {
    #[error("Spotify rejected the access token: {reason}")]
    Unauthorized { reason: String },
    #[error("Failed to send http request: {0}")]
    FailedToSendRequest(reqwest::Error),
    #[error("Spotify returned {status}: {body}")]
    UnexpectedStatus { status: StatusCode, body: String },
    #[error("Failed to parse response: {0}")]
    FailedToParseResponse(reqwest::Error),
}

/// What `search_tracks` got back from Spotify.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchResult {
    TrackIds(Vec<String>),
    /// The body could not be read as a track search result.
    Malformed(String),
}

/// Spotify API client
///
/// Cheap to share: `reqwest::Client` pools connections internally and is safe
/// to use from many tasks at once.
pub struct SpotifyClient {
    access_token: String,
    base_url: String,
    client: reqwest::Client,
}

impl SpotifyClient {
    pub fn new(access_token: String, timeout: Duration) -> Result<Self, SpotifyApiError> {
        Self::with_base_url(access_token, SPOTIFY_API_URL.to_string(), timeout)
    }

    pub fn with_base_url(
        access_token: String,
        base_url: String,
        timeout: Duration,
    ) -> Result<Self, SpotifyApiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(SpotifyApiError::FailedToSendRequest)?;
        Ok(Self {
            access_token,
            base_url,
            client,
        })
    }

    /// Get the current user's profile
    pub async fn get_current_user(&self) -> Result<SpotifyUser, SpotifyApiError> {
        let request = self.client.get(format!("{}/me", self.base_url));
        self.send_json(request).await
    }

    /// Get all playlists for the current user
    pub async fn get_user_playlists(&self) -> Result<Vec<SpotifyPlaylist>, SpotifyApiError> {
        let mut all_playlists = Vec::new();
        let mut next_url = Some(format!("{}/me/playlists?limit=50", self.base_url));

        while let Some(url) = next_url {
            let page: SpotifyPage<SpotifyPlaylist> = self.send_json(self.client.get(&url)).await?;
            all_playlists.extend(page.items);
            next_url = page.next;
        }

        Ok(all_playlists)
    }

    pub async fn create_playlist(
        &self,
        user_id: &str,
        name: &str,
    ) -> Result<SpotifyPlaylist, SpotifyApiError> {
        let request = self
            .client
            .post(format!("{}/users/{}/playlists", self.base_url, user_id))
            .json(&CreatePlaylistRequest { name, public: false });
        self.send_json(request).await
    }

    /// Search with Spotify's field filters, `track:<title> artist:<artist>`.
    pub async fn search_tracks(
        &self,
        title: &str,
        artist: &str,
    ) -> Result<SearchResult, SpotifyApiError> {
        let query = format!("track:{} artist:{}", title, artist);
        let request = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[("q", query.as_str()), ("type", "track"), ("limit", "5")]);

        let body = self
            .send(request)
            .await?
            .text()
            .await
            .map_err(SpotifyApiError::FailedToParseResponse)?;

        Ok(parse_search_body(&body))
    }

    /// One page of playlist items. Pass the previous page's `next` URL to continue.
    pub async fn get_playlist_items_page(
        &self,
        playlist_id: &str,
        next_url: Option<String>,
    ) -> Result<SpotifyPage<SpotifyPlaylistItem>, SpotifyApiError> {
        let url = next_url.unwrap_or_else(|| {
            format!(
                "{}/playlists/{}/tracks?fields=items(track(id)),next&limit=100",
                self.base_url, playlist_id
            )
        });
        self.send_json(self.client.get(&url)).await
    }

    /// Spotify accepts at most 100 URIs per call.
    pub async fn add_tracks_to_playlist(
        &self,
        playlist_id: &str,
        track_ids: &[String],
    ) -> Result<(), SpotifyApiError> {
        let body = AddTracksRequest {
            uris: track_ids
                .iter()
                .map(|id| format!("spotify:track:{}", id))
                .collect(),
        };
        let request = self
            .client
            .post(format!("{}/playlists/{}/tracks", self.base_url, playlist_id))
            .json(&body);
        self.send(request).await?;
        Ok(())
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, SpotifyApiError> {
        let response = request
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(SpotifyApiError::FailedToSendRequest)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or("Failed to get error text".to_string());
        if status == StatusCode::UNAUTHORIZED {
            return Err(SpotifyApiError::Unauthorized { reason: body });
        }
        Err(SpotifyApiError::UnexpectedStatus { status, body })
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, SpotifyApiError> {
        self.send(request)
            .await?
            .json::<T>()
            .await
            .map_err(SpotifyApiError::FailedToParseResponse)
    }
}

/// Read track IDs out of a search body, in Spotify's relevance order.
pub fn parse_search_body(body: &str) -> SearchResult {
    let response: SpotifySearchResponse = match serde_json::from_str(body) {
        Ok(response) => response,
        Err(e) => return SearchResult::Malformed(format!("invalid JSON: {}", e)),
    };

    let Some(items) = response.tracks.and_then(|tracks| tracks.items) else {
        return SearchResult::Malformed("response has no tracks.items".to_string());
    };

    SearchResult::TrackIds(
        items
            .into_iter()
            .flatten()
            .filter_map(|track| track.id)
            .collect(),
    )
}
