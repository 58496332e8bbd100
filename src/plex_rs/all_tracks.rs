use color_eyre::eyre::{OptionExt, Result, WrapErr};
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::model::Track;

/* ---------- Shared container ---------- */

/// A minimal Plex JSON envelope for list style endpoints that return `MediaContainer.Metadata`.
///
/// Notes
/// - Plex responses are wrapped in a top level `MediaContainer`.
/// - Many fields are optional or omitted depending on endpoint and server version.
/// - `metadata` defaults to an empty vec when missing.
#[derive(Debug, Clone, Deserialize)]
pub struct PlexResponse<T> {
    #[serde(rename = "MediaContainer")]
    pub media_container: PlexMediaContainer<T>,
}

/// The inner Plex MediaContainer payload.
///
/// Notes
/// - For paged requests, use `total_size` to know when to stop.
#[derive(Debug, Clone, Deserialize)]
pub struct PlexMediaContainer<T> {
    #[serde(default)]
    pub size: Option<u32>,

    #[serde(rename = "totalSize", default)]
    pub total_size: Option<u32>,

    #[serde(default)]
    pub offset: Option<u32>,

    #[serde(rename = "Metadata", default = "Vec::new")]
    pub metadata: Vec<T>,
}

/* ---------- Library sections ---------- */

/// Response type for `/library/sections`.
#[derive(Debug, Deserialize)]
pub struct PlexLibrarySectionsResponse {
    #[serde(rename = "MediaContainer")]
    pub media_container: PlexLibrarySectionsContainer,
}

/// `MediaContainer` for `/library/sections` which returns a `Directory` list.
#[derive(Debug, Deserialize)]
pub struct PlexLibrarySectionsContainer {
    #[serde(rename = "Directory", default)]
    pub directories: Vec<PlexLibrarySection>,
}

/// A Plex library section.
///
/// Notes
/// - `key` is the library section id.
/// - `section_type` is commonly `movie`, `show`, or for music libraries `artist`.
#[derive(Debug, Deserialize)]
pub struct PlexLibrarySection {
    pub key: String,
    pub title: String,
    #[serde(rename = "type")]
    pub section_type: String,
}

/// Fetch all Plex library sections.
///
/// Endpoint
/// - `GET /library/sections`
pub async fn get_library_sections(
    client: &Client,
    base_url: &Url,
    user_token: &str,
) -> Result<Vec<PlexLibrarySection>> {
    let url = base_url.join("library/sections")?;

    let res = client
        .get(url)
        .header("Accept", "application/json")
        .header("X-Plex-Token", user_token)
        .send()
        .await?
        .error_for_status()?
        .json::<PlexLibrarySectionsResponse>()
        .await
        .wrap_err("Failed to deserialize library sections")?;

    Ok(res.media_container.directories)
}

/// Convenience helper: find the first music library section id.
///
/// Notes
/// - Plex music libraries typically have `section_type == "artist"`.
pub fn find_music_section_id(sections: &[PlexLibrarySection]) -> Option<&str> {
    sections
        .iter()
        .find(|s| s.section_type == "artist")
        .map(|s| s.key.as_str())
}

/* ---------- Tracks ---------- */

/// A music track item as returned by library listings and `/library/metadata/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct PlexLibraryTrack {
    #[serde(rename = "ratingKey")]
    pub rating_key: String,

    pub title: String,

    /// Album artist.
    #[serde(rename = "grandparentTitle", default)]
    pub artist: Option<String>,

    /// Track artist, only set when it differs from the album artist.
    #[serde(rename = "originalTitle", default)]
    pub original_title: Option<String>,

    #[serde(rename = "addedAt", default)]
    pub added_at: Option<i64>,
}

impl PlexLibraryTrack {
    /// The track artist if Plex has one, otherwise the album artist.
    pub fn track_artist(&self) -> &str {
        self.original_title
            .as_deref()
            .or(self.artist.as_deref())
            .unwrap_or_default()
    }

    pub fn into_track(self) -> Track {
        let artist = self.track_artist().to_string();
        Track {
            id: Some(self.rating_key),
            title: self.title,
            artist,
            created_at: self.added_at.unwrap_or_default(),
        }
    }
}

/// Fetch one page of tracks from a music section.
///
/// Pagination
/// - Pass `start` as the offset (`X-Plex-Container-Start`).
/// - Pass `size` as the page size (`X-Plex-Container-Size`).
///
/// Endpoint
/// - `GET /library/sections/{id}/all?type=10`
pub async fn get_tracks_page(
    client: &Client,
    base_url: &Url,
    user_token: &str,
    music_section_id: &str,
    start: u32,
    size: u32,
) -> Result<PlexMediaContainer<PlexLibraryTrack>> {
    let url = base_url.join(&format!(
        "library/sections/{}/all?type=10",
        music_section_id
    ))?;

    let res = client
        .get(url)
        .header("Accept", "application/json")
        .header("X-Plex-Token", user_token)
        .header("X-Plex-Container-Start", start.to_string())
        .header("X-Plex-Container-Size", size.to_string())
        .send()
        .await?
        .error_for_status()?
        .json::<PlexResponse<PlexLibraryTrack>>()
        .await
        .wrap_err("Failed to deserialize library tracks page")?;

    Ok(res.media_container)
}

/// Fetch all tracks from a music section, handling Plex pagination.
///
/// Pagination strategy
/// - Requests are made in pages of `page_size`.
/// - Stops when we have retrieved `totalSize` tracks, or when an empty page is returned.
pub async fn get_all_tracks_paginated(
    client: &Client,
    base_url: &Url,
    user_token: &str,
    music_section_id: &str,
    page_size: u32,
) -> Result<Vec<PlexLibraryTrack>> {
    let mut start: u32 = 0;
    let mut out: Vec<PlexLibraryTrack> = Vec::new();

    loop {
        let container = get_tracks_page(
            client,
            base_url,
            user_token,
            music_section_id,
            start,
            page_size,
        )
        .await?;

        if container.metadata.is_empty() {
            break;
        }

        out.extend(container.metadata);
        start = out.len() as u32;

        if let Some(total) = container.total_size
            && start >= total
        {
            break;
        }
    }

    Ok(out)
}

/// Fetch a single track by rating key.
///
/// Endpoint
/// - `GET /library/metadata/{ratingKey}`
pub async fn get_track(
    client: &Client,
    base_url: &Url,
    user_token: &str,
    rating_key: &str,
) -> Result<PlexLibraryTrack> {
    let url = base_url.join(&format!("library/metadata/{}", rating_key))?;

    let res = client
        .get(url)
        .header("Accept", "application/json")
        .header("X-Plex-Token", user_token)
        .send()
        .await?
        .error_for_status()?
        .json::<PlexResponse<PlexLibraryTrack>>()
        .await
        .wrap_err("Failed to deserialize track metadata")?;

    res.media_container
        .metadata
        .into_iter()
        .next()
        .ok_or_eyre(format!("No metadata returned for track {}", rating_key))
}
