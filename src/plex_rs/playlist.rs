use color_eyre::eyre::{Result, WrapErr};
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::model::{PlaylistEntry, Track, TrackRef};
use crate::plex_rs::all_tracks::{PlexMediaContainer, PlexResponse};

/* ---------- Playlists ---------- */

#[derive(Debug, Clone, Deserialize)]
pub struct PlexPlaylist {
    #[serde(rename = "ratingKey")]
    pub rating_key: String,

    pub title: String,

    #[serde(rename = "playlistType")]
    pub playlist_type: String,

    #[serde(default)]
    pub smart: Option<bool>,

    #[serde(rename = "leafCount", default)]
    pub leaf_count: Option<u32>,

    #[serde(rename = "updatedAt", default)]
    pub updated_at: Option<i64>,
}

pub async fn get_playlists(
    client: &Client,
    base_url: &Url,
    user_token: &str,
) -> Result<Vec<PlexPlaylist>> {
    let url = base_url.join("playlists?type=15")?;

    let res = client
        .get(url)
        .header("Accept", "application/json")
        .header("X-Plex-Token", user_token)
        .send()
        .await?
        .error_for_status()?
        .json::<PlexResponse<PlexPlaylist>>()
        .await
        .wrap_err("Failed to deserialize Plex playlists response")?;

    Ok(res.media_container.metadata)
}

pub fn is_music_playlist(p: &PlexPlaylist) -> bool {
    p.playlist_type == "audio"
}

/* ---------- Playlist items (tracks) ---------- */

#[derive(Debug, Clone, Deserialize)]
pub struct PlexPlaylistItem {
    #[serde(rename = "ratingKey")]
    pub rating_key: String,

    /// Missing for items whose media is no longer available on the server.
    #[serde(default)]
    pub title: Option<String>,

    #[serde(rename = "grandparentTitle", default)]
    pub artist: Option<String>,

    #[serde(rename = "originalTitle", default)]
    pub original_title: Option<String>,

    #[serde(rename = "addedAt", default)]
    pub added_at: Option<i64>,
}

impl PlexPlaylistItem {
    /// Items with a title and artist are used as-is, anything else is looked up by rating key.
    pub fn into_entry(self) -> PlaylistEntry {
        let created_at = self.added_at.unwrap_or_default();
        let artist = self.original_title.or(self.artist);
        let track = match (self.title, artist) {
            (Some(title), Some(artist)) => TrackRef::Resolved(Track {
                id: Some(self.rating_key),
                title,
                artist,
                created_at,
            }),
            _ => TrackRef::Id(self.rating_key),
        };
        PlaylistEntry { track, created_at }
    }
}

pub async fn get_playlist_items_page(
    client: &Client,
    base_url: &Url,
    user_token: &str,
    playlist_id: &str,
    start: u32,
    size: u32,
) -> Result<PlexMediaContainer<PlexPlaylistItem>> {
    let url = base_url.join(&format!("playlists/{}/items?type=10", playlist_id))?;

    let res = client
        .get(url)
        .header("Accept", "application/json")
        .header("X-Plex-Token", user_token)
        .header("X-Plex-Container-Start", start.to_string())
        .header("X-Plex-Container-Size", size.to_string())
        .send()
        .await?
        .error_for_status()?
        .json::<PlexResponse<PlexPlaylistItem>>()
        .await
        .wrap_err("Failed to deserialize playlist items response")?;

    Ok(res.media_container)
}

/// Fetch every item of a playlist, page by page.
pub async fn get_playlist_items(
    client: &Client,
    base_url: &Url,
    user_token: &str,
    playlist_id: &str,
    page_size: u32,
) -> Result<Vec<PlexPlaylistItem>> {
    let mut out = Vec::new();

    loop {
        let container = get_playlist_items_page(
            client,
            base_url,
            user_token,
            playlist_id,
            out.len() as u32,
            page_size,
        )
        .await?;

        if container.metadata.is_empty() {
            break;
        }
        out.extend(container.metadata);

        if let Some(total) = container.total_size
            && out.len() as u32 >= total
        {
            break;
        }
    }

    Ok(out)
}
