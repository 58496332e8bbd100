use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use color_eyre::eyre::{Result, eyre};

use crate::model::{DestinationPlaylist, Playlist, PlaylistEntry, Track, TrackRef};
use crate::ports::destination::{
    DestinationCatalog, MAX_TRACKS_PER_ADD, SearchOutcome, TrackIdPage,
};

pub fn track(title: &str, artist: &str, created_at: i64) -> Track {
    Track {
        id: None,
        title: title.into(),
        artist: artist.into(),
        created_at,
    }
}

pub fn entry(track: Track, created_at: i64) -> PlaylistEntry {
    PlaylistEntry {
        track: TrackRef::Resolved(track),
        created_at,
    }
}

pub fn id_entry(id: &str, created_at: i64) -> PlaylistEntry {
    PlaylistEntry {
        track: TrackRef::Id(id.into()),
        created_at,
    }
}

pub fn playlist(name: &str, last_modified: i64, entries: Vec<PlaylistEntry>) -> Playlist {
    Playlist {
        name: name.into(),
        entries,
        last_modified,
    }
}

#[derive(Default)]
struct FakeState {
    catalog: HashMap<(String, String), String>,
    playlists: Vec<DestinationPlaylist>,
    members: HashMap<String, Vec<String>>,
    add_calls: Vec<(String, Vec<String>)>,
    failing_creates: HashSet<String>,
}

/// In-memory destination catalog that behaves like the real one across runs.
///
/// Search only answers exact (title, artist) pairs registered beforehand.
/// Membership is served `page_size` IDs at a time.
pub struct FakeDestination {
    page_size: usize,
    state: Mutex<FakeState>,
}

impl FakeDestination {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            state: Mutex::new(FakeState::default()),
        }
    }

    pub fn register_track(&self, title: &str, artist: &str, id: &str) {
        self.state
            .lock()
            .unwrap()
            .catalog
            .insert((title.into(), artist.into()), id.into());
    }

    pub fn add_playlist(&self, name: &str, track_ids: &[&str]) -> DestinationPlaylist {
        let mut state = self.state.lock().unwrap();
        let playlist = DestinationPlaylist {
            id: format!("dst-{}", state.playlists.len() + 1),
            name: name.into(),
        };
        state.playlists.push(playlist.clone());
        state.members.insert(
            playlist.id.clone(),
            track_ids.iter().map(|id| id.to_string()).collect(),
        );
        playlist
    }

    pub fn fail_create_for(&self, name: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_creates
            .insert(name.into());
    }

    pub fn playlist_tracks(&self, playlist_id: &str) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .members
            .get(playlist_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn playlist_count(&self) -> usize {
        self.state.lock().unwrap().playlists.len()
    }

    pub fn add_calls(&self) -> Vec<(String, Vec<String>)> {
        self.state.lock().unwrap().add_calls.clone()
    }
}

#[async_trait::async_trait]
impl DestinationCatalog for FakeDestination {
    async fn list_playlists(&self) -> Result<Vec<DestinationPlaylist>> {
        Ok(self.state.lock().unwrap().playlists.clone())
    }

    async fn create_playlist(&self, name: &str) -> Result<DestinationPlaylist> {
        if self.state.lock().unwrap().failing_creates.contains(name) {
            return Err(eyre!("create rejected for '{}'", name));
        }
        Ok(self.add_playlist(name, &[]))
    }

    async fn search_track(&self, title: &str, artist: &str) -> Result<SearchOutcome> {
        let state = self.state.lock().unwrap();
        let hits = state
            .catalog
            .get(&(title.to_string(), artist.to_string()))
            .cloned()
            .into_iter()
            .collect();
        Ok(SearchOutcome::Hits(hits))
    }

    async fn playlist_track_ids_page(
        &self,
        playlist_id: &str,
        cursor: Option<String>,
    ) -> Result<TrackIdPage> {
        let state = self.state.lock().unwrap();
        let members = state
            .members
            .get(playlist_id)
            .ok_or_else(|| eyre!("unknown playlist {}", playlist_id))?;
        let start: usize = match cursor {
            Some(cursor) => cursor.parse()?,
            None => 0,
        };
        let end = (start + self.page_size).min(members.len());
        let next = (end < members.len()).then(|| end.to_string());
        Ok(TrackIdPage {
            ids: members[start.min(end)..end].to_vec(),
            next,
        })
    }

    async fn add_tracks(&self, playlist_id: &str, track_ids: &[String]) -> Result<()> {
        if track_ids.len() > MAX_TRACKS_PER_ADD {
            return Err(eyre!("too many tracks in one call: {}", track_ids.len()));
        }
        let mut state = self.state.lock().unwrap();
        state
            .add_calls
            .push((playlist_id.to_string(), track_ids.to_vec()));
        state
            .members
            .entry(playlist_id.to_string())
            .or_default()
            .extend(track_ids.iter().cloned());
        Ok(())
    }
}
