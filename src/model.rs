use std::collections::HashMap;
use std::fmt;

/// A track read from the source catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    /// Source-specific identifier. Absent for entries that arrived already resolved.
    pub id: Option<String>,
    pub title: String,
    pub artist: String,
    /// Epoch seconds.
    pub created_at: i64,
}

impl Track {
    /// `"<title> - <artist>"`, used when reporting unmatched tracks.
    pub fn label(&self) -> String {
        format!("{} - {}", self.title, self.artist)
    }
}

/// How a playlist entry points at its track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackRef {
    Resolved(Track),
    /// Only the source ID is known; title/artist need a library or catalog lookup.
    Id(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistEntry {
    pub track: TrackRef,
    /// When the entry was added, epoch seconds.
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playlist {
    /// Join key between the two catalogs, there is no shared playlist ID.
    pub name: String,
    pub entries: Vec<PlaylistEntry>,
    pub last_modified: i64,
}

/// Everything read from the source catalog at login, shared read-only by the sync.
#[derive(Debug, Clone, Default)]
pub struct SourceSnapshot {
    pub playlists: Vec<Playlist>,
    pub library: HashMap<String, Track>,
}

/// A playlist as known by the destination catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationPlaylist {
    pub id: String,
    pub name: String,
}

/// Name -> destination playlist mapping, built once before a run.
#[derive(Debug, Clone, Default)]
pub struct PlaylistIndex {
    by_name: HashMap<String, DestinationPlaylist>,
}

impl PlaylistIndex {
    pub fn new(playlists: impl IntoIterator<Item = DestinationPlaylist>) -> Self {
        let mut by_name = HashMap::new();
        for playlist in playlists {
            // Keep the first playlist the catalog lists for a given name.
            by_name.entry(playlist.name.clone()).or_insert(playlist);
        }
        Self { by_name }
    }

    pub fn find_playlist_by_name(&self, name: &str) -> Option<&DestinationPlaylist> {
        self.by_name.get(name)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }
}

/// The "since" threshold. Only strictly newer playlists and entries are synced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Watermark(pub i64);

impl Watermark {
    pub fn admits(&self, timestamp: i64) -> bool {
        timestamp > self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
    Matched(String),
    Unmatched(String),
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchResult::Matched(id) => write!(f, "matched {}", id),
            MatchResult::Unmatched(label) => write!(f, "unmatched '{}'", label),
        }
    }
}
