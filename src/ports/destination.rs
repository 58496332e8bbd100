use color_eyre::eyre::Result;

use crate::model::DestinationPlaylist;

/// Most catalogs cap the number of items accepted by a single add call.
pub const MAX_TRACKS_PER_ADD: usize = 100;

/// What a single destination search produced.
///
/// Both variants lead to the same fallback in the matcher, they are only kept
/// apart so a broken response is logged differently from an honest miss.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Candidate track IDs in the catalog's own relevance order. May be empty.
    Hits(Vec<String>),
    /// The catalog answered, but not with anything we could read.
    Malformed { reason: String },
}

/// One page of a destination playlist's membership.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackIdPage {
    pub ids: Vec<String>,
    /// Opaque cursor for the next page, `None` on the last page.
    pub next: Option<String>,
}

/// Port trait wrapping the destination catalog capabilities used by the sync.
///
/// Implementations are shared across concurrent playlist and track tasks, so
/// they must be safe to call from many tasks at once.
/// Implementations live in `services::spotify::client` (production) or test fakes.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait DestinationCatalog: Send + Sync {
    /// All playlists owned by the user, used to build the name index.
    async fn list_playlists(&self) -> Result<Vec<DestinationPlaylist>>;

    async fn create_playlist(&self, name: &str) -> Result<DestinationPlaylist>;

    /// An empty hit list means "no match", it is not an error.
    async fn search_track(&self, title: &str, artist: &str) -> Result<SearchOutcome>;

    /// Fetch one page of the playlist's track IDs. `cursor` is `None` for the first page.
    async fn playlist_track_ids_page(
        &self,
        playlist_id: &str,
        cursor: Option<String>,
    ) -> Result<TrackIdPage>;

    /// `track_ids.len()` must not exceed [`MAX_TRACKS_PER_ADD`].
    async fn add_tracks(&self, playlist_id: &str, track_ids: &[String]) -> Result<()>;
}
