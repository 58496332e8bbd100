use std::collections::HashMap;

use color_eyre::eyre::Result;

use crate::model::{Playlist, SourceSnapshot, Track};

/// Port trait wrapping the source catalog capabilities used by the sync.
///
/// Implementations live in `services::plex::client` (production) or test mocks.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SourceCatalog: Send + Sync {
    /// The user's whole library keyed by source track ID.
    async fn list_all_tracks(&self) -> Result<HashMap<String, Track>>;

    async fn list_playlists(&self) -> Result<Vec<Playlist>>;

    /// Look up a track that is not part of the library snapshot.
    async fn resolve_track(&self, track_id: &str) -> Result<Track>;
}

/// Read playlists and library once so the sync never has to go back for them.
pub async fn take_snapshot<S: SourceCatalog + ?Sized>(source: &S) -> Result<SourceSnapshot> {
    tracing::info!("Retrieving source playlists");
    let playlists = source.list_playlists().await?;

    tracing::info!("Retrieving source library");
    let library = source.list_all_tracks().await?;

    tracing::info!(
        "Source snapshot has {} playlists and {} library tracks",
        playlists.len(),
        library.len()
    );

    Ok(SourceSnapshot { playlists, library })
}
