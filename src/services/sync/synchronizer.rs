use std::collections::HashMap;
use std::sync::Arc;

use color_eyre::eyre::{Report, Result, WrapErr, eyre};
use tracing::instrument;

use crate::model::{
    DestinationPlaylist, MatchResult, Playlist, PlaylistIndex, SourceSnapshot, Track, TrackRef,
    Watermark,
};
use crate::ports::destination::{DestinationCatalog, MAX_TRACKS_PER_ADD};
use crate::ports::source::SourceCatalog;
use crate::services::matching::matcher::match_track;
use crate::services::sync::differ::tracks_to_add;
use crate::services::sync::runner::TaskRunner;

#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub watermark: Watermark,
    /// Only these playlists are synced. Empty means all of them.
    pub playlists: Vec<String>,
    pub exclude: Vec<String>,
    /// Playlists transferred at the same time.
    pub playlist_concurrency: usize,
    /// Track lookups in flight per playlist.
    pub track_concurrency: usize,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            watermark: Watermark::default(),
            playlists: Vec::new(),
            exclude: Vec::new(),
            playlist_concurrency: 4,
            track_concurrency: 8,
        }
    }
}

impl SyncOptions {
    /// Allow-list, deny-list and watermark, in that order.
    pub fn selects(&self, playlist: &Playlist) -> bool {
        (self.playlists.is_empty() || self.playlists.contains(&playlist.name))
            && !self.exclude.contains(&playlist.name)
            && self.watermark.admits(playlist.last_modified)
    }
}

/// Result of syncing one playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistSyncReport {
    pub name: String,
    pub destination_id: String,
    pub created: bool,
    /// Entries newer than the watermark.
    pub candidates: usize,
    pub matched: usize,
    /// Labels of tracks the destination search could not find.
    pub unmatched: Vec<String>,
    pub tracks_added: usize,
}

#[derive(Debug)]
pub struct PlaylistFailure {
    pub name: String,
    pub error: Report,
}

#[derive(Debug, Default)]
pub struct SyncRunReport {
    pub synced: Vec<PlaylistSyncReport>,
    pub failed: Vec<PlaylistFailure>,
}

impl SyncRunReport {
    pub fn tracks_added(&self) -> usize {
        self.synced.iter().map(|r| r.tracks_added).sum()
    }

    pub fn unmatched(&self) -> usize {
        self.synced.iter().map(|r| r.unmatched.len()).sum()
    }
}

/// Copies source playlists into the destination catalog.
///
/// Holds the catalogs and the read-only snapshots for one run. Cloning is cheap,
/// every clone shares the same catalogs.
pub struct PlaylistSynchronizer<S: ?Sized, D: ?Sized> {
    source: Arc<S>,
    destination: Arc<D>,
    snapshot: Arc<SourceSnapshot>,
    index: Arc<PlaylistIndex>,
    options: SyncOptions,
}

impl<S: ?Sized, D: ?Sized> Clone for PlaylistSynchronizer<S, D> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            destination: self.destination.clone(),
            snapshot: self.snapshot.clone(),
            index: self.index.clone(),
            options: self.options.clone(),
        }
    }
}

impl<S, D> PlaylistSynchronizer<S, D>
where
    S: SourceCatalog + ?Sized + 'static,
    D: DestinationCatalog + ?Sized + 'static,
{
    pub fn new(
        source: Arc<S>,
        destination: Arc<D>,
        snapshot: Arc<SourceSnapshot>,
        index: Arc<PlaylistIndex>,
        options: SyncOptions,
    ) -> Self {
        Self {
            source,
            destination,
            snapshot,
            index,
            options,
        }
    }

    /// Transfer every selected playlist of the snapshot.
    ///
    /// Playlists run concurrently. Source playlists that share a name are handled
    /// one after the other in the same task, so only the first of them can create
    /// the destination playlist.
    pub async fn sync_all(&self) -> SyncRunReport {
        let groups = group_by_name(
            self.snapshot
                .playlists
                .iter()
                .filter(|p| self.options.selects(p))
                .cloned(),
        );

        for group in groups.iter().filter(|g| g.len() > 1) {
            tracing::warn!(
                "Source has {} playlists named '{}', they will be merged into one destination playlist",
                group.len(),
                group[0].name
            );
        }

        tracing::info!("Transferring {} playlists", groups.len());

        let names: Vec<String> = groups.iter().map(|g| g[0].name.clone()).collect();
        let this = self.clone();
        let outcomes = TaskRunner::new(self.options.playlist_concurrency)
            .run(groups, move |group| {
                let this = this.clone();
                async move { this.sync_group(group).await }
            })
            .await;

        let mut report = SyncRunReport::default();
        for (name, outcome) in names.into_iter().zip(outcomes) {
            let results = match outcome {
                Ok(results) => results,
                Err(e) => vec![(name, Err(eyre!("Playlist task stopped unexpectedly: {}", e)))],
            };
            for (name, result) in results {
                match result {
                    Ok(playlist_report) => report.synced.push(playlist_report),
                    Err(error) => {
                        tracing::error!("Failed to sync playlist '{}': {:#}", name, error);
                        report.failed.push(PlaylistFailure { name, error });
                    }
                }
            }
        }

        tracing::info!(
            "Sync finished: {} playlists synced, {} failed, {} tracks added, {} unmatched",
            report.synced.len(),
            report.failed.len(),
            report.tracks_added(),
            report.unmatched()
        );

        report
    }

    /// Sync a single playlist against the destination index.
    pub async fn sync_playlist(&self, playlist: &Playlist) -> Result<PlaylistSyncReport> {
        let existing = self.index.find_playlist_by_name(&playlist.name).cloned();
        self.sync_playlist_into(playlist, existing).await
    }

    async fn sync_group(&self, group: Vec<Playlist>) -> Vec<(String, Result<PlaylistSyncReport>)> {
        let mut known = group
            .first()
            .and_then(|p| self.index.find_playlist_by_name(&p.name).cloned());
        let mut results = Vec::with_capacity(group.len());

        for playlist in group {
            let result = self.sync_playlist_into(&playlist, known.clone()).await;
            if let Ok(report) = &result {
                known = Some(DestinationPlaylist {
                    id: report.destination_id.clone(),
                    name: report.name.clone(),
                });
            }
            results.push((playlist.name, result));
        }

        results
    }

    #[instrument(skip_all, fields(playlist = %playlist.name))]
    async fn sync_playlist_into(
        &self,
        playlist: &Playlist,
        existing: Option<DestinationPlaylist>,
    ) -> Result<PlaylistSyncReport> {
        // Step 1: Resolve or create the destination playlist
        let created = existing.is_none();
        let target = match existing {
            Some(target) => {
                tracing::info!("Updating playlist '{}'", playlist.name);
                target
            }
            None => {
                tracing::info!("Creating playlist '{}'", playlist.name);
                self.destination
                    .create_playlist(&playlist.name)
                    .await
                    .wrap_err(format!("Failed to create playlist '{}'", playlist.name))?
            }
        };

        // Step 2: Keep entries newer than the watermark
        let entries: Vec<TrackRef> = playlist
            .entries
            .iter()
            .filter(|e| self.options.watermark.admits(e.created_at))
            .map(|e| e.track.clone())
            .collect();
        let candidates = entries.len();

        // Step 3: Match concurrently
        let results = self.match_entries(entries).await;

        let mut matched_ids = Vec::new();
        let mut unmatched = Vec::new();
        for result in results {
            match result {
                MatchResult::Matched(id) => matched_ids.push(id),
                MatchResult::Unmatched(label) => unmatched.push(label),
            }
        }
        for label in &unmatched {
            tracing::warn!("Track not found for '{}': '{}'", playlist.name, label);
        }

        // Step 4: Drop what the destination already has
        let new_ids = tracks_to_add(&*self.destination, &target.id, &matched_ids).await?;

        // Step 5: Add in chunks
        tracing::info!("Adding {} new tracks to '{}'", new_ids.len(), playlist.name);
        let mut tracks_added = 0;
        for chunk in new_ids.chunks(MAX_TRACKS_PER_ADD) {
            self.destination
                .add_tracks(&target.id, chunk)
                .await
                .wrap_err(format!(
                    "Failed to add {} tracks to '{}' after {} were added",
                    chunk.len(),
                    playlist.name,
                    tracks_added
                ))?;
            tracks_added += chunk.len();
        }

        Ok(PlaylistSyncReport {
            name: playlist.name.clone(),
            destination_id: target.id,
            created,
            candidates,
            matched: matched_ids.len(),
            unmatched,
            tracks_added,
        })
    }

    /// One result per entry, in entry order.
    async fn match_entries(&self, entries: Vec<TrackRef>) -> Vec<MatchResult> {
        let labels: Vec<String> = entries.iter().map(entry_label).collect();

        let source = self.source.clone();
        let destination = self.destination.clone();
        let snapshot = self.snapshot.clone();
        let outcomes = TaskRunner::new(self.options.track_concurrency)
            .run(entries, move |entry| {
                let source = source.clone();
                let destination = destination.clone();
                let snapshot = snapshot.clone();
                async move {
                    let label = entry_label(&entry);
                    match resolve_entry(&*source, &snapshot.library, entry).await {
                        Ok(track) => match_track(&*destination, &track).await,
                        Err(e) => {
                            tracing::error!("Could not resolve source track {}: {:#}", label, e);
                            MatchResult::Unmatched(label)
                        }
                    }
                }
            })
            .await;

        labels
            .into_iter()
            .zip(outcomes)
            .map(|(label, outcome)| match outcome {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!("Match task for '{}' stopped unexpectedly: {}", label, e);
                    MatchResult::Unmatched(label)
                }
            })
            .collect()
    }
}

fn entry_label(entry: &TrackRef) -> String {
    match entry {
        TrackRef::Resolved(track) => track.label(),
        TrackRef::Id(id) => id.clone(),
    }
}

/// Turn a playlist entry into a track with title and artist.
///
/// Bare IDs are looked up in the library snapshot first and only go to the
/// source catalog when the library does not know them.
async fn resolve_entry<S: SourceCatalog + ?Sized>(
    source: &S,
    library: &HashMap<String, Track>,
    entry: TrackRef,
) -> Result<Track> {
    match entry {
        TrackRef::Resolved(track) => Ok(track),
        TrackRef::Id(id) => match library.get(&id) {
            Some(track) => Ok(track.clone()),
            None => source.resolve_track(&id).await,
        },
    }
}

/// Group playlists by name, keeping the order in which names first appear.
fn group_by_name(playlists: impl IntoIterator<Item = Playlist>) -> Vec<Vec<Playlist>> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<Vec<Playlist>> = Vec::new();
    for playlist in playlists {
        match positions.get(&playlist.name) {
            Some(&index) => groups[index].push(playlist),
            None => {
                positions.insert(playlist.name.clone(), groups.len());
                groups.push(vec![playlist]);
            }
        }
    }
    groups
}
