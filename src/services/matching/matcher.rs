use tracing::{debug, error};

use crate::model::{MatchResult, Track};
use crate::ports::destination::{DestinationCatalog, SearchOutcome};
use crate::services::matching::variants;

/// Find the destination ID for one source track.
///
/// The literal title/artist is tried first, then every name variant. The first
/// search with at least one hit wins and its first hit is taken as-is: the
/// destination's relevance order is trusted, nothing is re-ranked here.
/// Failed searches count as misses, so this never returns an error.
pub async fn match_track<D: DestinationCatalog + ?Sized>(destination: &D, track: &Track) -> MatchResult {
    if let Some(id) = first_hit(destination, &track.title, &track.artist).await {
        return MatchResult::Matched(id);
    }

    let variants = variants::generate(&track.title, &track.artist);
    for (title, artist) in variants.combinations() {
        if title == track.title && artist == track.artist {
            continue;
        }
        if let Some(id) = first_hit(destination, title, artist).await {
            debug!(
                "Matched '{}' through variant '{} - {}'",
                track.label(),
                title,
                artist
            );
            return MatchResult::Matched(id);
        }
    }

    MatchResult::Unmatched(track.label())
}

async fn first_hit<D: DestinationCatalog + ?Sized>(
    destination: &D,
    title: &str,
    artist: &str,
) -> Option<String> {
    match destination.search_track(title, artist).await {
        Ok(SearchOutcome::Hits(ids)) => ids.into_iter().next(),
        Ok(SearchOutcome::Malformed { reason }) => {
            error!("Malformed search response for '{}', '{}': {}", title, artist, reason);
            None
        }
        Err(e) => {
            error!("Search failed for '{}', '{}': {:#}", title, artist, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::destination::MockDestinationCatalog;
    use crate::test_utils::track;
    use mockall::Sequence;
    use mockall::predicate::eq;

    #[tokio::test]
    async fn test_first_literal_result_wins() {
        let mut destination = MockDestinationCatalog::new();
        destination
            .expect_search_track()
            .with(eq("Song"), eq("Artist"))
            .times(1)
            .returning(|_, _| Ok(SearchOutcome::Hits(vec!["id1".into(), "id2".into()])));

        let result = match_track(&destination, &track("Song", "Artist", 0)).await;

        assert_eq!(result, MatchResult::Matched("id1".into()));
    }

    #[tokio::test]
    async fn test_unmatched_when_everything_is_empty() {
        let mut destination = MockDestinationCatalog::new();
        destination
            .expect_search_track()
            .returning(|_, _| Ok(SearchOutcome::Hits(vec![])));

        let result = match_track(&destination, &track("title", "artist", 0)).await;

        assert_eq!(result, MatchResult::Unmatched("title - artist".into()));
    }

    #[tokio::test]
    async fn test_unmatched_keeps_original_label() {
        let mut destination = MockDestinationCatalog::new();
        // literal + 3 variant combinations
        destination
            .expect_search_track()
            .times(4)
            .returning(|_, _| Ok(SearchOutcome::Hits(vec![])));

        let result = match_track(&destination, &track("X (feat. Y)", "Z", 0)).await;

        assert_eq!(result, MatchResult::Unmatched("X (feat. Y) - Z".into()));
    }

    #[tokio::test]
    async fn test_falls_back_to_variants_in_order() {
        let mut seq = Sequence::new();
        let mut destination = MockDestinationCatalog::new();
        destination
            .expect_search_track()
            .with(eq("X (feat. Y)"), eq("Z"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(SearchOutcome::Hits(vec![])));
        destination
            .expect_search_track()
            .with(eq("X (feat. Y)"), eq("Y"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(SearchOutcome::Hits(vec![])));
        destination
            .expect_search_track()
            .with(eq("X"), eq("Z"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(SearchOutcome::Hits(vec!["x-by-z".into()])));

        let result = match_track(&destination, &track("X (feat. Y)", "Z", 0)).await;

        assert_eq!(result, MatchResult::Matched("x-by-z".into()));
    }

    #[tokio::test]
    async fn test_malformed_and_failed_searches_fall_through() {
        let mut seq = Sequence::new();
        let mut destination = MockDestinationCatalog::new();
        destination
            .expect_search_track()
            .with(eq("Song"), eq("A & B"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| {
                Ok(SearchOutcome::Malformed {
                    reason: "missing tracks.items".into(),
                })
            });
        destination
            .expect_search_track()
            .with(eq("Song"), eq("A"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(color_eyre::eyre::eyre!("connection reset")));
        destination
            .expect_search_track()
            .with(eq("Song"), eq("B"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(SearchOutcome::Hits(vec!["b-song".into()])));

        let result = match_track(&destination, &track("Song", "A & B", 0)).await;

        assert_eq!(result, MatchResult::Matched("b-song".into()));
    }
}
