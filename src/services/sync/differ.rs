use std::collections::HashSet;

use color_eyre::eyre::{Result, WrapErr};
use futures::{Stream, TryStreamExt, stream};

use crate::ports::destination::DestinationCatalog;

/// Every track ID currently in a destination playlist, fetched page by page on demand.
pub fn playlist_track_ids<'a, D: DestinationCatalog + ?Sized>(
    destination: &'a D,
    playlist_id: &'a str,
) -> impl Stream<Item = Result<String>> + 'a {
    // `None` state means the last page has been read.
    stream::try_unfold(Some(None::<String>), move |state| async move {
        let Some(cursor) = state else {
            return Ok::<_, color_eyre::Report>(None);
        };
        let page = destination
            .playlist_track_ids_page(playlist_id, cursor)
            .await?;
        let next_state = page.next.map(Some);
        Ok(Some((stream::iter(page.ids.into_iter().map(Ok::<String, color_eyre::Report>)), next_state)))
    })
    .try_flatten()
}

/// Desired IDs that are not in the destination playlist yet, in desired order.
///
/// Membership is read to the last page. IDs repeated in `desired` are only kept once.
pub async fn tracks_to_add<D: DestinationCatalog + ?Sized>(
    destination: &D,
    playlist_id: &str,
    desired: &[String],
) -> Result<Vec<String>> {
    if desired.is_empty() {
        return Ok(Vec::new());
    }

    let mut present: HashSet<String> = playlist_track_ids(destination, playlist_id)
        .try_collect()
        .await
        .wrap_err(format!(
            "Failed to list tracks of destination playlist {}",
            playlist_id
        ))?;

    tracing::debug!(
        "Destination playlist {} currently has {} tracks",
        playlist_id,
        present.len()
    );

    let mut new_ids = Vec::new();
    for id in desired {
        // insert() doubles as the duplicate check within `desired`.
        if present.insert(id.clone()) {
            new_ids.push(id.clone());
        }
    }

    Ok(new_ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::destination::{MockDestinationCatalog, TrackIdPage};
    use mockall::predicate::eq;
    use tokio_test::{assert_err, assert_ok};

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test]
    async fn test_drains_every_page() {
        let mut destination = MockDestinationCatalog::new();
        destination
            .expect_playlist_track_ids_page()
            .with(eq("pl"), eq(None))
            .times(1)
            .returning(|_, _| {
                Ok(TrackIdPage {
                    ids: vec!["a".into()],
                    next: Some("page-2".into()),
                })
            });
        destination
            .expect_playlist_track_ids_page()
            .with(eq("pl"), eq(Some("page-2".to_string())))
            .times(1)
            .returning(|_, _| {
                Ok(TrackIdPage {
                    ids: vec!["b".into()],
                    next: None,
                })
            });

        let result = tracks_to_add(&destination, "pl", &ids(&["a", "c"])).await.unwrap();
        assert_eq!(result, ids(&["c"]));
    }

    #[tokio::test]
    async fn test_stream_yields_ids_across_pages() {
        let mut destination = MockDestinationCatalog::new();
        destination
            .expect_playlist_track_ids_page()
            .with(eq("pl"), eq(None))
            .returning(|_, _| {
                Ok(TrackIdPage {
                    ids: vec!["a".into(), "b".into()],
                    next: Some("2".into()),
                })
            });
        destination
            .expect_playlist_track_ids_page()
            .with(eq("pl"), eq(Some("2".to_string())))
            .returning(|_, _| {
                Ok(TrackIdPage {
                    ids: vec!["c".into()],
                    next: None,
                })
            });

        let all: Vec<String> = playlist_track_ids(&destination, "pl")
            .try_collect()
            .await
            .unwrap();
        assert_eq!(all, ids(&["a", "b", "c"]));
    }

    #[tokio::test]
    async fn test_second_page_membership_is_excluded() {
        let mut destination = MockDestinationCatalog::new();
        destination
            .expect_playlist_track_ids_page()
            .with(eq("pl"), eq(None))
            .returning(|_, _| {
                Ok(TrackIdPage {
                    ids: vec!["a".into()],
                    next: Some("2".into()),
                })
            });
        destination
            .expect_playlist_track_ids_page()
            .with(eq("pl"), eq(Some("2".to_string())))
            .returning(|_, _| {
                Ok(TrackIdPage {
                    ids: vec!["b".into()],
                    next: None,
                })
            });

        let result = tracks_to_add(&destination, "pl", &ids(&["b", "c"])).await.unwrap();
        assert_eq!(result, ids(&["c"]));
    }

    #[tokio::test]
    async fn test_empty_playlist_excludes_nothing() {
        let mut destination = MockDestinationCatalog::new();
        destination
            .expect_playlist_track_ids_page()
            .times(1)
            .returning(|_, _| Ok(TrackIdPage::default()));

        let result = tracks_to_add(&destination, "new", &ids(&["x", "y", "x"]))
            .await
            .unwrap();
        assert_eq!(result, ids(&["x", "y"]));
    }

    #[tokio::test]
    async fn test_nothing_desired_skips_listing() {
        let mut destination = MockDestinationCatalog::new();
        destination.expect_playlist_track_ids_page().never();

        let result = assert_ok!(tracks_to_add(&destination, "pl", &[]).await);
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_listing_failure_propagates() {
        let mut destination = MockDestinationCatalog::new();
        destination
            .expect_playlist_track_ids_page()
            .returning(|_, _| Err(color_eyre::eyre::eyre!("503")));

        assert_err!(tracks_to_add(&destination, "pl", &ids(&["a"])).await);
    }
}
