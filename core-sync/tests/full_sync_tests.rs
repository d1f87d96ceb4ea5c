//! Integration tests for the full library sync
//!
//! Covers insertion order, idempotence, eviction, single-flight, cooperative
//! cancellation on sign-out and per-section failure isolation.

mod common;

use bridge_traits::{RemoteAlbum, RemoteArtist};
use common::{file_harness, harness, ids, TempDatabase, NOW};
use core_async::{runtime, task};
use core_library::LibraryStore;
use core_runtime::events::{CoreEvent, SyncEvent};
use core_sync::Section;
use std::sync::Arc;

#[core_async::test]
async fn test_liked_music_order_is_preserved() {
    let h = harness().await;
    h.catalog.set_liked(&["A", "B", "C"]);

    let report = h.coordinator.perform_full_sync().await.unwrap();

    let liked = h.store.liked_songs().await.unwrap();
    assert_eq!(ids(&liked), vec!["A", "B", "C"]);
    assert_eq!(
        liked.iter().map(|s| s.liked_rank).collect::<Vec<_>>(),
        vec![Some(0), Some(1), Some(2)]
    );
    assert!(liked.iter().all(|s| s.liked_at == Some(NOW)));
    assert_eq!(report.section(Section::LikedSongs).unwrap().inserted, 3);
    assert!(!h.coordinator.is_running());
}

#[core_async::test]
async fn test_second_run_writes_nothing() {
    let h = harness().await;
    h.catalog.set_liked(&["A", "B"]);
    h.catalog.set_library(&["B", "C"]);
    h.catalog.set_albums(vec![RemoteAlbum::new("MPRE1", "Album")]);
    h.catalog
        .set_artists(vec![RemoteArtist::new("UC1", "Artist")]);

    let first = h.coordinator.perform_full_sync().await.unwrap();
    assert!(first.totals().writes() > 0);
    let after_first = h.store.transactions();

    let second = h.coordinator.perform_full_sync().await.unwrap();
    assert_eq!(second.totals().writes(), 0);
    assert_eq!(second.totals().failed, 0);
    assert_eq!(h.store.transactions(), after_first);
}

#[core_async::test]
async fn test_removed_items_are_unlinked_not_deleted() {
    let h = harness().await;
    h.catalog.set_liked(&["A", "B", "C"]);
    h.catalog.set_albums(vec![
        RemoteAlbum::new("MPRE1", "One"),
        RemoteAlbum::new("MPRE2", "Two"),
    ]);
    h.coordinator.perform_full_sync().await.unwrap();

    h.catalog.set_liked(&["A", "C"]);
    h.catalog.set_albums(vec![RemoteAlbum::new("MPRE2", "Two")]);
    let report = h.coordinator.perform_full_sync().await.unwrap();

    let liked = h.store.liked_songs().await.unwrap();
    assert_eq!(ids(&liked), vec!["A", "C"]);
    assert_eq!(liked[1].liked_rank, Some(1));

    let evicted = h.store.song("B").await.unwrap().unwrap();
    assert_eq!(evicted.liked_at, None);
    assert_eq!(evicted.liked_rank, None);

    let albums = h.store.bookmarked_albums().await.unwrap();
    assert_eq!(albums.len(), 1);
    assert_eq!(albums[0].id, "MPRE2");
    assert!(h.store.album("MPRE1").await.unwrap().is_some());

    let liked_report = report.section(Section::LikedSongs).unwrap();
    assert_eq!(liked_report.unlinked, 1);
    assert_eq!(liked_report.updated, 1);
}

#[core_async::test]
async fn test_new_remote_item_is_inserted_first() {
    let h = harness().await;
    h.catalog.set_liked(&["A", "B"]);
    h.coordinator.perform_full_sync().await.unwrap();

    h.catalog.set_liked(&["N", "A", "B"]);
    h.coordinator.perform_full_sync().await.unwrap();

    let liked = h.store.liked_songs().await.unwrap();
    assert_eq!(ids(&liked), vec!["N", "A", "B"]);
    assert!(liked.iter().all(|s| s.liked_at == Some(NOW)));
}

#[core_async::test]
async fn test_concurrent_full_sync_is_single_flight() {
    let h = harness().await;
    h.catalog.set_liked(&["A"]);
    let gate = h.catalog.block_next_liked_fetch();

    let coordinator = Arc::clone(&h.coordinator);
    let first = task::spawn(async move { coordinator.perform_full_sync().await });
    gate.entered.notified().await;

    assert!(h.coordinator.is_running());
    assert!(h.coordinator.perform_full_sync().await.is_none());

    gate.release.notify_one();
    let report = first.await.unwrap();
    assert!(report.is_some());
    assert!(!h.coordinator.is_running());
    assert_eq!(h.store.liked_songs().await.unwrap().len(), 1);
}

#[core_async::test]
async fn test_sign_out_stops_in_flight_writes() {
    let h = harness().await;
    h.catalog.set_liked(&["A", "B"]);
    let gate = h.catalog.block_next_liked_fetch();

    let coordinator = Arc::clone(&h.coordinator);
    let run = task::spawn(async move { coordinator.perform_full_sync().await });
    gate.entered.notified().await;

    h.coordinator.on_signed_out();
    gate.release.notify_one();

    let report = run.await.unwrap().unwrap();
    assert!(report.section(Section::LikedSongs).unwrap().stale);
    assert!(h.store.liked_songs().await.unwrap().is_empty());
    assert!(!h.coordinator.is_running());

    // Refused while signed out, allowed again after a new sign-in.
    assert!(h.coordinator.perform_full_sync().await.is_none());
    h.coordinator.on_signed_in();
    let report = h.coordinator.perform_full_sync().await.unwrap();
    assert!(!report.is_stale());
    assert_eq!(h.store.liked_songs().await.unwrap().len(), 2);
}

#[core_async::test]
async fn test_failed_fetch_does_not_stop_other_sections() {
    let h = harness().await;
    h.catalog.set_liked(&["A"]);
    h.catalog.fail_liked(true);
    h.catalog
        .set_artists(vec![RemoteArtist::new("UC1", "Artist")]);

    let report = h.coordinator.perform_full_sync().await.unwrap();

    assert!(report
        .section(Section::LikedSongs)
        .unwrap()
        .fetch_error
        .is_some());
    assert!(h.store.liked_songs().await.unwrap().is_empty());
    assert_eq!(h.store.bookmarked_artists().await.unwrap().len(), 1);
}

#[core_async::test]
async fn test_disabled_sync_skips_without_writes() {
    let h = harness().await;
    h.catalog.set_liked(&["A"]);
    h.coordinator.set_sync_enabled(false).await.unwrap();
    let mut events = h.events.subscribe();

    assert!(h.coordinator.perform_full_sync().await.is_none());
    assert_eq!(h.store.transactions(), 0);
    assert!(matches!(
        events.recv().await.unwrap(),
        CoreEvent::Sync(SyncEvent::Skipped { .. })
    ));

    h.coordinator.set_sync_enabled(true).await.unwrap();
    assert!(h.coordinator.perform_full_sync().await.is_some());
    assert_eq!(h.store.liked_songs().await.unwrap().len(), 1);
}

#[core_async::test]
async fn test_full_sync_emits_progress_events() {
    let h = harness().await;
    h.catalog.set_liked(&["A"]);
    let mut events = h.events.subscribe();

    let report = h.coordinator.perform_full_sync().await.unwrap();

    let mut sections = Vec::new();
    loop {
        match events.recv().await.unwrap() {
            CoreEvent::Sync(SyncEvent::Started { run_id, .. }) => assert_eq!(run_id, report.run_id),
            CoreEvent::Sync(SyncEvent::SectionCompleted { section, run_id, .. }) => {
                assert_eq!(run_id.as_deref(), Some(report.run_id.as_str()));
                sections.push(section);
            }
            CoreEvent::Sync(SyncEvent::Completed { counts, .. }) => {
                assert_eq!(counts.inserted, 1);
                break;
            }
            _ => {}
        }
    }
    assert_eq!(sections.len(), 6);
    assert_eq!(sections[0], "liked_songs");
}

#[core_async::test]
async fn test_section_entry_point_runs_alone() {
    let h = harness().await;
    h.catalog.set_liked(&["A"]);
    h.catalog.set_library(&["B"]);

    let report = h.coordinator.sync_library_songs().await.unwrap();
    assert_eq!(report.inserted, 1);
    assert_eq!(h.store.library_songs().await.unwrap().len(), 1);
    assert!(h.store.liked_songs().await.unwrap().is_empty());
}

#[core_async::test]
async fn test_failed_item_write_does_not_stop_siblings() {
    let h = harness().await;
    h.catalog.set_liked(&["A", "B", "C"]);
    h.store.fail_song_writes("B");

    let report = h.coordinator.perform_full_sync().await.unwrap();

    let liked_report = report.section(Section::LikedSongs).unwrap();
    assert_eq!(liked_report.failed, 1);
    assert_eq!(liked_report.inserted, 2);
    assert!(liked_report.fetch_error.is_none());
    assert_eq!(ids(&h.store.liked_songs().await.unwrap()), vec!["A", "C"]);
    assert!(h.store.song("B").await.unwrap().is_none());
    assert!(!h.coordinator.is_running());
}

#[test]
fn test_file_database_overlapping_sections_write_every_item() {
    let runtime = runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .unwrap();

    runtime.block_on(async {
        let db = TempDatabase::new();
        let h = file_harness(&db).await;
        let keys: Vec<String> = (0..200).map(|i| format!("S{:03}", i)).collect();
        let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
        h.catalog.set_liked(&keys);
        h.catalog.set_library(&keys);

        let report = h.coordinator.perform_full_sync().await.unwrap();

        assert_eq!(report.totals().failed, 0);
        assert!(!report.is_stale());
        assert_eq!(ids(&h.store.liked_songs().await.unwrap()), keys);
        assert_eq!(h.store.library_songs().await.unwrap().len(), 200);

        let second = h.coordinator.perform_full_sync().await.unwrap();
        assert_eq!(second.totals().writes(), 0);
        assert_eq!(second.totals().failed, 0);
    });
}
