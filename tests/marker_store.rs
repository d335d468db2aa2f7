use std::fs;

use deploydag::changes::{FileMarkerStore, MarkerStore, RevisionMarker};
use tempfile::TempDir;

#[test]
fn missing_marker_loads_as_none() {
    let dir = TempDir::new().unwrap();
    let store = FileMarkerStore::new(dir.path().join(".deployment_tracking"));
    assert_eq!(store.load("dev").unwrap(), None);
}

#[test]
fn save_then_load_round_trips_per_environment() {
    let dir = TempDir::new().unwrap();
    let mut store = FileMarkerStore::new(dir.path().join(".deployment_tracking"));

    store.save(&RevisionMarker::now("dev", "abc123")).unwrap();
    store.save(&RevisionMarker::now("prod", "def456")).unwrap();

    let dev = store.load("dev").unwrap().unwrap();
    assert_eq!(dev.revision, "abc123");
    assert_eq!(dev.environment, "dev");
    assert!(dev.deployed_at.is_some());
    assert_eq!(store.load("prod").unwrap().unwrap().revision, "def456");

    let text = fs::read_to_string(store.marker_path("dev")).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("abc123"));
    assert!(lines.next().unwrap().starts_with("# Last deployment: "));
    assert_eq!(lines.next(), Some("# Environment: dev"));
}

#[test]
fn save_overwrites_previous_marker_and_leaves_no_temp_files() {
    let dir = TempDir::new().unwrap();
    let tracking = dir.path().join("track");
    let mut store = FileMarkerStore::new(&tracking);

    store.save(&RevisionMarker::now("dev", "one")).unwrap();
    store.save(&RevisionMarker::now("dev", "two")).unwrap();

    assert_eq!(store.load("dev").unwrap().unwrap().revision, "two");
    let files: Vec<_> = fs::read_dir(&tracking).unwrap().collect();
    assert_eq!(files.len(), 1);
}

#[test]
fn marker_written_by_older_tooling_is_readable() {
    let dir = TempDir::new().unwrap();
    let store = FileMarkerStore::new(dir.path());
    fs::write(
        store.marker_path("uat"),
        "0123abcd\n# Last deployment: 2024-05-01T10:00:00.123456\n# Environment: uat\n",
    )
    .unwrap();

    let marker = store.load("uat").unwrap().unwrap();
    assert_eq!(marker.revision, "0123abcd");
    // Naive timestamps carry no offset and are not trusted.
    assert_eq!(marker.deployed_at, None);
}

#[test]
fn empty_marker_is_an_error() {
    let dir = TempDir::new().unwrap();
    let store = FileMarkerStore::new(dir.path());
    fs::write(store.marker_path("dev"), "\n").unwrap();

    assert!(store.load("dev").is_err());
}
