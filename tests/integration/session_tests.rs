//! View session tests driving real folder loads.
//!
//! Tests verify:
//! - Five loads fill slots 0-3 and then replace the active slot
//! - Replaced textures are released exactly once
//! - Failed loads leave the session untouched

use dicom_viewports::session::{DEFAULT_SLICE_DEPTH, DEFAULT_ZOOM};
use dicom_viewports::{Command, Flow, ViewSession};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use super::test_utils::{FakeTexture, FakeUploader, SliceSpec, write_garbage, write_slice};

/// A folder holding a valid volume of `depth` 2x2 slices.
fn volume_folder(root: &Path, name: &str, depth: i32) -> PathBuf {
    let dir = root.join(name);
    std::fs::create_dir(&dir).unwrap();
    for key in 1..=depth {
        write_slice(
            &dir,
            &format!("{key}.dcm"),
            &SliceSpec::flat(key, 2, 2, key as u16 * 10),
        );
    }
    dir
}

fn depths(session: &ViewSession<FakeTexture>) -> Vec<Option<usize>> {
    session
        .slots()
        .iter()
        .map(|slot| slot.texture().map(|t| t.depth))
        .collect()
}

#[test]
fn test_five_loads_fill_then_replace() {
    let root = TempDir::new().unwrap();
    let uploader = FakeUploader::default();
    let mut session = ViewSession::default();

    for depth in 1..=5 {
        let folder = volume_folder(root.path(), &format!("series-{depth}"), depth);
        assert_eq!(
            session.apply(Command::LoadVolume(folder), &uploader),
            Flow::Continue
        );
    }

    assert_eq!(uploader.uploads(), 5);
    assert_eq!(session.occupied_count(), 4);
    assert_eq!(session.active_slot(), 3);
    assert_eq!(depths(&session), vec![Some(1), Some(2), Some(3), Some(5)]);
    assert_eq!(uploader.released(), vec![4]);
}

#[test]
fn test_replacement_resets_view_of_selected_slot() {
    let root = TempDir::new().unwrap();
    let uploader = FakeUploader::default();
    let mut session = ViewSession::default();
    for depth in 1..=4 {
        let folder = volume_folder(root.path(), &format!("series-{depth}"), depth);
        session.apply(Command::LoadVolume(folder), &uploader);
    }

    session.apply(Command::SelectSlot(0), &uploader);
    for _ in 0..10 {
        session.apply(Command::ZoomIn, &uploader);
        session.apply(Command::DecreaseSlice, &uploader);
    }

    let folder = volume_folder(root.path(), "replacement", 6);
    let slot = session.load_volume(&folder, &uploader).unwrap();

    assert_eq!(slot, 0);
    assert_eq!(depths(&session), vec![Some(6), Some(2), Some(3), Some(4)]);
    assert_eq!(uploader.released(), vec![1]);

    let slot = session.slot(0).unwrap();
    assert_eq!(slot.slice_depth, DEFAULT_SLICE_DEPTH);
    assert_eq!(slot.zoom_level, DEFAULT_ZOOM);
}

#[test]
fn test_failed_loads_change_nothing() {
    let root = TempDir::new().unwrap();
    let uploader = FakeUploader::default();
    let mut session = ViewSession::default();

    let good = volume_folder(root.path(), "good", 2);
    session.apply(Command::LoadVolume(good), &uploader);
    session.apply(Command::SelectSlot(2), &uploader);
    session.apply(Command::ZoomOut, &uploader);

    let empty = root.path().join("empty");
    std::fs::create_dir(&empty).unwrap();
    let corrupt = root.path().join("corrupt");
    std::fs::create_dir(&corrupt).unwrap();
    write_garbage(&corrupt, "1.dcm");
    let missing = root.path().join("missing");

    for folder in [empty, corrupt, missing] {
        assert!(session.load_volume(&folder, &uploader).is_err());
        assert_eq!(
            session.apply(Command::LoadVolume(folder), &uploader),
            Flow::Continue
        );
    }

    assert_eq!(uploader.uploads(), 1);
    assert_eq!(session.occupied_count(), 1);
    assert_eq!(session.active_slot(), 2);
    assert!((session.slot(2).unwrap().zoom_level - 0.95).abs() < 1e-6);
    assert!(uploader.released().is_empty());
}

#[test]
fn test_ending_session_releases_all_textures() {
    let root = TempDir::new().unwrap();
    let uploader = FakeUploader::default();
    let mut session = ViewSession::default();
    for depth in 1..=3 {
        let folder = volume_folder(root.path(), &format!("series-{depth}"), depth);
        session.apply(Command::LoadVolume(folder), &uploader);
    }

    assert_eq!(session.apply(Command::Quit, &uploader), Flow::Quit);
    drop(session);

    let mut released = uploader.released();
    released.sort();
    assert_eq!(released, vec![1, 2, 3]);
}
