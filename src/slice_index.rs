use crate::enums::SortBy;

use dicom::object::OpenFileOptions;
use dicom_dictionary_std::tags;
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
#[error("Unable to read directory {path}: {source}")]
pub struct ScanError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// A file in the scanned folder together with its ordering key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SliceReference {
    pub ordering_key: i32,
    pub path: PathBuf,
}

pub struct SliceIndex;

impl SliceIndex {
    /// List the ".dcm" files directly inside `dir`, ordered by `sort_by`.
    ///
    /// Files whose ordering key can't be read are kept with key 0 and left
    /// for the decoder to reject. Equal keys keep path order.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError`] if the directory itself can't be read.
    pub fn scan(dir: impl AsRef<Path>, sort_by: SortBy) -> Result<Vec<SliceReference>, ScanError> {
        let dir = dir.as_ref();
        let mut paths: Vec<_> = fs::read_dir(dir)
            .map_err(|source| ScanError {
                path: dir.to_path_buf(),
                source,
            })?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && Self::is_dicom_file(path))
            .collect();
        paths.sort();

        let mut references: Vec<_> = paths
            .into_iter()
            .map(|path| SliceReference {
                ordering_key: Self::ordering_key(&path, sort_by),
                path,
            })
            .collect();
        Self::sort_references(&mut references);

        debug!(dir = %dir.display(), count = references.len(), "scanned slice folder");
        Ok(references)
    }

    /// Stable sort by key; ties keep their current order.
    pub fn sort_references(references: &mut [SliceReference]) {
        references.sort_by_key(|reference| reference.ordering_key);
    }

    fn is_dicom_file(path: &Path) -> bool {
        path.extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("dcm"))
    }

    fn ordering_key(path: &Path, sort_by: SortBy) -> i32 {
        match sort_by {
            SortBy::InstanceNumber => Self::instance_number(path).unwrap_or_else(|| {
                debug!(path = %path.display(), "no instance number, using 0");
                0
            }),
            SortBy::None => 0,
        }
    }

    fn instance_number(path: &Path) -> Option<i32> {
        // Header only, the pixel data is read later by the decoder
        let header = OpenFileOptions::new()
            .read_until(tags::PIXEL_DATA)
            .open_file(path)
            .ok()?;
        header
            .element(tags::INSTANCE_NUMBER)
            .ok()?
            .to_int::<i32>()
            .ok()
    }
}
