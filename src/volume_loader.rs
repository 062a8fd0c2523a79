use crate::{
    enums::SortBy,
    normalizer::IntensityRange,
    slice_index::{ScanError, SliceIndex, SliceReference},
    volume::{AssembleError, Volume, VolumeAssembler},
    volume_decoder::{DecodedSlices, VolumeDecoder},
};

use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum VolumeLoaderError {
    #[error("No valid DICOM images found")]
    NoValidImages,

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("Unable to assemble volume: {0}")]
    Assemble(#[from] AssembleError),
}

pub struct VolumeLoader;

impl VolumeLoader {
    /// Load a volume from a directory containing .dcm files
    ///
    /// # Errors
    ///
    /// Returns error if the directory can't be read or no slice decodes
    pub fn load_from_directory(
        path: impl AsRef<Path>,
        sort_by: SortBy,
    ) -> Result<Volume, VolumeLoaderError> {
        let path = path.as_ref();
        let references = SliceIndex::scan(path, sort_by)?;
        let volume = Self::load_from_references(&references)?;

        info!(
            dir = %path.display(),
            files = references.len(),
            depth = volume.depth(),
            height = volume.height(),
            width = volume.width(),
            "loaded volume"
        );
        Ok(volume)
    }

    /// Load a volume from already ordered slice references
    pub fn load_from_references(
        references: &[SliceReference],
    ) -> Result<Volume, VolumeLoaderError> {
        if references.is_empty() {
            return Err(VolumeLoaderError::NoValidImages);
        }
        Self::build_volume(VolumeDecoder::decode(references))
    }

    /// Normalize and pack decoded slices
    pub fn build_volume(decoded: DecodedSlices) -> Result<Volume, VolumeLoaderError> {
        let range = IntensityRange::from_slices(&decoded.slices)
            .ok_or(VolumeLoaderError::NoValidImages)?;
        debug!(min = range.min, max = range.max, "intensity range");

        Ok(VolumeAssembler::assemble(&decoded.slices, range)?)
    }
}
