use crate::{
    normalizer::{IntensityNormalizer, IntensityRange},
    volume_decoder::RawSlice,
};

use image::{GrayImage, ImageBuffer};
use ndarray::{Array3, s};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AssembleError {
    #[error("No slices to assemble")]
    Empty,

    #[error("Slice {index} is {found:?} (height, width), expected {expected:?}")]
    InconsistentDimensions {
        index: usize,
        expected: (usize, usize),
        found: (usize, usize),
    },
}

/// A normalized 8-bit volume, stored as (depth, height, width).
#[derive(Clone, Debug, PartialEq)]
pub struct Volume {
    data: Array3<u8>,
    source_range: IntensityRange,
}

impl Volume {
    pub fn new(data: Array3<u8>, source_range: IntensityRange) -> Self {
        // Standard layout keeps `voxels` a single contiguous slice
        let data = if data.is_standard_layout() {
            data
        } else {
            data.as_standard_layout().into_owned()
        };
        Self { data, source_range }
    }

    /// Get the dimensions of the volume (depth, height, width)
    pub fn dim(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    pub fn width(&self) -> usize {
        self.data.dim().2
    }

    pub fn height(&self) -> usize {
        self.data.dim().1
    }

    pub fn depth(&self) -> usize {
        self.data.dim().0
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get a reference to the underlying data
    pub fn data(&self) -> &Array3<u8> {
        &self.data
    }

    /// Packed voxels, slice after slice, row after row.
    pub fn voxels(&self) -> &[u8] {
        self.data
            .as_slice()
            .expect("volume data is kept in standard layout")
    }

    /// Range of the source samples before normalization
    pub fn source_range(&self) -> IntensityRange {
        self.source_range
    }

    /// Index of the slice a nearest-filtering sampler hits at `depth_fraction`.
    pub fn slice_index_at(&self, depth_fraction: f32) -> Option<usize> {
        let depth = self.depth();
        if depth == 0 {
            return None;
        }
        let index = (depth_fraction.clamp(0.0, 1.0) * depth as f32) as usize;
        Some(index.min(depth - 1))
    }

    /// The axial slice at `depth_fraction` as a grayscale image.
    pub fn slice_image(&self, depth_fraction: f32) -> Option<GrayImage> {
        let index = self.slice_index_at(depth_fraction)?;
        let slice = self.data.slice(s![index, .., ..]);
        let (height, width) = slice.dim();
        let pixel_data: Vec<u8> = slice.iter().copied().collect();
        ImageBuffer::from_raw(width as u32, height as u32, pixel_data)
    }
}

pub struct VolumeAssembler;

impl VolumeAssembler {
    /// Normalize slices, in order, straight into one 8-bit volume.
    ///
    /// # Errors
    ///
    /// Returns error if there are no slices or their dimensions differ
    pub fn assemble(
        slices: &[RawSlice],
        source_range: IntensityRange,
    ) -> Result<Volume, AssembleError> {
        let first = slices.first().ok_or(AssembleError::Empty)?;
        let (height, width) = first.pixels.dim();

        if let Some((index, slice)) = slices
            .iter()
            .enumerate()
            .find(|(_, slice)| slice.pixels.dim() != (height, width))
        {
            return Err(AssembleError::InconsistentDimensions {
                index,
                expected: (height, width),
                found: slice.pixels.dim(),
            });
        }

        let mut data = Array3::<u8>::zeros((slices.len(), height, width));
        IntensityNormalizer::normalize_into(&mut data, slices, source_range);

        Ok(Volume::new(data, source_range))
    }
}
