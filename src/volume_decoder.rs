use crate::slice_index::SliceReference;

use dicom::{
    object::{FileDicomObject, InMemDicomObject, open_file},
    pixeldata::PixelDecoder,
};
use dicom_dictionary_std::tags;
use ndarray::Array2;
use rayon::prelude::*;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, warn};

/// Why a single slice was left out of the volume.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Unable to read DICOM file: {0}")]
    Read(#[from] dicom::object::ReadError),

    #[error("Unable to decode pixel data: {0}")]
    PixelData(String),

    #[error("Unsupported sample layout: {samples_per_pixel} samples of {bits_allocated} bits")]
    UnsupportedLayout {
        samples_per_pixel: u16,
        bits_allocated: u16,
    },

    #[error("Slice is {found:?} (width, height) but the volume is {expected:?}")]
    DimensionMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },
}

/// The raw 16-bit samples of one slice, shaped (height, width).
#[derive(Clone, Debug, PartialEq)]
pub struct RawSlice {
    pub pixels: Array2<u16>,
}

impl RawSlice {
    pub fn new(pixels: Array2<u16>) -> Self {
        Self { pixels }
    }

    pub fn width(&self) -> usize {
        self.pixels.dim().1
    }

    pub fn height(&self) -> usize {
        self.pixels.dim().0
    }

    /// (width, height)
    pub fn dim(&self) -> (usize, usize) {
        (self.width(), self.height())
    }
}

/// The slices that made it into the volume, in slice order.
#[derive(Debug, Default)]
pub struct DecodedSlices {
    pub width: usize,
    pub height: usize,
    pub slices: Vec<RawSlice>,
}

impl DecodedSlices {
    pub fn depth(&self) -> usize {
        self.slices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }
}

pub struct VolumeDecoder;

impl VolumeDecoder {
    /// Decode every reference, skipping the ones that fail.
    ///
    /// The first decoded slice fixes the width and height; later slices with
    /// other dimensions are rejected.
    pub fn decode(references: &[SliceReference]) -> DecodedSlices {
        let results: Vec<(PathBuf, Result<RawSlice, DecodeError>)> = references
            .par_iter()
            .map(|reference| (reference.path.clone(), Self::decode_file(reference)))
            .collect();

        Self::collect_consistent(results)
    }

    /// Keep successful slices whose dimensions match the first one.
    pub fn collect_consistent(
        results: impl IntoIterator<Item = (PathBuf, Result<RawSlice, DecodeError>)>,
    ) -> DecodedSlices {
        let mut decoded = DecodedSlices::default();

        for (path, result) in results {
            let slice = match result {
                Ok(slice) => slice,
                Err(err) => {
                    debug!(path = %path.display(), error = %err, "skipping slice");
                    continue;
                }
            };

            if decoded.is_empty() {
                (decoded.width, decoded.height) = slice.dim();
            } else if slice.dim() != (decoded.width, decoded.height) {
                let err = DecodeError::DimensionMismatch {
                    expected: (decoded.width, decoded.height),
                    found: slice.dim(),
                };
                warn!(path = %path.display(), error = %err, "rejecting slice");
                continue;
            }
            decoded.slices.push(slice);
        }

        decoded
    }

    fn decode_file(reference: &SliceReference) -> Result<RawSlice, DecodeError> {
        let dicom_object = open_file(&reference.path)?;
        Self::decode_image(&dicom_object)
    }

    /// Decode the first frame as raw 16-bit words, without modality or VOI LUT.
    ///
    /// Signed samples are offset by 32768 so their order is kept.
    pub fn decode_image(
        dicom_object: &FileDicomObject<InMemDicomObject>,
    ) -> Result<RawSlice, DecodeError> {
        let pixel_data = dicom_object
            .decode_pixel_data()
            .map_err(|e| DecodeError::PixelData(e.to_string()))?;

        let samples_per_pixel = pixel_data.samples_per_pixel();
        let bits_allocated = pixel_data.bits_allocated();
        if samples_per_pixel != 1 || bits_allocated != 16 {
            return Err(DecodeError::UnsupportedLayout {
                samples_per_pixel,
                bits_allocated,
            });
        }

        let rows = pixel_data.rows() as usize;
        let columns = pixel_data.columns() as usize;
        let mut samples = pixel_data.data_ow();
        if samples.len() < rows * columns {
            return Err(DecodeError::PixelData(format!(
                "expected {} samples, found {}",
                rows * columns,
                samples.len()
            )));
        }
        samples.truncate(rows * columns);

        if Self::is_signed(dicom_object) {
            samples
                .iter_mut()
                .for_each(|sample| *sample = Self::offset_signed(*sample));
        }

        Array2::from_shape_vec((rows, columns), samples)
            .map(RawSlice::new)
            .map_err(|e| DecodeError::PixelData(e.to_string()))
    }

    fn is_signed(dicom_object: &FileDicomObject<InMemDicomObject>) -> bool {
        dicom_object
            .element(tags::PIXEL_REPRESENTATION)
            .ok()
            .and_then(|element| element.to_int::<u16>().ok())
            == Some(1)
    }

    /// Map a two's complement word onto 0..=65535, keeping its order.
    #[inline]
    pub fn offset_signed(word: u16) -> u16 {
        (word as i16 as i32 + 32768) as u16
    }
}
