use crate::volume_decoder::RawSlice;

use ndarray::{Array3, Axis, Zip};
use rayon::prelude::*;

/// Global range of the source samples of a volume.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IntensityRange {
    pub min: u16,
    pub max: u16,
}

impl IntensityRange {
    /// Range over every sample of every slice, `None` if there are no samples.
    pub fn from_slices(slices: &[RawSlice]) -> Option<Self> {
        slices
            .par_iter()
            .filter_map(|slice| {
                slice
                    .pixels
                    .iter()
                    .fold(None, |range, &sample| Some(Self::include(range, sample)))
            })
            .reduce_with(|a, b| Self {
                min: a.min.min(b.min),
                max: a.max.max(b.max),
            })
    }

    fn include(range: Option<Self>, sample: u16) -> Self {
        match range {
            Some(range) => Self {
                min: range.min.min(sample),
                max: range.max.max(sample),
            },
            None => Self {
                min: sample,
                max: sample,
            },
        }
    }

    pub fn is_flat(&self) -> bool {
        self.max <= self.min
    }

    /// Map a sample to 0..=255; `min` maps to 0 and `max` to 255.
    /// A flat range maps everything to 0.
    #[inline]
    pub fn normalize(&self, sample: u16) -> u8 {
        if self.is_flat() {
            return 0;
        }
        let offset = sample.saturating_sub(self.min).min(self.max - self.min) as f64;
        // Multiply before dividing so max lands exactly on 255
        (offset * 255.0 / (self.max - self.min) as f64) as u8
    }
}

pub struct IntensityNormalizer;

impl IntensityNormalizer {
    /// Rescale `slices` with one shared range, writing slice `i` into
    /// `volume[i, .., ..]`. Shapes must already match.
    pub fn normalize_into(volume: &mut Array3<u8>, slices: &[RawSlice], range: IntensityRange) {
        volume
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .zip(slices.par_iter())
            .for_each(|(out, slice)| {
                Zip::from(out)
                    .and(&slice.pixels)
                    .for_each(|voxel, &sample| *voxel = range.normalize(sample));
            });
    }
}
