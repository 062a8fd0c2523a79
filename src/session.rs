use crate::{
    enums::{Command, SortBy},
    texture::{TextureError, TextureUploader},
    volume_loader::{VolumeLoader, VolumeLoaderError},
};

use std::path::Path;
use thiserror::Error;
use tracing::{debug, error, info, warn};

pub const SLOT_COUNT: usize = 4;

pub const SLICE_STEP: f32 = 0.01;
pub const ZOOM_IN_FACTOR: f32 = 1.05;
pub const ZOOM_OUT_FACTOR: f32 = 0.95;
pub const MIN_ZOOM: f32 = 0.2;
pub const MAX_ZOOM: f32 = 5.0;

pub const DEFAULT_SLICE_DEPTH: f32 = 0.5;
pub const DEFAULT_ZOOM: f32 = 1.0;
pub const ZOOM_CENTER: (f32, f32) = (0.5, 0.5);

/// Screen position of each slot's quad, in normalized device coordinates.
pub const QUAD_POSITIONS: [(f32, f32); SLOT_COUNT] =
    [(-0.5, 0.5), (0.5, 0.5), (-0.5, -0.5), (0.5, -0.5)];

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Loader(#[from] VolumeLoaderError),

    #[error("Unable to upload volume: {0}")]
    Texture(#[from] TextureError),
}

/// Whether the command loop should keep going.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

#[derive(Debug)]
pub struct ViewSlot<T> {
    texture: Option<T>,
    pub slice_depth: f32,
    pub zoom_level: f32,
    pub zoom_center: (f32, f32),
}

impl<T> Default for ViewSlot<T> {
    fn default() -> Self {
        Self {
            texture: None,
            slice_depth: DEFAULT_SLICE_DEPTH,
            zoom_level: DEFAULT_ZOOM,
            zoom_center: ZOOM_CENTER,
        }
    }
}

impl<T> ViewSlot<T> {
    pub fn texture(&self) -> Option<&T> {
        self.texture.as_ref()
    }

    pub fn is_occupied(&self) -> bool {
        self.texture.is_some()
    }

    /// Install `texture`, releasing the previous one, and reset the view.
    fn install(&mut self, texture: T) {
        if let Some(previous) = self.texture.replace(texture) {
            drop(previous);
        }
        self.slice_depth = DEFAULT_SLICE_DEPTH;
        self.zoom_level = DEFAULT_ZOOM;
    }

    fn adjust_slice(&mut self, delta: f32) {
        self.slice_depth = (self.slice_depth + delta).clamp(0.0, 1.0);
    }

    fn adjust_zoom(&mut self, factor: f32) {
        self.zoom_level = (self.zoom_level * factor).clamp(MIN_ZOOM, MAX_ZOOM);
    }
}

/// What the renderer needs to draw one occupied slot.
#[derive(Debug)]
pub struct Viewport<'a, T> {
    pub slot: usize,
    pub texture: &'a T,
    pub slice_depth: f32,
    pub zoom_level: f32,
    pub zoom_center: (f32, f32),
    pub quad_position: (f32, f32),
}

/// Four independent viewports over GPU volumes.
///
/// Slots fill in index order and are never emptied; once all four hold a
/// volume, further loads replace the active one.
#[derive(Debug)]
pub struct ViewSession<T> {
    slots: [ViewSlot<T>; SLOT_COUNT],
    active_slot: usize,
    sort_by: SortBy,
}

impl<T> Default for ViewSession<T> {
    fn default() -> Self {
        Self::new(SortBy::default())
    }
}

impl<T> ViewSession<T> {
    pub fn new(sort_by: SortBy) -> Self {
        Self {
            slots: std::array::from_fn(|_| ViewSlot::default()),
            active_slot: 0,
            sort_by,
        }
    }

    pub fn active_slot(&self) -> usize {
        self.active_slot
    }

    pub fn slot(&self, index: usize) -> Option<&ViewSlot<T>> {
        self.slots.get(index)
    }

    pub fn slots(&self) -> &[ViewSlot<T>] {
        &self.slots
    }

    pub fn occupied_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_occupied()).count()
    }

    /// Apply one command. Failures are logged and never end the session.
    pub fn apply<U>(&mut self, command: Command, uploader: &U) -> Flow
    where
        U: TextureUploader<Texture = T>,
    {
        match command {
            Command::SelectSlot(index) => self.select_slot(index),
            Command::IncreaseSlice => self.active_mut().adjust_slice(SLICE_STEP),
            Command::DecreaseSlice => self.active_mut().adjust_slice(-SLICE_STEP),
            Command::ZoomIn => self.active_mut().adjust_zoom(ZOOM_IN_FACTOR),
            Command::ZoomOut => self.active_mut().adjust_zoom(ZOOM_OUT_FACTOR),
            Command::LoadVolume(path) => {
                if let Err(err) = self.load_volume(&path, uploader) {
                    error!(dir = %path.display(), error = %err, "failed to load volume");
                }
            }
            Command::Quit => return Flow::Quit,
        }
        Flow::Continue
    }

    pub fn select_slot(&mut self, index: usize) {
        if index < SLOT_COUNT {
            self.active_slot = index;
        } else {
            warn!(index, "ignoring selection of unknown slot");
        }
    }

    /// Load the folder at `path` and install it, returning the slot used.
    ///
    /// # Errors
    ///
    /// Returns error if ingestion or upload fails; the session is unchanged.
    pub fn load_volume<U>(&mut self, path: &Path, uploader: &U) -> Result<usize, LoadError>
    where
        U: TextureUploader<Texture = T>,
    {
        let volume = VolumeLoader::load_from_directory(path, self.sort_by)?;
        let texture = uploader.upload(volume)?;
        Ok(self.install(texture))
    }

    /// Put `texture` into the first empty slot, or replace the active slot
    /// once all are occupied. The chosen slot becomes active.
    pub fn install(&mut self, texture: T) -> usize {
        let index = self
            .slots
            .iter()
            .position(|slot| !slot.is_occupied())
            .unwrap_or(self.active_slot);

        if self.slots[index].is_occupied() {
            info!(slot = index, "replacing volume");
        } else {
            debug!(slot = index, "filling empty slot");
        }
        self.slots[index].install(texture);
        self.active_slot = index;
        index
    }

    /// Occupied slots in index order.
    pub fn viewports(&self) -> impl Iterator<Item = Viewport<'_, T>> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.texture.as_ref().map(|texture| Viewport {
                slot: index,
                texture,
                slice_depth: slot.slice_depth,
                zoom_level: slot.zoom_level,
                zoom_center: slot.zoom_center,
                quad_position: QUAD_POSITIONS[index],
            })
        })
    }

    fn active_mut(&mut self) -> &mut ViewSlot<T> {
        &mut self.slots[self.active_slot]
    }
}
