//! # DICOM viewports
//!
//! This crate loads folders of single-slice DICOM files as normalized 3D
//! volumes and keeps up to four of them on the GPU, each in its own
//! viewport with an independent slice depth and zoom.
//!
//! Loading a folder runs the ingestion pipeline:
//!  - [`SliceIndex`] lists the ".dcm" files and orders them by Instance Number
//!  - [`VolumeDecoder`] decodes the raw 16-bit samples, in parallel using
//!    rayon, skipping slices that don't decode or don't match the first
//!    slice's dimensions
//!  - [`VolumeAssembler`] allocates the voxel buffer and has
//!    [`IntensityNormalizer`] rescale every slice straight into it, with one
//!    range shared by the whole volume
//!
//! The resulting [`Volume`] is uploaded as a 3D texture and installed into a
//! [`ViewSession`], which owns the textures and applies user [`Command`]s.
//!
//! DICOM files are assumed to have the following attributes:
//!   - 16 bits allocated, a single sample per pixel, signed or unsigned
//!   - No multiframe (always the first frame is used)
//!   - Images from the same series
//!
//! # Examples
//!
//! ## Loading a folder and previewing its middle slice
//!
//! ```no_run
//! # use dicom_viewports::{SortBy, VolumeLoader};
//! let volume = VolumeLoader::load_from_directory("dicom", SortBy::InstanceNumber)
//!     .expect("should have loaded files from directory");
//! let image = volume
//!     .slice_image(0.5)
//!     .expect("should have returned image at center of volume");
//! image.save("result.png").expect("should have written png");
//! ```
//!
//! ## Driving a session
//!
//! ```no_run
//! # use dicom_viewports::{Command, Gpu, ViewSession};
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let gpu = Gpu::headless().await?;
//! let mut session = ViewSession::default();
//! session.apply(Command::LoadVolume("dicom".into()), &gpu);
//! session.apply(Command::ZoomIn, &gpu);
//! for viewport in session.viewports() {
//!     println!("slot {} at zoom {}", viewport.slot, viewport.zoom_level);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! [`SliceIndex`]: slice_index::SliceIndex
//! [`VolumeDecoder`]: volume_decoder::VolumeDecoder
//! [`IntensityNormalizer`]: normalizer::IntensityNormalizer
//! [`VolumeAssembler`]: volume::VolumeAssembler

pub mod config;
pub mod enums;
pub mod normalizer;
pub mod session;
pub mod slice_index;
pub mod texture;
pub mod volume;
pub mod volume_decoder;
pub mod volume_loader;

pub use enums::{Command, SortBy};
pub use session::{Flow, ViewSession};
pub use texture::{Gpu, TextureUploader, VolumeTexture};
pub use volume::Volume;
pub use volume_loader::{VolumeLoader, VolumeLoaderError};
