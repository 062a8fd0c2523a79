//! Command-line configuration.
//!
//! Every option can also be set through a `DV_` prefixed environment
//! variable:
//!
//! - `DV_SORT_BY` - slice ordering key (default: instance-number)
//! - `DV_SCRIPT` - file of key bindings to run instead of stdin
//! - `DV_VERBOSE` - enable debug logging

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::enums::SortBy;

/// Default depth fraction for `inspect` previews.
pub const DEFAULT_PREVIEW_DEPTH: f32 = 0.5;

/// Load DICOM slice folders as volumes and view them in four viewports.
#[derive(Parser, Debug)]
#[command(name = "dicom-viewports")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run an interactive viewing session driven by key bindings.
    View(ViewConfig),

    /// Load one folder without a GPU and report on the volume.
    Inspect(InspectConfig),
}

#[derive(Args, Debug, Clone)]
pub struct ViewConfig {
    /// Folders to load into the first slots on startup.
    pub folders: Vec<PathBuf>,

    /// Key used to order slices within a folder.
    #[arg(long, value_enum, default_value_t = SortBy::InstanceNumber, env = "DV_SORT_BY")]
    pub sort_by: SortBy,

    /// Read key bindings from this file instead of stdin.
    ///
    /// One binding per line: 1-4, w, s, j, u, `l <folder>`, q.
    #[arg(long, env = "DV_SCRIPT")]
    pub script: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(short, long, env = "DV_VERBOSE")]
    pub verbose: bool,
}

#[derive(Args, Debug, Clone)]
pub struct InspectConfig {
    /// Folder of .dcm slices.
    pub folder: PathBuf,

    /// Key used to order slices within the folder.
    #[arg(long, value_enum, default_value_t = SortBy::InstanceNumber, env = "DV_SORT_BY")]
    pub sort_by: SortBy,

    /// Depth of the preview slice, from 0.0 (first) to 1.0 (last).
    #[arg(long, default_value_t = DEFAULT_PREVIEW_DEPTH)]
    pub depth: f32,

    /// Write the preview slice to this PNG file.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(short, long, env = "DV_VERBOSE")]
    pub verbose: bool,
}

impl InspectConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.depth) {
            return Err(format!("depth must be within 0.0..=1.0, got {}", self.depth));
        }
        Ok(())
    }
}
