use std::{path::PathBuf, str::FromStr};

use thiserror::Error;

/// Key used to order the slices of a folder.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum SortBy {
    #[default]
    InstanceNumber,
    /// Keep the (path sorted) directory order
    None,
}

/// A discrete user command applied to a [`ViewSession`](crate::session::ViewSession).
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    SelectSlot(usize),
    IncreaseSlice,
    DecreaseSlice,
    ZoomIn,
    ZoomOut,
    LoadVolume(PathBuf),
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseCommandError {
    #[error("Empty command")]
    Empty,

    #[error("Missing folder for load command")]
    MissingFolder,

    #[error("Unknown key binding: {0}")]
    Unknown(String),
}

impl FromStr for Command {
    type Err = ParseCommandError;

    /// Parse a key binding: `1`-`4` select a slot, `w`/`s` move the slice,
    /// `j`/`u` zoom, `l <folder>` loads and `q`/`esc` quits.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let input = input.trim();
        let (key, rest) = match input.split_once(char::is_whitespace) {
            Some((key, rest)) => (key, rest.trim()),
            None => (input, ""),
        };

        match key.to_ascii_lowercase().as_str() {
            "" => Err(ParseCommandError::Empty),
            "1" => Ok(Command::SelectSlot(0)),
            "2" => Ok(Command::SelectSlot(1)),
            "3" => Ok(Command::SelectSlot(2)),
            "4" => Ok(Command::SelectSlot(3)),
            "w" => Ok(Command::IncreaseSlice),
            "s" => Ok(Command::DecreaseSlice),
            "j" => Ok(Command::ZoomIn),
            "u" => Ok(Command::ZoomOut),
            "l" if rest.is_empty() => Err(ParseCommandError::MissingFolder),
            "l" => Ok(Command::LoadVolume(PathBuf::from(rest))),
            "q" | "esc" => Ok(Command::Quit),
            _ => Err(ParseCommandError::Unknown(input.to_string())),
        }
    }
}
