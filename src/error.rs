//! Error types for configuration and route drawing.
//!
//! The simulation itself has no recoverable errors: rejected strokes are
//! reported back as [`DrawRejection`] and surfaced to the player as a cue.

use std::fmt;

/// Why a route stroke was discarded without touching the line
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum DrawRejection {
    /// The selected line index does not exist or is still locked
    NoLineSelected,
    /// The line is a closed loop and cannot be extended
    LineClosed,
    /// The touch began away from both free ends of an existing line
    NotAtLineEnd,
    /// A stroke point fell inside an island
    CrossesIsland,
    /// The stroke ended with fewer points than a segment needs
    TooShort,
    /// No port sits at the start of the stroke
    NoPortAtStart,
    /// No port sits at the end of the stroke
    NoPortAtEnd,
    /// Both stroke endpoints resolve to the same port
    SamePort,
    /// This line already connects the two ports
    AlreadyConnected,
}

impl fmt::Display for DrawRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrawRejection::NoLineSelected => write!(f, "no unlocked line selected"),
            DrawRejection::LineClosed => write!(f, "line is a closed loop"),
            DrawRejection::NotAtLineEnd => write!(f, "stroke must start at a free end of the line"),
            DrawRejection::CrossesIsland => write!(f, "stroke crosses an island"),
            DrawRejection::TooShort => write!(f, "stroke too short"),
            DrawRejection::NoPortAtStart => write!(f, "stroke does not start at a port"),
            DrawRejection::NoPortAtEnd => write!(f, "stroke does not end at a port"),
            DrawRejection::SamePort => write!(f, "stroke starts and ends at the same port"),
            DrawRejection::AlreadyConnected => write!(f, "ports are already connected by this line"),
        }
    }
}

impl std::error::Error for DrawRejection {}

/// Errors raised while loading a [`crate::GameConfig`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The JSON could not be parsed
    Parse(String),
    /// A value parsed but is outside its valid range
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Parse(msg) => write!(f, "config parse error: {msg}"),
            ConfigError::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}
