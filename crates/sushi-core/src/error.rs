//! Error types for sushi-core.

use thiserror::Error;

/// Error type for sushi-core operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid tempo: {0}. Must be between 20.0 and 999.0 BPM")]
    InvalidTempo(f32),

    #[error("Invalid time signature: {numerator}/{denominator}")]
    InvalidTimeSignature { numerator: u32, denominator: u32 },

    #[error("Unknown processor id: {0}")]
    UnknownProcessor(u32),

    #[error("Unknown track id: {0}")]
    UnknownTrack(u32),

    #[error("Name already in use: {0}")]
    DuplicateName(String),

    #[error("Processor {0} is still attached to a track")]
    ProcessorStillAttached(u32),

    #[error("Track {0} is not empty")]
    TrackNotEmpty(u32),

    #[error("A pre track already exists")]
    PreTrackExists,

    #[error("A post track already exists")]
    PostTrackExists,

    #[error("Lock poisoned")]
    LockPoisoned,
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
