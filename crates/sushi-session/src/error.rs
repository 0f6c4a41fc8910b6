//! Error types for sushi-session.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("session requires {required} channels, engine has {available}")]
    InsufficientChannels { required: usize, available: usize },

    #[error("session requires {required} MIDI ports, engine has {available}")]
    InsufficientMidiPorts { required: usize, available: usize },

    #[error("restore step failed: {0}")]
    RestoreFailed(String),
}

pub type Result<T> = std::result::Result<T, Error>;
