//! Error types for sushi-midi.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("malformed MIDI message")]
    MalformedMessage,
}

pub type Result<T> = std::result::Result<T, Error>;
