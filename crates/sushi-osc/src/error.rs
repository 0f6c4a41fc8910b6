//! Error types for sushi-osc.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to bind OSC receive socket on port {0}")]
    BindFailed(u16),

    #[error("invalid OSC send address {0}")]
    InvalidSendAddress(String),

    #[error("malformed OSC packet")]
    MalformedPacket,

    #[error("no handler registered for address {0} with type tag {1}")]
    NoHandler(String, String),
}

pub type Result<T> = std::result::Result<T, Error>;
