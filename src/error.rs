//! Centralized error type for the root crate. Wraps subsystem errors so
//! `?` propagates naturally across crate boundaries (grounded on `tutti`'s
//! own `src/error.rs`).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(#[from] sushi_core::Error),

    #[error("OSC frontend: {0}")]
    Osc(#[from] sushi_osc::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
