//! Error types for sushi-dispatch.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("event in-queue is full")]
    QueueFull,

    #[error("poster id {0:?} is already registered")]
    PosterAlreadyRegistered(crate::event::PosterId),
}

pub type Result<T> = std::result::Result<T, Error>;
