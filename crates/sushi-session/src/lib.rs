//! Session state and the save/restore state machine (spec.md §4.J).

pub mod assemble;
pub mod error;
pub mod serializer;
pub mod state;

pub use assemble::save_date_now;
pub use error::{Error, Result};
pub use serializer::{restore_session, validate_preflight, SessionHost};
pub use state::*;
