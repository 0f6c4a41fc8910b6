//! Helpers for building a [`SessionState`] snapshot and a save-date stamp.
//!
//! Assembling the snapshot from the live engine is `sushi-control`'s job
//! (it owns the container, transport and MIDI tables); this module only
//! supplies the glue that doesn't need engine access.

use std::time::{SystemTime, UNIX_EPOCH};

/// A save-date stamp: seconds since the Unix epoch, formatted as a string.
/// `sushi-session` has no date/time dependency of its own, matching the
/// rest of the workspace's dependency stack.
pub fn save_date_now() -> String {
    let secs = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0);
    secs.to_string()
}
