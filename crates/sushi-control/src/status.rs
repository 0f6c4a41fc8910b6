//! `ControlStatus`: the wire-stable status every sub-controller method
//! returns (spec.md §6).

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlStatus {
    Ok = 0,
    Error = 1,
    UnsupportedOperation = 2,
    NotFound = 3,
    OutOfRange = 4,
    InvalidArguments = 5,
}

impl ControlStatus {
    pub fn is_ok(self) -> bool {
        self == ControlStatus::Ok
    }

    /// Accumulate the worst of two statuses, for batched operations (spec.md
    /// §4.G AudioRouting: "accumulating the worst status").
    pub fn worse_of(self, other: ControlStatus) -> ControlStatus {
        if self == ControlStatus::Ok {
            other
        } else {
            self
        }
    }
}

impl From<sushi_core::Error> for ControlStatus {
    fn from(err: sushi_core::Error) -> Self {
        use sushi_core::Error::*;
        match err {
            UnknownProcessor(_) | UnknownTrack(_) => ControlStatus::NotFound,
            DuplicateName(_) | InvalidConfig(_) | InvalidTempo(_) | InvalidTimeSignature { .. } => {
                ControlStatus::InvalidArguments
            }
            ProcessorStillAttached(_) | TrackNotEmpty(_) | PreTrackExists | PostTrackExists => {
                ControlStatus::InvalidArguments
            }
            LockPoisoned => ControlStatus::Error,
        }
    }
}

impl From<sushi_dispatch::Error> for ControlStatus {
    fn from(_err: sushi_dispatch::Error) -> Self {
        // The only variant today is `QueueFull`; callers surface this as a
        // plain error rather than a more specific status.
        ControlStatus::Error
    }
}

impl From<sushi_midi::ConnectionStatus> for ControlStatus {
    fn from(status: sushi_midi::ConnectionStatus) -> Self {
        use sushi_midi::ConnectionStatus::*;
        match status {
            Ok => ControlStatus::Ok,
            InvalidPort | InvalidChannel | InvalidId => ControlStatus::InvalidArguments,
            AlreadyConnected => ControlStatus::Ok,
            NotConnected => ControlStatus::NotFound,
        }
    }
}
