//! Status returned by every routing mutation (spec.md §4.E "mutation contract").

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Ok,
    InvalidPort,
    InvalidChannel,
    InvalidId,
    AlreadyConnected,
    NotConnected,
}
