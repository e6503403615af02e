//! Unified error type for the Gridline server.

use gridline_protocol::ProtocolError;
use gridline_room::RoomError;
use gridline_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum GridlineError {
    /// Binding, accepting, sending or receiving failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A frame could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room operation was rejected, or the configuration is invalid.
    #[error(transparent)]
    Room(#[from] RoomError),
}
