//! Wire protocol for Gridline.
//!
//! This crate defines the "language" that lobby clients and the server
//! speak:
//!
//! - **Types** ([`Envelope`], [`Request`], [`Reply`], [`Push`], etc.):
//!   the message structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those messages
//!   are converted to/from bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong during
//!   encoding/decoding.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw frames) and the room
//! core (game state). It doesn't know about connections or rooms; it
//! only knows how to serialize and deserialize messages.
//!
//! ```text
//! Transport (bytes) → Protocol (Envelope) → Room core (RoomManager)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use gridline_transport::ConnectionId;
pub use types::{
    Envelope, ErrorCode, Figure, GridState, Orientation, Payload, Push, Reply, Request,
    RoomId, RoomListEntry, WinLine,
};
