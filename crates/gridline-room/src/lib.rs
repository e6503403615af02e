//! Authoritative game state for Gridline.
//!
//! Everything here is synchronous and owned by a single [`RoomManager`];
//! the server serializes access to it.
//!
//! # Key types
//!
//! - [`Grid`]: the board and the win-line scanner
//! - [`Room`]: seats, turn order and the lifecycle state machine
//! - [`RoomPool`]: live rooms, one spare per template
//! - [`ConnectionDirectory`]: connected identities and their outbound queues
//! - [`LobbyBroadcaster`]: lobby snapshots and their fan-out
//! - [`RoomManager`]: the facade tying them together
//! - [`Template`] / [`TemplateCatalog`]: game archetypes the pool stocks

mod config;
mod directory;
mod error;
mod grid;
mod lobby;
mod manager;
mod pool;
mod room;

pub use config::{MAX_CAPACITY, MAX_CELL_COUNT, ROOM_NAMES, RoomState, Template, TemplateCatalog, TemplateId};
pub use directory::{ConnectionDirectory, OutboundSender};
pub use error::RoomError;
pub use grid::Grid;
pub use lobby::{LobbyBroadcaster, LobbySnapshot};
pub use manager::RoomManager;
pub use pool::{Reconciliation, RoomPool};
pub use room::{LeaveOutcome, MoveOutcome, MoveReport, Room, Seat};
