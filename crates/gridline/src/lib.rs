//! # Gridline
//!
//! Authoritative server for turn-based "N in a row" games on square grids.
//!
//! Clients connect over WebSocket, pick a room from the lobby, and play
//! until someone completes a line. The server keeps one empty room per
//! template available at all times and pushes lobby and board changes to
//! every affected client.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gridline::prelude::*;
//!
//! # async fn run() -> Result<(), GridlineError> {
//! let server = GridlineServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .templates(TemplateCatalog::default())
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::GridlineError;
pub use server::{GridlineServer, GridlineServerBuilder};

/// Everything a server binary or a test client usually needs.
pub mod prelude {
    pub use crate::{GridlineError, GridlineServer, GridlineServerBuilder};
    pub use gridline_protocol::{
        Codec, ConnectionId, Envelope, ErrorCode, Figure, GridState, JsonCodec, Orientation,
        Payload, Push, Reply, Request, RoomId, RoomListEntry, WinLine,
    };
    pub use gridline_room::{RoomError, Template, TemplateCatalog};
}
