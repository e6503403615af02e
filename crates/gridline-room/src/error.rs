//! Error types for the room layer.
//!
//! Every variant is an expected, recoverable outcome: the call is rejected
//! and the rooms are left exactly as they were.

use gridline_protocol::{ConnectionId, ErrorCode, RoomId};

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist (never created, or already retired).
    #[error("room {0} not found")]
    RoomNotFound(RoomId),

    /// Every seat is taken, or the game is already under way.
    #[error("room {0} is full")]
    RoomFull(RoomId),

    /// The target cell already holds a figure.
    #[error("cell ({i}, {j}) is occupied")]
    CellOccupied { i: usize, j: usize },

    /// The coordinates are outside the board.
    #[error("cell ({i}, {j}) is outside the board")]
    OutOfBounds { i: i64, j: i64 },

    /// Another seat is to move, or the room hasn't filled up yet.
    #[error("not your turn")]
    NotYourTurn,

    /// The connection isn't seated (in this room, or at all).
    #[error("{0} is not seated")]
    NotSeated(ConnectionId),

    /// The connection already holds a seat.
    #[error("{0} is already seated in room {1}")]
    AlreadySeated(ConnectionId, RoomId),

    /// The connection never went through `connect`.
    #[error("unknown connection {0}")]
    UnknownConnection(ConnectionId),

    /// A template or catalog failed validation.
    #[error("invalid template: {0}")]
    InvalidTemplate(String),
}

impl RoomError {
    /// The wire code reported to the caller.
    ///
    /// Out-of-bounds coordinates share the `CellOccupied` code: for the
    /// client both mean "you can't put a figure there".
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::RoomNotFound(_) => ErrorCode::RoomNotFound,
            Self::RoomFull(_) => ErrorCode::RoomFull,
            Self::CellOccupied { .. } | Self::OutOfBounds { .. } => ErrorCode::CellOccupied,
            Self::NotYourTurn => ErrorCode::NotYourTurn,
            Self::NotSeated(_) => ErrorCode::NotSeated,
            Self::AlreadySeated(..) => ErrorCode::AlreadySeated,
            Self::UnknownConnection(_) | Self::InvalidTemplate(_) => ErrorCode::BadRequest,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_out_of_bounds_reports_cell_occupied() {
        let err = RoomError::OutOfBounds { i: -1, j: 7 };
        assert_eq!(err.code(), ErrorCode::CellOccupied);
        assert_eq!(err.to_string(), "cell (-1, 7) is outside the board");
    }

    #[test]
    fn test_code_maps_lobby_errors() {
        assert_eq!(RoomError::RoomNotFound(RoomId(1)).code(), ErrorCode::RoomNotFound);
        assert_eq!(RoomError::RoomFull(RoomId(1)).code(), ErrorCode::RoomFull);
        assert_eq!(
            RoomError::AlreadySeated(ConnectionId::new(1), RoomId(2)).code(),
            ErrorCode::AlreadySeated
        );
    }
}
