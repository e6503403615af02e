//! Room manager: the single owner of the pool, the directory and the lobby.
//!
//! Every operation is synchronous and runs to completion, so the server
//! wraps one `RoomManager` in a mutex and never interleaves two calls.
//! Pushes produced by a call are queued on the recipients' outbound
//! channels before the call returns.

use gridline_protocol::{ConnectionId, Figure, GridState, Push, RoomId, WinLine};

use crate::{
    ConnectionDirectory, LeaveOutcome, LobbyBroadcaster, LobbySnapshot, MoveOutcome, MoveReport,
    OutboundSender, Room, RoomError, RoomPool, Seat, TemplateCatalog,
};

/// Entry point for every room operation coming from the server layer.
#[derive(Debug)]
pub struct RoomManager {
    pool: RoomPool,
    directory: ConnectionDirectory,
    lobby: LobbyBroadcaster,
}

impl RoomManager {
    /// Creates a manager and stocks one empty room per template.
    pub fn new(catalog: TemplateCatalog) -> Self {
        let mut pool = RoomPool::new(catalog);
        pool.reconcile();
        Self {
            pool,
            directory: ConnectionDirectory::new(),
            lobby: LobbyBroadcaster::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Lifecycle hooks
    // -----------------------------------------------------------------------

    /// Registers a new connection and sends it the current lobby.
    pub fn connect(&mut self, conn: ConnectionId, outbound: OutboundSender) {
        self.directory.connect(conn, outbound);
        tracing::info!(%conn, connections = self.directory.len(), "connection registered");

        self.pool.reconcile();
        if !self.lobby.broadcast_to_all(&self.pool, &self.directory) {
            self.lobby.greet(&self.pool, &self.directory, conn);
        }
    }

    /// Removes a connection, leaving whatever room it was seated in.
    ///
    /// A running game left with a single player is abandoned; that player
    /// is sent back to the lobby with a forced push.
    pub fn disconnect(&mut self, conn: ConnectionId) {
        if !self.directory.is_connected(conn) {
            return;
        }
        let room_id = self.directory.remove(conn);
        tracing::info!(%conn, connections = self.directory.len(), "connection removed");

        if let Some(room_id) = room_id {
            self.leave(conn, room_id);
        }

        self.pool.reconcile();
        self.lobby.broadcast_to_all(&self.pool, &self.directory);
    }

    // -----------------------------------------------------------------------
    // Requests
    // -----------------------------------------------------------------------

    /// The joinable rooms, ordered by id.
    pub fn list_rooms(&self) -> LobbySnapshot {
        LobbyBroadcaster::snapshot(&self.pool)
    }

    /// Seats `conn` in `room_id` and returns its seat and the board.
    pub fn join_room(&mut self, conn: ConnectionId, room_id: RoomId) -> Result<(Seat, GridState), RoomError> {
        if !self.directory.is_connected(conn) {
            return Err(RoomError::UnknownConnection(conn));
        }
        if let Some(current) = self.directory.room_of(conn) {
            return Err(RoomError::AlreadySeated(conn, current));
        }

        let room = self
            .pool
            .get_mut(room_id)
            .ok_or(RoomError::RoomNotFound(room_id))?;
        let seat = room.join(conn)?;
        let state = room.grid_state();
        self.directory.seat(conn, room_id)?;

        self.pool.reconcile();
        self.lobby.broadcast_to_all(&self.pool, &self.directory);
        Ok((seat, state))
    }

    /// Plays the caller's figure at column `i`, row `j` of its room.
    ///
    /// Every participant receives the updated board. A win or a draw
    /// additionally sends `GameEnded` and a forced lobby push, and the room
    /// is retired.
    pub fn make_move(&mut self, conn: ConnectionId, i: i64, j: i64) -> Result<MoveReport, RoomError> {
        let room_id = self
            .directory
            .room_of(conn)
            .ok_or(RoomError::NotSeated(conn))?;
        let room = self
            .pool
            .get_mut(room_id)
            .ok_or(RoomError::RoomNotFound(room_id))?;

        let (Ok(col), Ok(row)) = (usize::try_from(i), usize::try_from(j)) else {
            return Err(RoomError::OutOfBounds { i, j });
        };
        let report = room.make_move(conn, col, row)?;

        let participants: Vec<ConnectionId> = room.participants().collect();
        let cells = room.grid().cells().to_vec();
        for &participant in &participants {
            self.directory.push(
                participant,
                Push::GridUpdated {
                    cells: cells.clone(),
                    figure: report.figure,
                },
            );
        }

        match report.outcome {
            MoveOutcome::Continue => {}
            MoveOutcome::Won(line) => self.finish(room_id, &participants, Some(report.figure), Some(line)),
            MoveOutcome::Draw => self.finish(room_id, &participants, None, None),
        }
        Ok(report)
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn room(&self, room_id: RoomId) -> Option<&Room> {
        self.pool.get(room_id)
    }

    pub fn room_of(&self, conn: ConnectionId) -> Option<RoomId> {
        self.directory.room_of(conn)
    }

    /// Live rooms in id order.
    pub fn rooms(&self) -> impl Iterator<Item = &Room> {
        self.pool.rooms()
    }

    pub fn room_count(&self) -> usize {
        self.pool.len()
    }

    pub fn connection_count(&self) -> usize {
        self.directory.len()
    }

    pub fn catalog(&self) -> &TemplateCatalog {
        self.pool.catalog()
    }

    /// Spare rooms per template, in catalog order.
    pub fn spare_counts(&self) -> Vec<usize> {
        self.pool.spare_counts()
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn finish(
        &mut self,
        room_id: RoomId,
        participants: &[ConnectionId],
        winner: Option<Figure>,
        line: Option<WinLine>,
    ) {
        tracing::info!(%room_id, ?winner, "game finished");
        debug_assert!(
            self.pool.get(room_id).is_some_and(|room| room.state().is_terminal()),
            "only a finished game is retired"
        );
        self.pool.retire(room_id);
        for &participant in participants {
            self.directory.unseat(participant);
            self.directory.push(participant, Push::GameEnded { winner, line });
        }

        self.pool.reconcile();
        self.lobby
            .broadcast_to_room(&self.pool, &self.directory, participants, true);
        self.lobby.broadcast_to_all(&self.pool, &self.directory);
    }

    fn leave(&mut self, conn: ConnectionId, room_id: RoomId) {
        let Some(room) = self.pool.get_mut(room_id) else {
            return;
        };
        match room.leave(conn) {
            Ok(LeaveOutcome::Stayed) => {}
            Ok(LeaveOutcome::Abandoned) => {
                let remaining: Vec<ConnectionId> = room.participants().collect();
                tracing::info!(%room_id, remaining = remaining.len(), "game abandoned");
                debug_assert!(room.state().is_terminal());
                self.pool.retire(room_id);
                for &participant in &remaining {
                    self.directory.unseat(participant);
                }
                self.pool.reconcile();
                self.lobby
                    .broadcast_to_room(&self.pool, &self.directory, &remaining, true);
            }
            Err(e) => {
                tracing::debug!(%conn, %room_id, error = %e, "leave failed");
            }
        }
    }
}
