//! One game: seats, board, turn counter and the lifecycle state machine.
//!
//! A `Room` is plain data with synchronous methods. It never talks to
//! connections; the [`RoomManager`](crate::RoomManager) turns its results
//! into pushes and pool updates.

use gridline_protocol::{ConnectionId, Figure, GridState, RoomId, RoomListEntry, WinLine};

use crate::{Grid, RoomError, RoomState, Template, TemplateId};

/// A participant's fixed position; decides turn order and figure.
pub type Seat = usize;

/// What an accepted move led to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The game goes on.
    Continue,
    /// The mover completed a line. The room is now `Finished`.
    Won(WinLine),
    /// The board is full without a line. The room is now `Finished`.
    Draw,
}

/// Result of an accepted move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveReport {
    /// The figure that was written (`seat + 1`).
    pub figure: Figure,
    pub outcome: MoveOutcome,
}

/// What a departure did to the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// The room carries on (still open, or enough players left to play).
    Stayed,
    /// Fewer than two players remain in a running game.
    Abandoned,
}

/// A single game instance.
#[derive(Debug, Clone)]
pub struct Room {
    id: RoomId,
    name: String,
    template_id: TemplateId,
    template: Template,
    /// Indexed by seat. While `Open` the vector is compact and grows with
    /// each join; once `Playing` it has one slot per seat and a departed
    /// player leaves `None` behind so seat numbers never shift.
    seats: Vec<Option<ConnectionId>>,
    grid: Grid,
    turn: u64,
    state: RoomState,
}

impl Room {
    pub(crate) fn new(id: RoomId, name: String, template_id: TemplateId, template: Template) -> Self {
        let grid = Grid::new(template.cell_count, template.win_count);
        Self {
            id,
            name,
            template_id,
            seats: Vec::with_capacity(template.capacity),
            template,
            grid,
            turn: 0,
            state: RoomState::Open,
        }
    }

    pub fn id(&self) -> RoomId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn template_id(&self) -> TemplateId {
        self.template_id
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn state(&self) -> RoomState {
        self.state
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn turn(&self) -> u64 {
        self.turn
    }

    /// Number of seated participants.
    pub fn occupied(&self) -> usize {
        self.seats.iter().flatten().count()
    }

    /// `true` for an `Open` room nobody has joined: the pool's spare.
    pub fn is_spare(&self) -> bool {
        self.state.is_joinable() && self.occupied() == 0
    }

    /// Seated participants in seat order.
    pub fn participants(&self) -> impl Iterator<Item = ConnectionId> + '_ {
        self.seats.iter().flatten().copied()
    }

    pub fn seat_of(&self, conn: ConnectionId) -> Option<Seat> {
        self.seats.iter().position(|s| *s == Some(conn))
    }

    /// The seat whose turn it is: `turn mod capacity`.
    pub fn seat_to_move(&self) -> Seat {
        (self.turn % self.template.capacity as u64) as Seat
    }

    /// The board as sent to a joining player.
    pub fn grid_state(&self) -> GridState {
        GridState {
            cells: self.grid.cells().to_vec(),
            cell_count: self.template.cell_count,
            win_count: self.template.win_count,
            capacity: self.template.capacity,
            turn: self.turn,
        }
    }

    /// The room's public lobby line.
    pub fn list_entry(&self) -> RoomListEntry {
        RoomListEntry {
            room_id: self.id,
            name: self.name.clone(),
            win_count: self.template.win_count,
            cell_count: self.template.cell_count,
            players: format!("{}/{}", self.occupied(), self.template.capacity),
        }
    }

    /// Seats `conn` in the next free seat.
    ///
    /// Taking the last seat starts the game.
    pub fn join(&mut self, conn: ConnectionId) -> Result<Seat, RoomError> {
        if !self.state.is_joinable() || self.seats.len() >= self.template.capacity {
            return Err(RoomError::RoomFull(self.id));
        }
        if self.seat_of(conn).is_some() {
            return Err(RoomError::AlreadySeated(conn, self.id));
        }

        let seat = self.seats.len();
        self.seats.push(Some(conn));
        tracing::info!(
            room_id = %self.id,
            %conn,
            seat,
            players = self.seats.len(),
            "player joined"
        );

        if self.seats.len() == self.template.capacity {
            self.transition(RoomState::Playing);
        }
        Ok(seat)
    }

    /// Places the caller's figure at column `i`, row `j`.
    ///
    /// Checks, in order: the caller is seated, the cell is on the board and
    /// empty, the game is running and it is the caller's turn. Any failure
    /// leaves the room untouched.
    pub fn make_move(&mut self, conn: ConnectionId, i: usize, j: usize) -> Result<MoveReport, RoomError> {
        let seat = self.seat_of(conn).ok_or(RoomError::NotSeated(conn))?;

        match self.grid.get(i, j) {
            None => {
                return Err(RoomError::OutOfBounds {
                    i: i as i64,
                    j: j as i64,
                });
            }
            Some(0) => {}
            Some(_) => return Err(RoomError::CellOccupied { i, j }),
        }

        if !self.state.is_active() || self.seat_to_move() != seat {
            return Err(RoomError::NotYourTurn);
        }

        let figure = (seat + 1) as Figure;
        self.grid.set(i, j, figure)?;
        self.advance_turn();

        let outcome = if let Some(line) = self.grid.scan_for_win(figure) {
            tracing::info!(
                room_id = %self.id,
                figure,
                orientation = %line.orientation,
                row = line.row,
                col = line.col,
                "game won"
            );
            self.transition(RoomState::Finished);
            MoveOutcome::Won(line)
        } else if self.grid.is_full() {
            tracing::info!(room_id = %self.id, "game drawn");
            self.transition(RoomState::Finished);
            MoveOutcome::Draw
        } else {
            MoveOutcome::Continue
        };

        Ok(MoveReport { figure, outcome })
    }

    /// Removes `conn` from its seat.
    ///
    /// An open room simply closes the gap and is never retired here, even
    /// when it empties: it becomes a spare, and pool reconciliation prunes
    /// it if its template already has one. A running game keeps the seat
    /// index reserved and is abandoned once fewer than two players remain.
    pub fn leave(&mut self, conn: ConnectionId) -> Result<LeaveOutcome, RoomError> {
        let seat = self.seat_of(conn).ok_or(RoomError::NotSeated(conn))?;

        let outcome = match self.state {
            RoomState::Open => {
                self.seats.remove(seat);
                LeaveOutcome::Stayed
            }
            RoomState::Playing => {
                self.seats[seat] = None;
                if self.occupied() < 2 {
                    self.transition(RoomState::Abandoned);
                    LeaveOutcome::Abandoned
                } else {
                    if self.seats[self.seat_to_move()].is_none() {
                        self.advance_turn();
                    }
                    LeaveOutcome::Stayed
                }
            }
            RoomState::Finished | RoomState::Abandoned => {
                self.seats[seat] = None;
                LeaveOutcome::Stayed
            }
        };

        tracing::info!(
            room_id = %self.id,
            %conn,
            seat,
            players = self.occupied(),
            "player left"
        );
        Ok(outcome)
    }

    /// Bumps the turn counter past the current seat and any vacated ones.
    fn advance_turn(&mut self) {
        self.turn += 1;
        if self.seats.len() < self.template.capacity {
            return;
        }
        for _ in 1..self.template.capacity {
            if self.seats[self.seat_to_move()].is_some() {
                break;
            }
            self.turn += 1;
        }
    }

    fn transition(&mut self, next: RoomState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid room transition {} -> {}",
            self.state,
            next
        );
        tracing::debug!(room_id = %self.id, from = %self.state, to = %next, "room state changed");
        self.state = next;
    }
}
