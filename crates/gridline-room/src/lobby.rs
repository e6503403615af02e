//! Lobby snapshots and their fan-out.

use gridline_protocol::{ConnectionId, Push, RoomListEntry};

use crate::{ConnectionDirectory, RoomPool};

/// The joinable rooms as shown to clients, ordered by room id.
pub type LobbySnapshot = Vec<RoomListEntry>;

/// Computes lobby snapshots and pushes them when they change.
#[derive(Debug, Default)]
pub struct LobbyBroadcaster {
    /// The snapshot most recently broadcast to everyone.
    last: Option<LobbySnapshot>,
}

impl LobbyBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `Open` room with a free seat.
    pub fn snapshot(pool: &RoomPool) -> LobbySnapshot {
        pool.rooms()
            .filter(|room| room.state().is_joinable() && room.occupied() < room.template().capacity)
            .map(|room| room.list_entry())
            .collect()
    }

    /// Pushes the snapshot to every connection if it differs from the
    /// last one sent. Returns whether anything was pushed.
    pub fn broadcast_to_all(&mut self, pool: &RoomPool, directory: &ConnectionDirectory) -> bool {
        let snapshot = Self::snapshot(pool);
        if self.last.as_ref() == Some(&snapshot) {
            return false;
        }

        tracing::debug!(
            rooms = snapshot.len(),
            connections = directory.len(),
            "broadcasting lobby"
        );
        for conn in directory.connections() {
            directory.push(
                conn,
                Push::LobbyChanged {
                    rooms: snapshot.clone(),
                    force: false,
                },
            );
        }
        self.last = Some(snapshot);
        true
    }

    /// Pushes the current snapshot straight to `participants`, bypassing
    /// change detection.
    pub fn broadcast_to_room(
        &self,
        pool: &RoomPool,
        directory: &ConnectionDirectory,
        participants: &[ConnectionId],
        force: bool,
    ) {
        let snapshot = Self::snapshot(pool);
        for &conn in participants {
            directory.push(
                conn,
                Push::LobbyChanged {
                    rooms: snapshot.clone(),
                    force,
                },
            );
        }
    }

    /// Sends the current snapshot to a single, newly connected client.
    pub fn greet(&self, pool: &RoomPool, directory: &ConnectionDirectory, conn: ConnectionId) {
        directory.push(
            conn,
            Push::LobbyChanged {
                rooms: Self::snapshot(pool),
                force: false,
            },
        );
    }
}
