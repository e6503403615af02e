//! Connected identities, their outbound channel and their current room.

use std::collections::BTreeMap;

use gridline_protocol::{ConnectionId, Payload, Push, RoomId};
use tokio::sync::mpsc;

use crate::RoomError;

/// Outbound half of a connection's write queue.
///
/// The handler owns the receiving end and drains it onto the socket.
pub type OutboundSender = mpsc::UnboundedSender<Payload>;

#[derive(Debug)]
struct Entry {
    outbound: OutboundSender,
    room: Option<RoomId>,
}

/// Every connected identity, keyed by id.
///
/// A connection is seated in at most one room at a time.
#[derive(Debug, Default)]
pub struct ConnectionDirectory {
    entries: BTreeMap<ConnectionId, Entry>,
}

impl ConnectionDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `conn` with no room.
    ///
    /// Re-registering a known identity only replaces its channel; a seated
    /// connection stays seated, so its room never holds an unreachable player.
    pub fn connect(&mut self, conn: ConnectionId, outbound: OutboundSender) {
        match self.entries.get_mut(&conn) {
            Some(entry) => entry.outbound = outbound,
            None => {
                self.entries.insert(conn, Entry { outbound, room: None });
            }
        }
    }

    /// Forgets `conn`, returning the room it was seated in.
    pub fn remove(&mut self, conn: ConnectionId) -> Option<RoomId> {
        self.entries.remove(&conn).and_then(|entry| entry.room)
    }

    pub fn is_connected(&self, conn: ConnectionId) -> bool {
        self.entries.contains_key(&conn)
    }

    pub fn room_of(&self, conn: ConnectionId) -> Option<RoomId> {
        self.entries.get(&conn).and_then(|entry| entry.room)
    }

    /// Records that `conn` now sits in `room_id`.
    pub fn seat(&mut self, conn: ConnectionId, room_id: RoomId) -> Result<(), RoomError> {
        let entry = self
            .entries
            .get_mut(&conn)
            .ok_or(RoomError::UnknownConnection(conn))?;
        if let Some(current) = entry.room {
            return Err(RoomError::AlreadySeated(conn, current));
        }
        entry.room = Some(room_id);
        Ok(())
    }

    /// Clears the room of `conn`. Unknown connections are ignored.
    pub fn unseat(&mut self, conn: ConnectionId) {
        if let Some(entry) = self.entries.get_mut(&conn) {
            entry.room = None;
        }
    }

    /// Queues `payload` for `conn`.
    ///
    /// Returns `false` if the connection is unknown or its writer has gone
    /// away; the caller treats that as a lost message, not an error.
    pub fn send(&self, conn: ConnectionId, payload: Payload) -> bool {
        let Some(entry) = self.entries.get(&conn) else {
            return false;
        };
        if entry.outbound.send(payload).is_err() {
            tracing::debug!(%conn, "outbound channel closed, dropping message");
            return false;
        }
        true
    }

    /// Queues a server push for `conn`.
    pub fn push(&self, conn: ConnectionId, push: Push) -> bool {
        self.send(conn, Payload::Push(push))
    }

    /// Connected identities in id order.
    pub fn connections(&self) -> impl Iterator<Item = ConnectionId> + '_ {
        self.entries.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
