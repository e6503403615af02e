//! Core protocol types for Gridline's wire format.
//!
//! Every type in this module travels "on the wire": it gets serialized,
//! sent to a lobby client, and deserialized on the other side. The room
//! core also uses the plain data types ([`GridState`], [`RoomListEntry`],
//! [`WinLine`]) directly, so what the core computes is exactly what the
//! client receives.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a room (one game instance).
///
/// `#[serde(transparent)]` serializes `RoomId(42)` as plain `42`, which is
/// what the lobby client puts back into a `JoinRoom` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub u64);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

/// The marker a seat writes into cells: `seat + 1`. Zero means empty.
pub type Figure = u8;

// ---------------------------------------------------------------------------
// Board data
// ---------------------------------------------------------------------------

/// The four directions a winning line can run in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    /// Left to right along one row.
    Horizontal,
    /// Top to bottom along one column.
    Vertical,
    /// Top-left to bottom-right.
    Diagonal,
    /// Top-right to bottom-left.
    AntiDiagonal,
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Horizontal => write!(f, "horizontal"),
            Self::Vertical => write!(f, "vertical"),
            Self::Diagonal => write!(f, "diagonal"),
            Self::AntiDiagonal => write!(f, "anti-diagonal"),
        }
    }
}

/// A completed line: its orientation plus the top-left corner (`row`,
/// `col`) of the square window the line lies in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinLine {
    pub orientation: Orientation,
    pub row: usize,
    pub col: usize,
}

/// A room's board as sent to a player who just joined.
///
/// Cell `(i, j)` (column `i`, row `j`) lives at `cells[j * cell_count + i]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridState {
    pub cells: Vec<Figure>,
    pub cell_count: usize,
    pub win_count: usize,
    /// Number of seats, i.e. the number of distinct figures.
    pub capacity: usize,
    pub turn: u64,
}

/// One joinable room as shown in the lobby.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomListEntry {
    pub room_id: RoomId,
    /// Cosmetic display name.
    pub name: String,
    pub win_count: usize,
    pub cell_count: usize,
    /// `"occupied/capacity"`, e.g. `"1/2"`.
    pub players: String,
}

// ---------------------------------------------------------------------------
// Requests (client → server)
// ---------------------------------------------------------------------------

/// A remote call from a lobby client.
///
/// `#[serde(tag = "type")]` produces internally tagged JSON:
///   `{ "type": "MakeMove", "i": 1, "j": 2 }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    /// "Show me the joinable rooms."
    ListRooms,

    /// "Seat me in this room."
    JoinRoom { room_id: RoomId },

    /// "Put my figure at column `i`, row `j`."
    ///
    /// Signed so that nonsense coordinates still reach the room and get
    /// a proper `CellOccupied` answer instead of a decode failure.
    MakeMove { i: i64, j: i64 },

    /// "I'm still here." Echoed back with the server clock.
    Heartbeat { client_time: u64 },
}

// ---------------------------------------------------------------------------
// Replies (server → client, answering one request)
// ---------------------------------------------------------------------------

/// Machine-readable reason a request was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The room id is not (or no longer) registered.
    RoomNotFound,
    /// Every seat is taken or the game has already started.
    RoomFull,
    /// The target cell is taken or outside the board.
    CellOccupied,
    /// Another seat is to move, or the game hasn't started.
    NotYourTurn,
    /// The caller is not seated in any room.
    NotSeated,
    /// The caller is already seated in a room.
    AlreadySeated,
    /// The frame was not a request.
    BadRequest,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::RoomNotFound => "room_not_found",
            Self::RoomFull => "room_full",
            Self::CellOccupied => "cell_occupied",
            Self::NotYourTurn => "not_your_turn",
            Self::NotSeated => "not_seated",
            Self::AlreadySeated => "already_seated",
            Self::BadRequest => "bad_request",
        };
        f.write_str(s)
    }
}

/// The answer to exactly one [`Request`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Reply {
    /// Answer to `ListRooms`.
    RoomList { rooms: Vec<RoomListEntry> },

    /// Answer to a successful `JoinRoom`.
    Joined {
        room_id: RoomId,
        seat: usize,
        state: GridState,
    },

    /// Answer to an accepted `MakeMove`. The new board arrives as a
    /// [`Push::GridUpdated`] before this reply.
    MoveAccepted,

    /// Answer to `Heartbeat`.
    HeartbeatAck { client_time: u64, server_time: u64 },

    /// The request was rejected; nothing changed on the server.
    Error { code: ErrorCode, message: String },
}

// ---------------------------------------------------------------------------
// Pushes (server → client, unsolicited)
// ---------------------------------------------------------------------------

/// A server-initiated message. No response is expected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Push {
    /// A move was accepted in the recipient's room.
    GridUpdated { cells: Vec<Figure>, figure: Figure },

    /// The recipient's game is over. `winner` is `None` for a draw.
    GameEnded {
        winner: Option<Figure>,
        line: Option<WinLine>,
    },

    /// The set of joinable rooms changed. `force` tells an in-game client
    /// to render the lobby anyway (its game just ended).
    LobbyChanged {
        rooms: Vec<RoomListEntry>,
        force: bool,
    },
}

// ---------------------------------------------------------------------------
// Payload & Envelope
// ---------------------------------------------------------------------------

/// The content of a frame.
///
/// `#[serde(tag = "type", content = "data")]` produces "adjacently tagged"
/// JSON:
///   `{ "type": "Request", "data": { "type": "ListRooms" } }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Payload {
    /// Client → server call.
    Request(Request),

    /// Server → client answer. `reply_to` is the `seq` of the request.
    Reply { reply_to: u64, reply: Reply },

    /// Server → client notification.
    Push(Push),
}

/// The top-level wire format. Every frame is one Envelope.
///
/// ```text
/// ┌──────────────────────────────────┐
/// │ seq: 42                          │  ← per-sender counter
/// │ timestamp: 15000                 │  ← ms since connection start
/// │ ┌──────────────────────────────┐ │
/// │ │ payload: Request(MakeMove)   │ │
/// │ └──────────────────────────────┘ │
/// └──────────────────────────────────┘
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Each side keeps its own counter. Replies echo the request's value
    /// in `reply_to`, not here.
    pub seq: u64,

    /// Milliseconds since the sender's connection started.
    #[serde(default)]
    pub timestamp: u64,

    pub payload: Payload,
}

// =========================================================================
// Tests
// =========================================================================
