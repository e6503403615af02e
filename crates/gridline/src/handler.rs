//! Per-connection handler: registration, request dispatch, outbound writes.
//!
//! Each accepted connection gets its own Tokio task running this handler,
//! plus a writer task. The flow is:
//!   1. Spawn the writer, register with the room manager (lobby greeting)
//!   2. Loop: receive envelopes → dispatch requests → queue the reply
//!   3. On exit, the guard runs the disconnect hook
//!
//! Replies and pushes share one outbound queue, so a client sees the
//! pushes caused by its request before the reply to it.

use std::sync::Arc;
use std::time::Instant;

use gridline_protocol::{Codec, ConnectionId, Envelope, ErrorCode, Payload, Reply, Request};
use gridline_room::{OutboundSender, RoomError};
use gridline_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::GridlineError;
use crate::server::ServerState;

/// Drop guard that unregisters a connection when the handler exits.
///
/// This ensures cleanup happens even if the handler panics. Since `Drop`
/// is synchronous, we spawn a fire-and-forget task for the async lock.
struct DisconnectGuard<C: Codec> {
    conn_id: ConnectionId,
    state: Arc<ServerState<C>>,
}

impl<C: Codec> Drop for DisconnectGuard<C> {
    fn drop(&mut self) {
        let conn_id = self.conn_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            state.rooms.lock().await.disconnect(conn_id);
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), GridlineError> {
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    let start = Instant::now();
    tracing::debug!(%conn_id, peer = %conn.peer_addr(), "handling new connection");

    let (outbound, inbox) = mpsc::unbounded_channel();
    tokio::spawn(write_loop(Arc::clone(&conn), Arc::clone(&state), inbox, start));

    state.rooms.lock().await.connect(conn_id, outbound.clone());
    let _guard = DisconnectGuard {
        conn_id,
        state: Arc::clone(&state),
    };

    read_loop(&conn, &state, conn_id, &outbound, start).await
    // _guard drops here → disconnect fires, the directory releases its
    // sender and the writer drains and exits.
}

async fn read_loop<C: Codec>(
    conn: &WebSocketConnection,
    state: &ServerState<C>,
    conn_id: ConnectionId,
    outbound: &OutboundSender,
    start: Instant,
) -> Result<(), GridlineError> {
    loop {
        let Some(data) = conn.recv().await? else {
            tracing::info!(%conn_id, "connection closed cleanly");
            return Ok(());
        };

        let envelope: Envelope = match state.codec.decode(&data) {
            Ok(env) => env,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "failed to decode envelope");
                continue;
            }
        };

        let reply = match envelope.payload {
            Payload::Request(request) => dispatch(state, conn_id, request, start).await,
            _ => {
                tracing::debug!(%conn_id, seq = envelope.seq, "ignoring non-request frame");
                Reply::Error {
                    code: ErrorCode::BadRequest,
                    message: "expected a request".into(),
                }
            }
        };

        let payload = Payload::Reply {
            reply_to: envelope.seq,
            reply,
        };
        if outbound.send(payload).is_err() {
            tracing::debug!(%conn_id, "writer gone, closing");
            return Ok(());
        }
    }
}

/// Runs one request against the room manager and builds its reply.
async fn dispatch<C: Codec>(
    state: &ServerState<C>,
    conn_id: ConnectionId,
    request: Request,
    start: Instant,
) -> Reply {
    match request {
        Request::ListRooms => {
            let rooms = state.rooms.lock().await.list_rooms();
            Reply::RoomList { rooms }
        }

        Request::JoinRoom { room_id } => {
            let result = state.rooms.lock().await.join_room(conn_id, room_id);
            match result {
                Ok((seat, grid)) => Reply::Joined {
                    room_id,
                    seat,
                    state: grid,
                },
                Err(e) => rejected(conn_id, e),
            }
        }

        Request::MakeMove { i, j } => {
            let result = state.rooms.lock().await.make_move(conn_id, i, j);
            match result {
                Ok(_) => Reply::MoveAccepted,
                Err(e) => rejected(conn_id, e),
            }
        }

        Request::Heartbeat { client_time } => Reply::HeartbeatAck {
            client_time,
            server_time: millis_since(start),
        },
    }
}

fn rejected(conn_id: ConnectionId, err: RoomError) -> Reply {
    tracing::debug!(%conn_id, error = %err, "request rejected");
    Reply::Error {
        code: err.code(),
        message: err.to_string(),
    }
}

/// Drains the outbound queue onto the socket, one envelope per payload.
async fn write_loop<C: Codec>(
    conn: Arc<WebSocketConnection>,
    state: Arc<ServerState<C>>,
    mut inbox: mpsc::UnboundedReceiver<Payload>,
    start: Instant,
) {
    let conn_id = conn.id();
    let mut seq: u64 = 1;

    while let Some(payload) = inbox.recv().await {
        let envelope = Envelope {
            seq: next_seq(&mut seq),
            timestamp: millis_since(start),
            payload,
        };
        if let Err(e) = send_envelope(&conn, &state.codec, &envelope).await {
            tracing::debug!(%conn_id, error = %e, "write failed, stopping writer");
            break;
        }
    }
}

async fn send_envelope(
    conn: &WebSocketConnection,
    codec: &impl Codec,
    envelope: &Envelope,
) -> Result<(), GridlineError> {
    let bytes = codec.encode(envelope)?;
    conn.send(&bytes).await?;
    Ok(())
}

fn millis_since(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

/// Increments and returns the next sequence number.
fn next_seq(seq: &mut u64) -> u64 {
    let current = *seq;
    *seq += 1;
    current
}
