//! Integration tests for the Gridline server over real WebSocket clients.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use gridline::prelude::*;
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Starts a server on a random port and returns the address.
async fn start_server() -> String {
    start_server_with(TemplateCatalog::default()).await
}

async fn start_server_with(catalog: TemplateCatalog) -> String {
    let server = GridlineServerBuilder::new()
        .bind("127.0.0.1:0")
        .templates(catalog)
        .build()
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(10)).await;
    addr
}

/// A connected test client that tracks its own request counter.
struct Client {
    ws: ClientWs,
    seq: u64,
}

impl Client {
    /// Connects and consumes the lobby greeting.
    async fn connect(addr: &str) -> (Self, Vec<RoomListEntry>) {
        let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
            .await
            .expect("should connect");
        let mut client = Self { ws, seq: 0 };
        let rooms = match client.next_payload().await {
            Payload::Push(Push::LobbyChanged { rooms, force }) => {
                assert!(!force);
                rooms
            }
            other => panic!("expected lobby greeting, got {other:?}"),
        };
        (client, rooms)
    }

    async fn send_payload(&mut self, payload: Payload) -> u64 {
        self.seq += 1;
        let envelope = Envelope {
            seq: self.seq,
            timestamp: 0,
            payload,
        };
        let bytes = serde_json::to_vec(&envelope).expect("encode");
        self.ws
            .send(Message::Binary(bytes.into()))
            .await
            .expect("send");
        self.seq
    }

    async fn request(&mut self, request: Request) -> u64 {
        self.send_payload(Payload::Request(request)).await
    }

    async fn next_payload(&mut self) -> Payload {
        let msg = tokio::time::timeout(Duration::from_secs(2), self.ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("stream ended")
            .expect("recv");
        let envelope: Envelope = serde_json::from_slice(&msg.into_data()).expect("decode");
        envelope.payload
    }

    /// Reads frames until the reply to `seq`, returning it and every push
    /// seen on the way.
    async fn reply_to(&mut self, seq: u64) -> (Reply, Vec<Push>) {
        let mut pushes = Vec::new();
        loop {
            match self.next_payload().await {
                Payload::Reply { reply_to, reply } => {
                    assert_eq!(reply_to, seq);
                    return (reply, pushes);
                }
                Payload::Push(push) => pushes.push(push),
                Payload::Request(r) => panic!("server sent a request: {r:?}"),
            }
        }
    }

    async fn call(&mut self, request: Request) -> (Reply, Vec<Push>) {
        let seq = self.request(request).await;
        self.reply_to(seq).await
    }

    async fn next_push(&mut self) -> Push {
        match self.next_payload().await {
            Payload::Push(push) => push,
            other => panic!("expected a push, got {other:?}"),
        }
    }

    /// Asserts nothing arrives for a short while.
    async fn assert_quiet(&mut self) {
        let res = tokio::time::timeout(Duration::from_millis(100), self.ws.next()).await;
        assert!(res.is_err(), "unexpected frame: {res:?}");
    }
}

fn expect_error(reply: Reply, expected: ErrorCode) {
    match reply {
        Reply::Error { code, .. } => assert_eq!(code, expected),
        other => panic!("expected {expected} error, got {other:?}"),
    }
}

// =========================================================================
// Lobby
// =========================================================================

#[tokio::test]
async fn test_connect_receives_lobby_snapshot() {
    let addr = start_server().await;
    let (_client, rooms) = Client::connect(&addr).await;

    assert_eq!(rooms.len(), 3);
    let shapes: Vec<_> = rooms
        .iter()
        .map(|r| (r.cell_count, r.win_count, r.players.as_str()))
        .collect();
    assert_eq!(shapes, vec![(3, 3, "0/2"), (5, 4, "0/2"), (5, 3, "0/3")]);
}

#[tokio::test]
async fn test_list_rooms_reply() {
    let addr = start_server().await;
    let (mut client, greeting) = Client::connect(&addr).await;

    let (reply, pushes) = client.call(Request::ListRooms).await;
    assert!(pushes.is_empty());
    assert_eq!(reply, Reply::RoomList { rooms: greeting });
}

#[tokio::test]
async fn test_heartbeat_response() {
    let addr = start_server().await;
    let (mut client, _) = Client::connect(&addr).await;

    let (reply, _) = client
        .call(Request::Heartbeat { client_time: 12345 })
        .await;
    match reply {
        Reply::HeartbeatAck { client_time, .. } => assert_eq!(client_time, 12345),
        other => panic!("expected HeartbeatAck, got {other:?}"),
    }
}

#[tokio::test]
async fn test_non_request_frame_is_bad_request() {
    let addr = start_server().await;
    let (mut client, _) = Client::connect(&addr).await;

    let seq = client
        .send_payload(Payload::Push(Push::GridUpdated {
            cells: vec![],
            figure: 1,
        }))
        .await;
    let (reply, _) = client.reply_to(seq).await;
    expect_error(reply, ErrorCode::BadRequest);
}

#[tokio::test]
async fn test_garbage_frame_is_skipped() {
    let addr = start_server().await;
    let (mut client, _) = Client::connect(&addr).await;

    client
        .ws
        .send(Message::Text("not json".into()))
        .await
        .expect("send");
    // The connection survives and the next request is answered.
    let (reply, _) = client.call(Request::ListRooms).await;
    assert!(matches!(reply, Reply::RoomList { .. }));
}

// =========================================================================
// Joining
// =========================================================================

#[tokio::test]
async fn test_join_room_reply_and_lobby_broadcast() {
    let addr = start_server().await;
    let (mut alice, rooms) = Client::connect(&addr).await;
    let (mut bob, _) = Client::connect(&addr).await;
    let classic = rooms[0].room_id;

    let (reply, pushes) = alice.call(Request::JoinRoom { room_id: classic }).await;
    match reply {
        Reply::Joined {
            room_id,
            seat,
            state,
        } => {
            assert_eq!(room_id, classic);
            assert_eq!(seat, 0);
            assert_eq!(state.cells, vec![0; 9]);
            assert_eq!(state.capacity, 2);
        }
        other => panic!("expected Joined, got {other:?}"),
    }
    assert_eq!(pushes.len(), 1, "lobby change precedes the reply");

    // The idle client hears about it too, including the new spare.
    match bob.next_push().await {
        Push::LobbyChanged { rooms, force } => {
            assert!(!force);
            assert_eq!(rooms.len(), 4);
            assert_eq!(rooms[0].players, "1/2");
        }
        other => panic!("expected LobbyChanged, got {other:?}"),
    }
}

#[tokio::test]
async fn test_join_missing_room() {
    let addr = start_server().await;
    let (mut client, _) = Client::connect(&addr).await;

    let (reply, _) = client
        .call(Request::JoinRoom {
            room_id: RoomId(999),
        })
        .await;
    expect_error(reply, ErrorCode::RoomNotFound);
}

#[tokio::test]
async fn test_join_full_room() {
    let addr = start_server().await;
    let (mut a, rooms) = Client::connect(&addr).await;
    let (mut b, _) = Client::connect(&addr).await;
    let (mut c, _) = Client::connect(&addr).await;
    let room_id = rooms[1].room_id;

    a.call(Request::JoinRoom { room_id }).await;
    b.call(Request::JoinRoom { room_id }).await;

    let (reply, pushes) = c.call(Request::JoinRoom { room_id }).await;
    expect_error(reply, ErrorCode::RoomFull);
    // None of the lobby pushes c saw listed the full room.
    for push in pushes {
        if let Push::LobbyChanged { rooms, .. } = push {
            if let Some(entry) = rooms.iter().find(|r| r.room_id == room_id) {
                assert_eq!(entry.players, "1/2");
            }
        }
    }
    let (reply, _) = c.call(Request::ListRooms).await;
    match reply {
        Reply::RoomList { rooms } => assert!(rooms.iter().all(|r| r.room_id != room_id)),
        other => panic!("expected RoomList, got {other:?}"),
    }
}

#[tokio::test]
async fn test_join_twice_is_already_seated() {
    let addr = start_server().await;
    let (mut client, rooms) = Client::connect(&addr).await;

    client
        .call(Request::JoinRoom {
            room_id: rooms[0].room_id,
        })
        .await;
    let (reply, _) = client
        .call(Request::JoinRoom {
            room_id: rooms[1].room_id,
        })
        .await;
    expect_error(reply, ErrorCode::AlreadySeated);
}

// =========================================================================
// Playing
// =========================================================================

/// Two clients seated in the classic room, all lobby noise consumed.
async fn classic_game(addr: &str) -> (Client, Client) {
    let (mut x, rooms) = Client::connect(addr).await;
    let (mut o, _) = Client::connect(addr).await;
    let room_id = rooms[0].room_id;

    x.call(Request::JoinRoom { room_id }).await;
    o.call(Request::JoinRoom { room_id }).await;
    // x still has the lobby push from o's join queued.
    assert!(matches!(x.next_push().await, Push::LobbyChanged { .. }));
    (x, o)
}

#[tokio::test]
async fn test_make_move_pushes_grid_to_both_players() {
    let addr = start_server().await;
    let (mut x, mut o) = classic_game(&addr).await;

    let (reply, pushes) = x.call(Request::MakeMove { i: 1, j: 2 }).await;
    assert_eq!(reply, Reply::MoveAccepted);
    let expected = Push::GridUpdated {
        cells: vec![0, 0, 0, 0, 0, 0, 0, 1, 0],
        figure: 1,
    };
    assert_eq!(pushes, vec![expected.clone()]);
    assert_eq!(o.next_push().await, expected);
}

#[tokio::test]
async fn test_make_move_out_of_turn() {
    let addr = start_server().await;
    let (mut x, mut o) = classic_game(&addr).await;

    let (reply, _) = o.call(Request::MakeMove { i: 0, j: 0 }).await;
    expect_error(reply, ErrorCode::NotYourTurn);
    x.assert_quiet().await;
}

#[tokio::test]
async fn test_make_move_bad_cells() {
    let addr = start_server().await;
    let (mut x, mut o) = classic_game(&addr).await;

    x.call(Request::MakeMove { i: 0, j: 0 }).await;
    o.next_push().await;

    let (reply, _) = o.call(Request::MakeMove { i: 0, j: 0 }).await;
    expect_error(reply, ErrorCode::CellOccupied);
    let (reply, _) = o.call(Request::MakeMove { i: -1, j: 5 }).await;
    expect_error(reply, ErrorCode::CellOccupied);
}

#[tokio::test]
async fn test_make_move_without_room() {
    let addr = start_server().await;
    let (mut client, _) = Client::connect(&addr).await;

    let (reply, _) = client.call(Request::MakeMove { i: 0, j: 0 }).await;
    expect_error(reply, ErrorCode::NotSeated);
}

#[tokio::test]
async fn test_full_game_win_ends_with_forced_lobby() {
    let addr = start_server().await;
    let (mut x, mut o) = classic_game(&addr).await;

    for (player, (i, j)) in [(0, (0, 0)), (1, (0, 1)), (0, (1, 0)), (1, (1, 1))] {
        let (mover, other) = if player == 0 {
            (&mut x, &mut o)
        } else {
            (&mut o, &mut x)
        };
        let (reply, _) = mover.call(Request::MakeMove { i, j }).await;
        assert_eq!(reply, Reply::MoveAccepted);
        assert!(matches!(other.next_push().await, Push::GridUpdated { .. }));
    }

    let (reply, pushes) = x.call(Request::MakeMove { i: 2, j: 0 }).await;
    assert_eq!(reply, Reply::MoveAccepted);

    let line = WinLine {
        orientation: Orientation::Horizontal,
        row: 0,
        col: 0,
    };
    for pushes in [pushes, vec![o.next_push().await, o.next_push().await, o.next_push().await]] {
        assert!(matches!(pushes[0], Push::GridUpdated { figure: 1, .. }));
        assert_eq!(
            pushes[1],
            Push::GameEnded {
                winner: Some(1),
                line: Some(line),
            }
        );
        match &pushes[2] {
            Push::LobbyChanged { rooms, force } => {
                assert!(force);
                assert_eq!(rooms.len(), 3);
                assert!(rooms.iter().all(|r| r.players.starts_with("0/")));
            }
            other => panic!("expected forced LobbyChanged, got {other:?}"),
        }
    }

    // Both are back in the lobby and may join again.
    let (reply, _) = o.call(Request::ListRooms).await;
    let Reply::RoomList { rooms } = reply else {
        panic!("expected RoomList");
    };
    let (reply, _) = o
        .call(Request::JoinRoom {
            room_id: rooms[0].room_id,
        })
        .await;
    assert!(matches!(reply, Reply::Joined { seat: 0, .. }));
}

#[tokio::test]
async fn test_opponent_disconnect_forces_lobby() {
    let addr = start_server().await;
    let (mut x, o) = classic_game(&addr).await;

    drop(o);

    match x.next_push().await {
        Push::LobbyChanged { force, .. } => assert!(force),
        other => panic!("expected forced LobbyChanged, got {other:?}"),
    }
    let (reply, _) = x.call(Request::MakeMove { i: 0, j: 0 }).await;
    expect_error(reply, ErrorCode::NotSeated);
}

#[tokio::test]
async fn test_custom_template_catalog() {
    let catalog = TemplateCatalog::new(vec![Template::new("big", 7, 5, 4).unwrap()]).unwrap();
    let addr = start_server_with(catalog).await;
    let (_client, rooms) = Client::connect(&addr).await;

    assert_eq!(rooms.len(), 1);
    assert_eq!(rooms[0].cell_count, 7);
    assert_eq!(rooms[0].win_count, 5);
    assert_eq!(rooms[0].players, "0/4");
}
