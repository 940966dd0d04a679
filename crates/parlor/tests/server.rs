//! End-to-end tests: real WebSocket connections against a running
//! server, speaking the JSON frame protocol.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parlor::prelude::*;
use tokio_tungstenite::tungstenite::Message;

type Ws = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

const TTT: GameKind = GameKind::TicTacToe;

// =========================================================================
// Harness
// =========================================================================

async fn start() -> String {
    let server = ParlorServerBuilder::new()
        .bind("127.0.0.1:0")
        .build(MemoryStore::new(), NoopStats)
        .await
        .unwrap();
    let addr = server.local_addr().unwrap().to_string();
    tokio::spawn(async move {
        let _ = server.run().await;
    });
    tokio::time::sleep(Duration::from_millis(10)).await;
    addr
}

async fn ws(addr: &str) -> Ws {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .unwrap();
    ws
}

async fn send_request(ws: &mut Ws, id: u64, request: Request) {
    let frame = RequestFrame { id, request };
    let bytes = serde_json::to_vec(&frame).unwrap();
    ws.send(Message::Binary(bytes.into())).await.unwrap();
}

async fn recv_reply(ws: &mut Ws) -> ReplyFrame {
    let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
        .await
        .expect("timeout waiting for reply")
        .unwrap()
        .unwrap();
    serde_json::from_slice(&msg.into_data()).unwrap()
}

/// Sends a request and waits for its correlated reply.
async fn round_trip(ws: &mut Ws, id: u64, request: Request) -> Reply {
    send_request(ws, id, request).await;
    let frame = recv_reply(ws).await;
    assert_eq!(frame.id, id, "reply must echo the request id");
    frame.reply
}

fn uid(s: &str) -> UserId {
    UserId::from(s)
}

fn cell(n: usize) -> MoveInput {
    MoveInput(serde_json::json!({ "cell": n }))
}

fn request_match(user: &str) -> Request {
    Request::RequestMatch {
        game: TTT,
        user_id: uid(user),
        display_name: user.to_uppercase(),
    }
}

fn submit(user: &str, room: &RoomId, n: usize) -> Request {
    Request::SubmitMove {
        game: TTT,
        room_id: room.clone(),
        user_id: uid(user),
        input: cell(n),
    }
}

/// Two connected clients with a formed match. Returns (p1, p2, room);
/// p1 queued first and moves first.
async fn setup_match(addr: &str) -> (Ws, Ws, RoomId) {
    let mut p1 = ws(addr).await;
    let mut p2 = ws(addr).await;

    let reply = round_trip(&mut p1, 1, request_match("u1")).await;
    assert_eq!(reply, Reply::MatchTicket { matched: false, room_id: None });

    let room = match round_trip(&mut p2, 1, request_match("u2")).await {
        Reply::MatchTicket { matched: true, room_id: Some(room) } => room,
        other => panic!("expected a match, got {other:?}"),
    };
    (p1, p2, room)
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_list_games() {
    let addr = start().await;
    let mut client = ws(&addr).await;

    let reply = round_trip(&mut client, 1, Request::ListGames).await;
    match reply {
        Reply::GameList { games } => {
            assert_eq!(games.len(), 2);
            assert!(games.iter().any(|g| g.game == GameKind::TicTacToe));
            assert!(games.iter().any(|g| g.game == GameKind::ConnectFour));
            assert!(games.iter().all(|g| g.min_players == 2));
        }
        other => panic!("expected GameList, got {other:?}"),
    }
}

#[tokio::test]
async fn test_matchmaking_over_wire() {
    let addr = start().await;
    let (mut p1, _p2, room) = setup_match(&addr).await;

    // The first player observes the match through a status poll.
    let reply = round_trip(
        &mut p1,
        2,
        Request::PollMatchStatus { game: TTT, user_id: uid("u1") },
    )
    .await;
    assert_eq!(
        reply,
        Reply::Status { status: MatchStatus::Matched { room_id: room } }
    );
}

#[tokio::test]
async fn test_full_game_to_win_over_wire() {
    let addr = start().await;
    let (mut p1, mut p2, room) = setup_match(&addr).await;

    // u1: 0, u2: 4, u1: 1, u2: 8, u1: 2 — row 0 wins for u1.
    round_trip(&mut p1, 2, submit("u1", &room, 0)).await;
    round_trip(&mut p2, 2, submit("u2", &room, 4)).await;
    round_trip(&mut p1, 3, submit("u1", &room, 1)).await;
    round_trip(&mut p2, 3, submit("u2", &room, 8)).await;

    let reply = round_trip(&mut p1, 4, submit("u1", &room, 2)).await;
    match reply {
        Reply::Session { session } => {
            assert_eq!(session.status, SessionStatus::Finished);
            assert_eq!(
                session.outcome,
                Some(Outcome { winner: Some(uid("u1")), is_draw: false })
            );
        }
        other => panic!("expected Session, got {other:?}"),
    }

    // The loser fetches the final state, then both leave the result.
    let reply = round_trip(
        &mut p2,
        4,
        Request::GetSession { game: TTT, room_id: room.clone() },
    )
    .await;
    assert!(matches!(reply, Reply::Session { .. }));

    let reply = round_trip(
        &mut p1,
        5,
        Request::LeaveResult {
            game: TTT,
            room_id: room.clone(),
            user_id: uid("u1"),
        },
    )
    .await;
    assert_eq!(reply, Reply::Left);
    let reply = round_trip(
        &mut p2,
        5,
        Request::LeaveResult {
            game: TTT,
            room_id: room.clone(),
            user_id: uid("u2"),
        },
    )
    .await;
    assert_eq!(reply, Reply::Left);

    // The room is gone once both players acknowledged.
    let reply = round_trip(
        &mut p1,
        7,
        Request::GetSession { game: TTT, room_id: room.clone() },
    )
    .await;
    match reply {
        Reply::Error { code, .. } => assert_eq!(code, ErrorCode::NotFound),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_wrong_turn_rejected_over_wire() {
    let addr = start().await;
    let (_p1, mut p2, room) = setup_match(&addr).await;

    let reply = round_trip(&mut p2, 2, submit("u2", &room, 0)).await;
    match reply {
        Reply::Error { code, .. } => {
            assert_eq!(code, ErrorCode::NotYourTurn);
        }
        other => panic!("expected NotYourTurn error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_forfeit_over_wire() {
    let addr = start().await;
    let (mut p1, _p2, room) = setup_match(&addr).await;

    let reply = round_trip(
        &mut p1,
        2,
        Request::LeaveMatch {
            game: TTT,
            room_id: room.clone(),
            user_id: uid("u1"),
        },
    )
    .await;
    match reply {
        Reply::Session { session } => {
            assert_eq!(session.status, SessionStatus::Finished);
            assert_eq!(session.outcome, Some(Outcome::win(uid("u2"))));
        }
        other => panic!("expected Session, got {other:?}"),
    }
}

#[tokio::test]
async fn test_room_id_from_wrong_game_rejected() {
    let addr = start().await;
    let (mut p1, _p2, room) = setup_match(&addr).await;

    // A tictactoe room presented as a connectfour room.
    let reply = round_trip(
        &mut p1,
        2,
        Request::GetSession { game: GameKind::ConnectFour, room_id: room },
    )
    .await;
    match reply {
        Reply::Error { code, .. } => assert_eq!(code, ErrorCode::InvalidInput),
        other => panic!("expected InvalidInput, got {other:?}"),
    }
}

#[tokio::test]
async fn test_undecodable_frame_gets_error_reply() {
    let addr = start().await;
    let mut client = ws(&addr).await;

    client
        .send(Message::Binary(b"not json at all".to_vec().into()))
        .await
        .unwrap();

    let frame = recv_reply(&mut client).await;
    assert_eq!(frame.id, 0);
    match frame.reply {
        Reply::Error { code, .. } => assert_eq!(code, ErrorCode::InvalidInput),
        other => panic!("expected InvalidInput, got {other:?}"),
    }
}

#[tokio::test]
async fn test_cancel_over_wire() {
    let addr = start().await;
    let mut client = ws(&addr).await;

    round_trip(&mut client, 1, request_match("solo")).await;
    let reply = round_trip(
        &mut client,
        2,
        Request::CancelMatchmaking { game: TTT, user_id: uid("solo") },
    )
    .await;
    assert_eq!(reply, Reply::Cancelled { removed: true });

    let reply = round_trip(
        &mut client,
        3,
        Request::PollMatchStatus { game: TTT, user_id: uid("solo") },
    )
    .await;
    assert_eq!(reply, Reply::Status { status: MatchStatus::Idle });
}
