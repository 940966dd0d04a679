//! Per-connection handler: decode, dispatch, reply.
//!
//! Each accepted connection gets its own Tokio task running this
//! handler. Connections are stateless — identity travels in every
//! request, so the loop is a pure decode → engine dispatch → correlated
//! reply pipeline. A client may pipeline requests; replies carry the
//! request's `id`.

use std::sync::Arc;

use parlor_engine::{Engine, MatchTicket, StatsSink};
use parlor_protocol::{
    Codec, ErrorCode, GameKind, Reply, ReplyFrame, Request, RequestFrame,
    RoomId,
};
use parlor_store::MatchStore;
use parlor_transport::{Connection, WebSocketConnection};

use crate::ParlorError;
use crate::server::ServerState;

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<S, T, C>(
    conn: WebSocketConnection,
    state: Arc<ServerState<S, T, C>>,
) -> Result<(), ParlorError>
where
    S: MatchStore,
    T: StatsSink,
    C: Codec,
{
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::debug!(%conn_id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
        };

        let frame: RequestFrame = match state.codec.decode(&data) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "undecodable frame");
                // No frame id survived decoding; correlate with 0 so
                // the client at least sees the rejection.
                let reply = ReplyFrame {
                    id: 0,
                    reply: Reply::Error {
                        code: ErrorCode::InvalidInput,
                        message: e.to_string(),
                    },
                };
                send(&conn, &state.codec, &reply).await?;
                continue;
            }
        };

        let reply = dispatch(&state.engine, frame.request).await;
        send(&conn, &state.codec, &ReplyFrame { id: frame.id, reply }).await?;
    }

    Ok(())
}

/// Routes one request into the engine and shapes the reply.
pub(crate) async fn dispatch<S, T>(
    engine: &Engine<S, T>,
    request: Request,
) -> Reply
where
    S: MatchStore,
    T: StatsSink,
{
    match request {
        Request::ListGames => Reply::GameList { games: engine.list_games() },

        Request::RequestMatch { game, user_id, display_name } => {
            match engine.request_match(game, user_id, display_name).await {
                Ok(MatchTicket::Matched { room_id }) => Reply::MatchTicket {
                    matched: true,
                    room_id: Some(room_id),
                },
                Ok(MatchTicket::Waiting) => Reply::MatchTicket {
                    matched: false,
                    room_id: None,
                },
                Err(e) => error_reply(e),
            }
        }

        Request::CancelMatchmaking { game, user_id } => Reply::Cancelled {
            removed: engine.cancel_matchmaking(game, &user_id).await,
        },

        Request::PollMatchStatus { game, user_id } => Reply::Status {
            status: engine.poll_match_status(game, &user_id).await,
        },

        Request::GetSession { game, room_id } => {
            if let Err(reply) = room_belongs_to(game, &room_id) {
                return reply;
            }
            match engine.get_session(&room_id).await {
                Ok(session) => Reply::Session { session },
                Err(e) => error_reply(e),
            }
        }

        Request::SubmitMove { game, room_id, user_id, input } => {
            if let Err(reply) = room_belongs_to(game, &room_id) {
                return reply;
            }
            match engine.submit_move(&room_id, &user_id, &input).await {
                Ok(session) => Reply::Session { session },
                Err(e) => error_reply(e),
            }
        }

        Request::LeaveMatch { game, room_id, user_id } => {
            if let Err(reply) = room_belongs_to(game, &room_id) {
                return reply;
            }
            match engine.leave_match(&room_id, &user_id).await {
                Ok(session) => Reply::Session { session },
                Err(e) => error_reply(e),
            }
        }

        Request::LeaveResult { game, room_id, user_id } => {
            if let Err(reply) = room_belongs_to(game, &room_id) {
                return reply;
            }
            engine.leave_result(&room_id, &user_id).await;
            Reply::Left
        }
    }
}

/// A room id must resolve to the game kind the request names.
fn room_belongs_to(game: GameKind, room: &RoomId) -> Result<(), Reply> {
    if room.kind() == Some(game) {
        Ok(())
    } else {
        Err(Reply::Error {
            code: ErrorCode::InvalidInput,
            message: format!("room {room} does not belong to game {game}"),
        })
    }
}

fn error_reply(e: parlor_engine::EngineError) -> Reply {
    Reply::Error { code: e.code(), message: e.to_string() }
}

async fn send(
    conn: &WebSocketConnection,
    codec: &impl Codec,
    frame: &ReplyFrame,
) -> Result<(), ParlorError> {
    let bytes = codec.encode(frame)?;
    conn.send(&bytes).await.map_err(ParlorError::Transport)
}
