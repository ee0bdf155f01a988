use actix_web::{HttpRequest, HttpResponse, web};
use actix_ws::Message;
use futures_util::StreamExt;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::auth::jwt;
use crate::auth::middleware::JwtSecret;
use crate::db::bids as bid_db;
use crate::db::gigs as gig_db;
use crate::db::messages as message_db;
use crate::models::gigs::{self, GigStatus};
use crate::models::messages::CreateMessage;
use crate::realtime::protocol::{ClientMessage, ServerMessage};
use crate::realtime::server::{ClientHandle, Hub};

/// Query params for the WebSocket handshake endpoint.
#[derive(Debug, serde::Deserialize)]
pub struct WsQuery {
    pub token: String,
}

/// GET /api/ws?token=<jwt>
///
/// Upgrades the HTTP connection to a WebSocket. Authenticates via a query
/// param token (browsers can't send Authorization headers during the
/// WebSocket handshake). The session is registered under the user's
/// notification channel immediately; gig chat rooms are joined later via
/// `join_gig` messages, each gated by the chat access predicate.
pub async fn ws_connect(
    req: HttpRequest,
    stream: web::Payload,
    query: web::Query<WsQuery>,
    db: web::Data<DatabaseConnection>,
    secret: web::Data<JwtSecret>,
    hub: web::Data<Arc<Hub>>,
) -> Result<HttpResponse, actix_web::Error> {
    let claims = jwt::validate_token(&query.token, &secret.0)
        .map_err(|e| actix_web::error::ErrorUnauthorized(format!("Invalid token: {e}")))?;

    let user_id = claims
        .user_id()
        .map_err(actix_web::error::ErrorUnauthorized)?;

    let (response, session, msg_stream) = actix_ws::handle(&req, stream)?;

    let (handle, rx) = hub.connect(user_id).await;
    tracing::info!(user_id = %user_id, conn_id = %handle.conn_id, "websocket connected");

    let db_clone = db.get_ref().clone();
    let hub_clone = hub.get_ref().clone();

    actix_web::rt::spawn(handle_ws_session(
        session, msg_stream, rx, handle, db_clone, hub_clone,
    ));

    Ok(response)
}

/// Drives the WebSocket session: reads incoming messages from the client,
/// forwards outgoing messages from the hub, and cleans up on disconnect.
async fn handle_ws_session(
    mut session: actix_ws::Session,
    mut msg_stream: actix_ws::MessageStream,
    mut rx: mpsc::UnboundedReceiver<ServerMessage>,
    handle: ClientHandle,
    db: DatabaseConnection,
    hub: Arc<Hub>,
) {
    loop {
        tokio::select! {
            // Incoming message from the WebSocket client.
            Some(msg) = msg_stream.next() => {
                match msg {
                    Ok(Message::Text(text)) => {
                        handle_client_message(&text, &mut session, &handle, &db, &hub).await;
                    }
                    Ok(Message::Ping(bytes)) => {
                        if session.pong(&bytes).await.is_err() {
                            break;
                        }
                    }
                    Ok(Message::Close(_)) => {
                        break;
                    }
                    Err(_) => {
                        break;
                    }
                    _ => {}
                }
            }
            // Outgoing message from the hub to this client.
            Some(server_msg) = rx.recv() => {
                let json = match serde_json::to_string(&server_msg) {
                    Ok(j) => j,
                    Err(_) => continue,
                };
                if session.text(json).await.is_err() {
                    break;
                }
            }
            // Both channels closed — exit.
            else => break,
        }
    }

    tracing::info!(user_id = %handle.user_id, conn_id = %handle.conn_id, "websocket disconnected");
    hub.disconnect(&handle).await;
    let _ = session.close(None).await;
}

/// The chat access predicate: the gig must exist and be assigned, and the
/// user must be its owner or the hired freelancer.
async fn check_chat_access(
    db: &DatabaseConnection,
    gig_id: Uuid,
    user_id: Uuid,
) -> Result<gigs::Model, String> {
    let gig = gig_db::get_gig_by_id(db, gig_id)
        .await
        .map_err(|e| format!("Database error: {e}"))?
        .ok_or_else(|| "Gig not found".to_string())?;

    if gig.status != GigStatus::Assigned {
        return Err("Chat is only available for assigned gigs".to_string());
    }

    if gig.owner_id == user_id {
        return Ok(gig);
    }

    let hired = bid_db::get_hired_bid(db, gig_id, user_id)
        .await
        .map_err(|e| format!("Database error: {e}"))?;

    if hired.is_some() {
        Ok(gig)
    } else {
        Err("Not authorized to access this chat".to_string())
    }
}

async fn send_error(session: &mut actix_ws::Session, message: String) {
    let err = ServerMessage::Error { message };
    let _ = session
        .text(serde_json::to_string(&err).unwrap_or_default())
        .await;
}

/// Parse and handle an incoming client message.
async fn handle_client_message(
    text: &str,
    session: &mut actix_ws::Session,
    handle: &ClientHandle,
    db: &DatabaseConnection,
    hub: &Hub,
) {
    let client_msg: ClientMessage = match serde_json::from_str(text) {
        Ok(m) => m,
        Err(e) => {
            send_error(session, format!("Invalid message format: {e}")).await;
            return;
        }
    };

    let user_id = handle.user_id;

    match client_msg {
        ClientMessage::JoinGig { gig_id } => {
            if let Err(reason) = check_chat_access(db, gig_id, user_id).await {
                send_error(session, reason).await;
                return;
            }

            hub.join_room(gig_id, handle.clone()).await;
            let joined = ServerMessage::JoinedGig { gig_id };
            let _ = session
                .text(serde_json::to_string(&joined).unwrap_or_default())
                .await;
        }

        ClientMessage::LeaveGig { gig_id } => {
            hub.leave_room(gig_id, handle).await;
        }

        ClientMessage::SendMessage { gig_id, content } => {
            if content.trim().is_empty() {
                send_error(session, "Message content cannot be empty".to_string()).await;
                return;
            }

            // Re-run the access check; room membership alone could be stale
            // against a deleted gig.
            if let Err(reason) = check_chat_access(db, gig_id, user_id).await {
                send_error(session, reason).await;
                return;
            }

            let input = CreateMessage {
                gig_id,
                sender_id: user_id,
                content: content.clone(),
            };

            match message_db::insert_message(db, input).await {
                Ok(saved) => {
                    let msg = ServerMessage::NewMessage {
                        id: saved.id,
                        gig_id: saved.gig_id,
                        sender_id: saved.sender_id,
                        content: saved.content,
                        created_at: saved.created_at.to_rfc3339(),
                    };

                    // Broadcast to all participants, sender included, so
                    // everyone gets the server-assigned id and timestamp.
                    hub.broadcast(gig_id, msg, None).await;
                }
                Err(e) => {
                    send_error(session, format!("Failed to save message: {e}")).await;
                }
            }
        }

        ClientMessage::MarkRead { message_id } => {
            let message = match message_db::get_message_by_id(db, message_id).await {
                Ok(Some(m)) => m,
                Ok(None) => {
                    send_error(session, "Message not found".to_string()).await;
                    return;
                }
                Err(e) => {
                    send_error(session, format!("Database error: {e}")).await;
                    return;
                }
            };

            if let Err(reason) = check_chat_access(db, message.gig_id, user_id).await {
                send_error(session, reason).await;
                return;
            }

            match message_db::mark_message_as_read(db, message_id).await {
                Ok(_) => {
                    let msg = ServerMessage::MessageRead {
                        gig_id: message.gig_id,
                        message_id,
                        reader_id: user_id,
                    };
                    hub.broadcast(message.gig_id, msg, None).await;
                }
                Err(e) => {
                    send_error(session, format!("Failed to mark message as read: {e}")).await;
                }
            }
        }

        ClientMessage::Typing { gig_id } => {
            if !hub.is_in_room(gig_id, handle.conn_id).await {
                return;
            }
            let msg = ServerMessage::UserTyping { gig_id, user_id };
            // Only send to others — the sender already knows they're typing.
            hub.broadcast(gig_id, msg, Some(user_id)).await;
        }

        ClientMessage::StopTyping { gig_id } => {
            if !hub.is_in_room(gig_id, handle.conn_id).await {
                return;
            }
            let msg = ServerMessage::UserStopTyping { gig_id, user_id };
            hub.broadcast(gig_id, msg, Some(user_id)).await;
        }
    }
}
