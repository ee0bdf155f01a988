use actix_web::{HttpResponse, Responder, web};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::middleware::AuthenticatedUser;
use crate::db::bids as bid_db;
use crate::db::gigs as gig_db;
use crate::db::messages as message_db;
use crate::models::gigs::GigStatus;
use crate::models::messages::{CreateMessage, MessageResponse, SendMessageRequest};
use crate::realtime::protocol::ServerMessage;
use crate::realtime::server::Hub;

/// Helper: verify the authenticated user may access a gig's chat.
/// The gig must be assigned and the user its owner or the hired freelancer.
async fn authorize_chat_party(
    db: &DatabaseConnection,
    gig_id: Uuid,
    user_id: Uuid,
) -> Result<crate::models::gigs::Model, HttpResponse> {
    let gig = gig_db::get_gig_by_id(db, gig_id)
        .await
        .map_err(|e| {
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Database error: {e}"),
            }))
        })?
        .ok_or_else(|| {
            HttpResponse::NotFound().json(serde_json::json!({
                "error": format!("Gig {gig_id} not found"),
            }))
        })?;

    if gig.status != GigStatus::Assigned {
        return Err(HttpResponse::Forbidden().json(serde_json::json!({
            "error": "Chat is only available for assigned gigs",
        })));
    }

    let is_owner = gig.owner_id == user_id;

    let is_hired = match bid_db::get_hired_bid(db, gig_id, user_id).await {
        Ok(bid) => bid.is_some(),
        Err(e) => {
            return Err(HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Database error: {e}"),
            })));
        }
    };

    if !is_owner && !is_hired {
        return Err(HttpResponse::Forbidden().json(serde_json::json!({
            "error": "Not authorized to access this chat",
        })));
    }

    Ok(gig)
}

/// GET /api/messages/gig/{gig_id} — full chat history, oldest first.
pub async fn get_messages(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> impl Responder {
    let gig_id = path.into_inner();

    if let Err(resp) = authorize_chat_party(db.get_ref(), gig_id, user.0.id).await {
        return resp;
    }

    match message_db::get_messages_by_gig(db.get_ref(), gig_id).await {
        Ok(messages) => {
            let responses: Vec<MessageResponse> =
                messages.into_iter().map(MessageResponse::from).collect();
            HttpResponse::Ok().json(responses)
        }
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Database error: {e}"),
        })),
    }
}

/// POST /api/messages/gig/{gig_id} — append a message and broadcast it to
/// the gig's live chat room.
pub async fn create_message(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    hub: web::Data<Arc<Hub>>,
    path: web::Path<Uuid>,
    body: web::Json<SendMessageRequest>,
) -> impl Responder {
    let gig_id = path.into_inner();
    let content = body.into_inner().content;

    if content.trim().is_empty() {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": "Message content is required",
        }));
    }

    if let Err(resp) = authorize_chat_party(db.get_ref(), gig_id, user.0.id).await {
        return resp;
    }

    let input = CreateMessage {
        gig_id,
        sender_id: user.0.id,
        content,
    };

    match message_db::insert_message(db.get_ref(), input).await {
        Ok(saved) => {
            hub.broadcast(
                gig_id,
                ServerMessage::NewMessage {
                    id: saved.id,
                    gig_id: saved.gig_id,
                    sender_id: saved.sender_id,
                    content: saved.content.clone(),
                    created_at: saved.created_at.to_rfc3339(),
                },
                None,
            )
            .await;

            HttpResponse::Created().json(MessageResponse::from(saved))
        }
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Failed to save message: {e}"),
        })),
    }
}

/// PATCH /api/messages/gig/{gig_id}/read — mark everything the other party
/// sent as read.
pub async fn mark_all_read(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> impl Responder {
    let gig_id = path.into_inner();

    if let Err(resp) = authorize_chat_party(db.get_ref(), gig_id, user.0.id).await {
        return resp;
    }

    match message_db::mark_all_read_for_gig(db.get_ref(), gig_id, user.0.id).await {
        Ok(updated) => HttpResponse::Ok().json(serde_json::json!({
            "updated": updated,
        })),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Failed to mark messages as read: {e}"),
        })),
    }
}
