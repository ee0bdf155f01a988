use actix_web::{HttpResponse, Responder, web};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::middleware::AuthenticatedUser;
use crate::cache::{RedisCache, keys};
use crate::db::bids as bid_db;
use crate::db::gigs as gig_db;
use crate::db::hire::{self, HireError};
use crate::db::users as user_db;
use crate::models::bids::{BidResponse, CreateBid, GigBrief, Model as Bid};
use crate::models::gigs::{GigResponse, GigStatus};
use crate::models::users::UserBrief;
use crate::realtime::protocol::ServerMessage;
use crate::realtime::server::Hub;

/// Resolve freelancer display fields for a batch of bids.
async fn resolve_bids(
    db: &DatabaseConnection,
    bids: Vec<Bid>,
) -> Result<Vec<BidResponse>, sea_orm::DbErr> {
    let freelancer_ids: Vec<Uuid> = bids.iter().map(|b| b.freelancer_id).collect();
    let freelancers = user_db::get_users_by_ids(db, freelancer_ids).await?;

    Ok(bids
        .into_iter()
        .map(|b| {
            let freelancer = freelancers.get(&b.freelancer_id).cloned().map(UserBrief::from);
            BidResponse::resolve(b, freelancer, None)
        })
        .collect())
}

/// POST /api/bids — a freelancer bids on an open gig.
///
/// The freelancer is always the authenticated caller. The gig must exist
/// and be open, owners cannot bid on their own gigs, and one bid per
/// freelancer per gig is allowed (also enforced by a unique index, so a
/// racing duplicate surfaces as a unique-violation insert error).
pub async fn create_bid(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    body: web::Json<CreateBid>,
) -> impl Responder {
    let freelancer_id = user.0.id;
    let input = body.into_inner();

    if input.message.trim().is_empty() {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": "Please provide all fields",
        }));
    }
    if !input.price.is_finite() || input.price <= 0.0 {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": "Price must be a valid number greater than 0",
        }));
    }

    // 1. The gig must exist and still be open.
    let gig = match gig_db::get_gig_by_id(db.get_ref(), input.gig_id).await {
        Ok(Some(gig)) => gig,
        Ok(None) => {
            return HttpResponse::NotFound().json(serde_json::json!({
                "error": "Gig not found",
            }));
        }
        Err(e) => {
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Database error: {e}"),
            }));
        }
    };

    if gig.status != GigStatus::Open {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": "Gig is no longer open for bids",
        }));
    }

    // 2. Owners cannot bid on their own gig.
    if gig.owner_id == freelancer_id {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": "You cannot bid on your own gig",
        }));
    }

    // 3. One bid per freelancer per gig.
    match bid_db::bid_exists_for_gig_and_freelancer(db.get_ref(), input.gig_id, freelancer_id).await
    {
        Ok(true) => {
            return HttpResponse::Conflict().json(serde_json::json!({
                "error": "You have already bid on this gig",
            }));
        }
        Ok(false) => {}
        Err(e) => {
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Database error: {e}"),
            }));
        }
    }

    // 4. Insert. The unique index backstops the pre-check under races.
    match bid_db::insert_bid(db.get_ref(), input, freelancer_id).await {
        Ok(bid) => {
            let gig_brief = GigBrief::from(gig);
            HttpResponse::Created().json(BidResponse::resolve(
                bid,
                Some(UserBrief::from(user.0)),
                Some(gig_brief),
            ))
        }
        Err(e) => {
            let msg = e.to_string();
            if msg.contains("duplicate") || msg.contains("unique") {
                return HttpResponse::Conflict().json(serde_json::json!({
                    "error": "You have already bid on this gig",
                }));
            }
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Failed to create bid: {e}"),
            }))
        }
    }
}

/// GET /api/bids/gig/{gig_id} — list bids on a gig (owner only).
pub async fn get_bids_by_gig(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> impl Responder {
    let gig_id = path.into_inner();

    let gig = match gig_db::get_gig_by_id(db.get_ref(), gig_id).await {
        Ok(Some(gig)) => gig,
        Ok(None) => {
            return HttpResponse::NotFound().json(serde_json::json!({
                "error": format!("Gig {gig_id} not found"),
            }));
        }
        Err(e) => {
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Database error: {e}"),
            }));
        }
    };

    if gig.owner_id != user.0.id {
        return HttpResponse::Forbidden().json(serde_json::json!({
            "error": "Not authorized to view these bids",
        }));
    }

    let bids = match bid_db::get_bids_by_gig(db.get_ref(), gig_id).await {
        Ok(bids) => bids,
        Err(e) => {
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Database error: {e}"),
            }));
        }
    };

    match resolve_bids(db.get_ref(), bids).await {
        Ok(resolved) => HttpResponse::Ok().json(resolved),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Database error: {e}"),
        })),
    }
}

/// GET /api/bids/my — list the caller's own bids with gig summaries.
pub async fn get_my_bids(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
) -> impl Responder {
    let bids = match bid_db::get_bids_by_freelancer(db.get_ref(), user.0.id).await {
        Ok(bids) => bids,
        Err(e) => {
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Database error: {e}"),
            }));
        }
    };

    let gig_ids: Vec<Uuid> = bids.iter().map(|b| b.gig_id).collect();
    let gigs = match gig_db::get_gigs_by_ids(db.get_ref(), gig_ids).await {
        Ok(gigs) => gigs,
        Err(e) => {
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Database error: {e}"),
            }));
        }
    };

    let me = UserBrief::from(user.0);
    let resolved: Vec<BidResponse> = bids
        .into_iter()
        .map(|b| {
            let gig = gigs.get(&b.gig_id).cloned().map(GigBrief::from);
            BidResponse::resolve(b, Some(me.clone()), gig)
        })
        .collect();

    HttpResponse::Ok().json(resolved)
}

/// PATCH /api/bids/{bid_id}/hire — hire a freelancer (owner only).
///
/// Runs the atomic hire transition, then — after the commit — invalidates
/// gig caches and pushes the `hired` event to the freelancer's live
/// sessions. Both post-commit steps are best-effort and never change the
/// reported outcome.
pub async fn hire_freelancer(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    cache: web::Data<Arc<RedisCache>>,
    hub: web::Data<Arc<Hub>>,
    path: web::Path<Uuid>,
) -> impl Responder {
    let bid_id = path.into_inner();

    let outcome = match hire::hire_freelancer(db.get_ref(), bid_id, user.0.id).await {
        Ok(outcome) => outcome,
        Err(e) => {
            let mut status = match &e {
                HireError::BidNotFound | HireError::GigNotFound => HttpResponse::NotFound(),
                HireError::NotOwner => HttpResponse::Forbidden(),
                HireError::GigNotOpen | HireError::BidNotPending => HttpResponse::BadRequest(),
                HireError::AlreadyAssigned => HttpResponse::Conflict(),
                HireError::Store(db_err) => {
                    tracing::error!("hire transaction failed: {db_err}");
                    HttpResponse::InternalServerError()
                }
            };
            return status.json(serde_json::json!({
                "error": e.to_string(),
            }));
        }
    };

    let gig = outcome.gig;
    let bid = outcome.bid;
    let freelancer_id = bid.freelancer_id;

    // Cached copies of the gig still say "open"; drop them.
    let _ = cache.delete(&keys::gig(&gig.id.to_string())).await;
    let _ = cache.delete_pattern(keys::gig_list_pattern()).await;

    // Fire-and-forget notification to the hired freelancer's live sessions.
    let delivered = hub
        .notify_user(
            freelancer_id,
            ServerMessage::Hired {
                message: format!("You have been hired for {}!", gig.title),
                gig_id: gig.id,
                gig_title: gig.title.clone(),
                bid_id: bid.id,
            },
        )
        .await;
    if delivered == 0 {
        tracing::debug!(freelancer_id = %freelancer_id, "hired freelancer has no live sessions");
    }

    // Resolve display fields for the response.
    let users = match user_db::get_users_by_ids(db.get_ref(), vec![gig.owner_id, freelancer_id])
        .await
    {
        Ok(users) => users,
        Err(e) => {
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Database error: {e}"),
            }));
        }
    };

    let gig_brief = GigBrief::from(gig.clone());
    let owner = users.get(&gig.owner_id).cloned().map(UserBrief::from);
    let freelancer = users.get(&freelancer_id).cloned().map(UserBrief::from);

    HttpResponse::Ok().json(serde_json::json!({
        "message": "Freelancer hired successfully",
        "bid": BidResponse::resolve(bid, freelancer, Some(gig_brief)),
        "gig": GigResponse::resolve(gig, owner),
    }))
}
