use actix_web::{HttpResponse, Responder, web};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::middleware::AuthenticatedUser;
use crate::cache::{RedisCache, keys};
use crate::db::gigs as gig_db;
use crate::db::users as user_db;
use crate::models::gigs::{CreateGig, GigListQuery, GigResponse, Model as Gig};
use crate::models::users::UserBrief;

const GIG_LIST_TTL: u64 = 60;
const GIG_TTL: u64 = 300;

/// Resolve owner display fields for a batch of gigs.
async fn resolve_gigs(
    db: &DatabaseConnection,
    gigs: Vec<Gig>,
) -> Result<Vec<GigResponse>, sea_orm::DbErr> {
    let owner_ids: Vec<Uuid> = gigs.iter().map(|g| g.owner_id).collect();
    let owners = user_db::get_users_by_ids(db, owner_ids).await?;

    Ok(gigs
        .into_iter()
        .map(|g| {
            let owner = owners.get(&g.owner_id).cloned().map(UserBrief::from);
            GigResponse::resolve(g, owner)
        })
        .collect())
}

/// GET /api/gigs?search= — list open gigs, newest first, Redis-cached.
pub async fn get_gigs(
    _user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    cache: web::Data<Arc<RedisCache>>,
    query: web::Query<GigListQuery>,
) -> impl Responder {
    let search = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let cache_key = keys::gig_list(search.unwrap_or("all"));

    // Try the cache first; any cache failure falls back to the database.
    match cache.get::<serde_json::Value>(&cache_key).await {
        Ok(Some(cached)) => return HttpResponse::Ok().json(cached),
        Ok(None) => {}
        Err(e) => tracing::warn!("Cache error: {e}"),
    }

    let gigs = match gig_db::get_open_gigs(db.get_ref(), search).await {
        Ok(gigs) => gigs,
        Err(e) => {
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Failed to fetch gigs: {e}"),
            }));
        }
    };

    match resolve_gigs(db.get_ref(), gigs).await {
        Ok(resolved) => {
            let _ = cache.set(&cache_key, &resolved, Some(GIG_LIST_TTL)).await;
            HttpResponse::Ok().json(resolved)
        }
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Database error: {e}"),
        })),
    }
}

/// GET /api/gigs/{id} — get a single gig, Redis-cached.
pub async fn get_gig(
    _user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    cache: web::Data<Arc<RedisCache>>,
    path: web::Path<Uuid>,
) -> impl Responder {
    let id = path.into_inner();
    let cache_key = keys::gig(&id.to_string());

    match cache.get::<serde_json::Value>(&cache_key).await {
        Ok(Some(cached)) => return HttpResponse::Ok().json(cached),
        Ok(None) => {}
        Err(e) => tracing::warn!("Cache error: {e}"),
    }

    match gig_db::get_gig_by_id(db.get_ref(), id).await {
        Ok(Some(gig)) => {
            let owner = match user_db::get_user_by_id(db.get_ref(), gig.owner_id).await {
                Ok(owner) => owner.map(UserBrief::from),
                Err(e) => {
                    return HttpResponse::InternalServerError().json(serde_json::json!({
                        "error": format!("Database error: {e}"),
                    }));
                }
            };
            let response = GigResponse::resolve(gig, owner);
            let _ = cache.set(&cache_key, &response, Some(GIG_TTL)).await;
            HttpResponse::Ok().json(response)
        }
        Ok(None) => HttpResponse::NotFound().json(serde_json::json!({
            "error": format!("Gig {id} not found"),
        })),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Database error: {e}"),
        })),
    }
}

/// GET /api/gigs/my — list the caller's own gigs (any status).
pub async fn get_my_gigs(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
) -> impl Responder {
    let owner = UserBrief::from(user.0.clone());

    match gig_db::get_gigs_by_owner(db.get_ref(), user.0.id).await {
        Ok(gigs) => {
            let resolved: Vec<GigResponse> = gigs
                .into_iter()
                .map(|g| GigResponse::resolve(g, Some(owner.clone())))
                .collect();
            HttpResponse::Ok().json(resolved)
        }
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Failed to fetch gigs: {e}"),
        })),
    }
}

/// POST /api/gigs — create a new gig (always starts open).
pub async fn create_gig(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    cache: web::Data<Arc<RedisCache>>,
    body: web::Json<CreateGig>,
) -> impl Responder {
    let input = body.into_inner();

    if input.title.trim().is_empty() || input.description.trim().is_empty() {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": "Title and description are required",
        }));
    }
    if !input.budget.is_finite() || input.budget <= 0.0 {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": "Budget must be a valid number greater than 0",
        }));
    }

    match gig_db::insert_gig(db.get_ref(), input, user.0.id).await {
        Ok(gig) => {
            let _ = cache.delete_pattern(keys::gig_list_pattern()).await;
            HttpResponse::Created().json(GigResponse::resolve(gig, Some(UserBrief::from(user.0))))
        }
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Failed to create gig: {e}"),
        })),
    }
}

/// DELETE /api/gigs/{id} — delete a gig (owner only).
pub async fn delete_gig(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    cache: web::Data<Arc<RedisCache>>,
    path: web::Path<Uuid>,
) -> impl Responder {
    let id = path.into_inner();

    let gig = match gig_db::get_gig_by_id(db.get_ref(), id).await {
        Ok(Some(gig)) => gig,
        Ok(None) => {
            return HttpResponse::NotFound().json(serde_json::json!({
                "error": format!("Gig {id} not found"),
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
            "error": "Not authorized to delete this gig",
        }));
    }

    match gig_db::delete_gig(db.get_ref(), id).await {
        Ok(_) => {
            let _ = cache.delete(&keys::gig(&id.to_string())).await;
            let _ = cache.delete_pattern(keys::gig_list_pattern()).await;
            HttpResponse::Ok().json(serde_json::json!({
                "message": format!("Gig {id} deleted"),
            }))
        }
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Failed to delete gig: {e}"),
        })),
    }
}
