pub mod auth;
pub mod bids;
pub mod gigs;
pub mod messages;

use actix_web::{HttpResponse, Responder, web};

use crate::realtime::session::ws_connect;

/// GET /api/health — unauthenticated liveness probe.
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "OK",
        "message": "GigFlow API is running",
    }))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health));

    // ── Auth routes (protected by JWT via the AuthenticatedUser extractor) ──
    cfg.service(web::scope("/auth").route("/me", web::get().to(auth::me)));

    // ── Gig routes (all protected — require valid JWT) ──
    // "/my" is registered before "/{id}" so it wins the match.
    cfg.service(
        web::scope("/gigs")
            .route("", web::get().to(gigs::get_gigs))
            .route("", web::post().to(gigs::create_gig))
            .route("/my", web::get().to(gigs::get_my_gigs))
            .route("/{id}", web::get().to(gigs::get_gig))
            .route("/{id}", web::delete().to(gigs::delete_gig)),
    );

    // ── Bid routes (all protected — require valid JWT) ──
    cfg.service(
        web::scope("/bids")
            .route("", web::post().to(bids::create_bid))
            .route("/my", web::get().to(bids::get_my_bids))
            .route("/gig/{gig_id}", web::get().to(bids::get_bids_by_gig))
            .route("/{bid_id}/hire", web::patch().to(bids::hire_freelancer)),
    );

    // ── Message routes (participants of an assigned gig only) ──
    cfg.service(
        web::scope("/messages")
            .route("/gig/{gig_id}", web::get().to(messages::get_messages))
            .route("/gig/{gig_id}", web::post().to(messages::create_message))
            .route("/gig/{gig_id}/read", web::patch().to(messages::mark_all_read)),
    );

    // ── WebSocket (token via query param, see realtime::session) ──
    cfg.route("/ws", web::get().to(ws_connect));
}
