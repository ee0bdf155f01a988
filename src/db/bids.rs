use sea_orm::prelude::Expr;
use sea_orm::*;
use uuid::Uuid;

use crate::models::bids::{self, BidStatus, CreateBid};

/// Insert a new bid (always starts Pending).
///
/// The unique (gig_id, freelancer_id) index makes a duplicate insert fail
/// with a DbErr even if two requests race past the handler's pre-check.
pub async fn insert_bid(
    db: &DatabaseConnection,
    input: CreateBid,
    freelancer_id: Uuid,
) -> Result<bids::Model, DbErr> {
    let new_bid = bids::ActiveModel {
        id: Set(Uuid::new_v4()),
        gig_id: Set(input.gig_id),
        freelancer_id: Set(freelancer_id),
        message: Set(input.message),
        price: Set(input.price),
        status: Set(BidStatus::Pending),
        created_at: Set(chrono::Utc::now()),
    };

    new_bid.insert(db).await
}

/// Fetch a single bid by ID. Generic over the connection so it can run
/// inside the hire transaction.
pub async fn get_bid_by_id<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> Result<Option<bids::Model>, DbErr> {
    bids::Entity::find_by_id(id).one(db).await
}

/// Fetch all bids on a gig, newest first.
pub async fn get_bids_by_gig(
    db: &DatabaseConnection,
    gig_id: Uuid,
) -> Result<Vec<bids::Model>, DbErr> {
    bids::Entity::find()
        .filter(bids::Column::GigId.eq(gig_id))
        .order_by_desc(bids::Column::CreatedAt)
        .all(db)
        .await
}

/// Fetch all bids placed by a freelancer, newest first.
pub async fn get_bids_by_freelancer(
    db: &DatabaseConnection,
    freelancer_id: Uuid,
) -> Result<Vec<bids::Model>, DbErr> {
    bids::Entity::find()
        .filter(bids::Column::FreelancerId.eq(freelancer_id))
        .order_by_desc(bids::Column::CreatedAt)
        .all(db)
        .await
}

/// Check whether a freelancer has already bid on a gig.
pub async fn bid_exists_for_gig_and_freelancer(
    db: &DatabaseConnection,
    gig_id: Uuid,
    freelancer_id: Uuid,
) -> Result<bool, DbErr> {
    let count = bids::Entity::find()
        .filter(bids::Column::GigId.eq(gig_id))
        .filter(bids::Column::FreelancerId.eq(freelancer_id))
        .count(db)
        .await?;

    Ok(count > 0)
}

/// Find the hired bid a freelancer holds on a gig, if any.
/// Used by the chat participant predicate.
pub async fn get_hired_bid(
    db: &DatabaseConnection,
    gig_id: Uuid,
    freelancer_id: Uuid,
) -> Result<Option<bids::Model>, DbErr> {
    bids::Entity::find()
        .filter(bids::Column::GigId.eq(gig_id))
        .filter(bids::Column::FreelancerId.eq(freelancer_id))
        .filter(bids::Column::Status.eq(BidStatus::Hired))
        .one(db)
        .await
}

/// Set a bid's status. Single-row atomic write; only the hire engine
/// calls this, inside its transaction.
pub async fn update_bid_status<C: ConnectionTrait>(
    db: &C,
    bid_id: Uuid,
    status: BidStatus,
) -> Result<u64, DbErr> {
    let result = bids::Entity::update_many()
        .col_expr(bids::Column::Status, Expr::value(status))
        .filter(bids::Column::Id.eq(bid_id))
        .exec(db)
        .await?;

    Ok(result.rows_affected)
}

/// Reject every still-pending bid on a gig except the given one.
/// Only the hire engine calls this, inside its transaction.
pub async fn reject_pending_bids_except<C: ConnectionTrait>(
    db: &C,
    gig_id: Uuid,
    except_bid_id: Uuid,
) -> Result<u64, DbErr> {
    let result = bids::Entity::update_many()
        .col_expr(bids::Column::Status, Expr::value(BidStatus::Rejected))
        .filter(bids::Column::GigId.eq(gig_id))
        .filter(bids::Column::Id.ne(except_bid_id))
        .filter(bids::Column::Status.eq(BidStatus::Pending))
        .exec(db)
        .await?;

    Ok(result.rows_affected)
}
