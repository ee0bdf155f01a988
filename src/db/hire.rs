use sea_orm::{DatabaseConnection, DbErr, TransactionError, TransactionTrait};
use thiserror::Error;
use uuid::Uuid;

use crate::db::bids as bid_db;
use crate::db::gigs as gig_db;
use crate::models::bids::{self, BidStatus};
use crate::models::gigs::{self, GigStatus};

/// Everything that can go wrong while hiring, one variant per failure mode.
///
/// `AlreadyAssigned` is deliberately distinct from `GigNotOpen`: the latter
/// means validation saw a non-open gig, the former means validation passed
/// and a concurrent hire flipped the status before this one's commit.
#[derive(Debug, Error)]
pub enum HireError {
    #[error("Bid not found")]
    BidNotFound,
    #[error("Gig not found")]
    GigNotFound,
    #[error("Not authorized to hire for this gig")]
    NotOwner,
    #[error("Gig is no longer open")]
    GigNotOpen,
    #[error("Bid is not pending")]
    BidNotPending,
    #[error("Gig was already assigned")]
    AlreadyAssigned,
    #[error("Store failure: {0}")]
    Store(#[from] DbErr),
}

/// The committed result of a hire: the assigned gig and the hired bid,
/// both re-fetched inside the transaction.
#[derive(Debug, Clone)]
pub struct HireOutcome {
    pub gig: gigs::Model,
    pub bid: bids::Model,
}

/// Hire a freelancer: move the gig `open -> assigned`, the target bid
/// `pending -> hired`, and every sibling pending bid to `rejected`, as one
/// transaction.
///
/// All validation runs inside the same transaction as the writes. The gig
/// update is guarded on `status = open` at commit time; zero matched rows
/// means another hire won the race, and the transaction aborts before any
/// bid is touched. Either every mutation becomes visible or none does.
///
/// Notification of the hired freelancer is the caller's job, after this
/// returns Ok — it is best-effort and must not hold up or fail the commit.
pub async fn hire_freelancer(
    db: &DatabaseConnection,
    bid_id: Uuid,
    caller_id: Uuid,
) -> Result<HireOutcome, HireError> {
    let result = db
        .transaction::<_, HireOutcome, HireError>(move |txn| {
            Box::pin(async move {
                // Preconditions, in order. Each aborts with its own variant.
                let bid = bid_db::get_bid_by_id(txn, bid_id)
                    .await?
                    .ok_or(HireError::BidNotFound)?;

                let gig = gig_db::get_gig_by_id(txn, bid.gig_id)
                    .await?
                    .ok_or(HireError::GigNotFound)?;

                if gig.owner_id != caller_id {
                    return Err(HireError::NotOwner);
                }
                if gig.status != GigStatus::Open {
                    return Err(HireError::GigNotOpen);
                }
                if bid.status != BidStatus::Pending {
                    return Err(HireError::BidNotPending);
                }

                // Guarded flip of the gig status. The store re-checks
                // `status = open` at update time, so of N concurrent hires
                // exactly one sees a matched row here.
                let matched = gig_db::update_gig_status_guarded(
                    txn,
                    gig.id,
                    GigStatus::Open,
                    GigStatus::Assigned,
                )
                .await?;

                if matched == 0 {
                    return Err(HireError::AlreadyAssigned);
                }

                bid_db::update_bid_status(txn, bid_id, BidStatus::Hired).await?;

                let rejected = bid_db::reject_pending_bids_except(txn, gig.id, bid_id).await?;
                tracing::debug!(
                    gig_id = %gig.id,
                    bid_id = %bid_id,
                    rejected,
                    "hire transition committed"
                );

                // Re-fetch inside the transaction so the returned models
                // reflect the committed statuses.
                let bid = bid_db::get_bid_by_id(txn, bid_id)
                    .await?
                    .ok_or(HireError::BidNotFound)?;
                let gig = gig_db::get_gig_by_id(txn, bid.gig_id)
                    .await?
                    .ok_or(HireError::GigNotFound)?;

                Ok(HireOutcome { gig, bid })
            })
        })
        .await;

    match result {
        Ok(outcome) => Ok(outcome),
        // Begin/commit failed at the connection level: nothing persisted,
        // the caller may retry from scratch.
        Err(TransactionError::Connection(e)) => Err(HireError::Store(e)),
        Err(TransactionError::Transaction(e)) => Err(e),
    }
}
