//! Unit tests for the hire transition engine against a MockDatabase that
//! honors the same contracts as the real store: point lookups feed the
//! validation ladder, and the guarded gig update reports how many rows it
//! matched. Every failure path must leave the transaction without a single
//! bid mutation.
//!
//! Run with: `cargo test --test hire_test`
use chrono::Utc;
use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
use uuid::Uuid;

use gigflow_backend::db::hire::{HireError, hire_freelancer};
use gigflow_backend::models::bids::{self, BidStatus};
use gigflow_backend::models::gigs::{self, GigStatus};

fn gig(id: Uuid, owner_id: Uuid, status: GigStatus) -> gigs::Model {
    gigs::Model {
        id,
        title: "Build a landing page".to_string(),
        description: "Responsive, two weeks".to_string(),
        budget: 500.0,
        status,
        owner_id,
        created_at: Utc::now(),
    }
}

fn bid(id: Uuid, gig_id: Uuid, freelancer_id: Uuid, status: BidStatus) -> bids::Model {
    bids::Model {
        id,
        gig_id,
        freelancer_id,
        message: "I can do this".to_string(),
        price: 450.0,
        status,
        created_at: Utc::now(),
    }
}

fn exec_ok(rows_affected: u64) -> MockExecResult {
    MockExecResult {
        last_insert_id: 0,
        rows_affected,
    }
}

#[tokio::test]
async fn missing_bid_fails_with_not_found_and_writes_nothing() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<bids::Model>::new()])
        .into_connection();

    let result = hire_freelancer(&db, Uuid::new_v4(), Uuid::new_v4()).await;
    assert!(matches!(result, Err(HireError::BidNotFound)));

    let log = format!("{:?}", db.into_transaction_log());
    assert!(!log.contains("UPDATE"));
}

#[tokio::test]
async fn missing_gig_fails_with_not_found() {
    let bid_id = Uuid::new_v4();
    let the_bid = bid(bid_id, Uuid::new_v4(), Uuid::new_v4(), BidStatus::Pending);

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![the_bid]])
        .append_query_results([Vec::<gigs::Model>::new()])
        .into_connection();

    let result = hire_freelancer(&db, bid_id, Uuid::new_v4()).await;
    assert!(matches!(result, Err(HireError::GigNotFound)));
}

#[tokio::test]
async fn non_owner_is_forbidden_and_writes_nothing() {
    let owner = Uuid::new_v4();
    let stranger = Uuid::new_v4();
    let gig_id = Uuid::new_v4();
    let bid_id = Uuid::new_v4();

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![bid(bid_id, gig_id, Uuid::new_v4(), BidStatus::Pending)]])
        .append_query_results([vec![gig(gig_id, owner, GigStatus::Open)]])
        .into_connection();

    let result = hire_freelancer(&db, bid_id, stranger).await;
    assert!(matches!(result, Err(HireError::NotOwner)));

    let log = format!("{:?}", db.into_transaction_log());
    assert!(!log.contains("UPDATE"));
}

#[tokio::test]
async fn assigned_gig_fails_validation_with_not_open() {
    let owner = Uuid::new_v4();
    let gig_id = Uuid::new_v4();
    let bid_id = Uuid::new_v4();

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![bid(bid_id, gig_id, Uuid::new_v4(), BidStatus::Pending)]])
        .append_query_results([vec![gig(gig_id, owner, GigStatus::Assigned)]])
        .into_connection();

    let result = hire_freelancer(&db, bid_id, owner).await;
    assert!(matches!(result, Err(HireError::GigNotOpen)));
}

#[tokio::test]
async fn non_pending_bid_fails_validation() {
    let owner = Uuid::new_v4();
    let gig_id = Uuid::new_v4();
    let bid_id = Uuid::new_v4();

    // Gig open but this bid was already rejected; hiring it again must be
    // an InvalidState error, not a Conflict.
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![bid(bid_id, gig_id, Uuid::new_v4(), BidStatus::Rejected)]])
        .append_query_results([vec![gig(gig_id, owner, GigStatus::Open)]])
        .into_connection();

    let result = hire_freelancer(&db, bid_id, owner).await;
    assert!(matches!(result, Err(HireError::BidNotPending)));
}

#[tokio::test]
async fn commit_time_race_surfaces_as_conflict_without_touching_bids() {
    let owner = Uuid::new_v4();
    let gig_id = Uuid::new_v4();
    let bid_id = Uuid::new_v4();

    // Validation sees an open gig, but by commit time a concurrent hire
    // already flipped it: the guarded update matches zero rows.
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![bid(bid_id, gig_id, Uuid::new_v4(), BidStatus::Pending)]])
        .append_query_results([vec![gig(gig_id, owner, GigStatus::Open)]])
        .append_exec_results([exec_ok(0)])
        .into_connection();

    let result = hire_freelancer(&db, bid_id, owner).await;
    assert!(matches!(result, Err(HireError::AlreadyAssigned)));

    // The gig update ran, but no bid was mutated.
    let log = format!("{:?}", db.into_transaction_log());
    assert!(log.contains("UPDATE \\\"gigs\\\"") || log.contains("UPDATE \"gigs\""));
    assert!(!log.contains("UPDATE \\\"bids\\\"") && !log.contains("UPDATE \"bids\""));
}

#[tokio::test]
async fn successful_hire_assigns_gig_and_hires_bid() {
    let owner = Uuid::new_v4();
    let freelancer = Uuid::new_v4();
    let gig_id = Uuid::new_v4();
    let bid_id = Uuid::new_v4();

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        // Validation reads.
        .append_query_results([vec![bid(bid_id, gig_id, freelancer, BidStatus::Pending)]])
        .append_query_results([vec![gig(gig_id, owner, GigStatus::Open)]])
        // Guarded gig update, target bid update, sibling bulk reject.
        .append_exec_results([exec_ok(1), exec_ok(1), exec_ok(2)])
        // In-transaction re-fetch of the committed rows.
        .append_query_results([vec![bid(bid_id, gig_id, freelancer, BidStatus::Hired)]])
        .append_query_results([vec![gig(gig_id, owner, GigStatus::Assigned)]])
        .into_connection();

    let outcome = hire_freelancer(&db, bid_id, owner)
        .await
        .expect("hire should succeed");

    assert_eq!(outcome.gig.id, gig_id);
    assert_eq!(outcome.gig.status, GigStatus::Assigned);
    assert_eq!(outcome.bid.id, bid_id);
    assert_eq!(outcome.bid.status, BidStatus::Hired);
    assert_eq!(outcome.bid.freelancer_id, freelancer);

    // One gig update and two bid updates (hire + bulk reject) ran.
    let log = format!("{:?}", db.into_transaction_log());
    let gig_updates = log.matches("UPDATE \\\"gigs\\\"").count() + log.matches("UPDATE \"gigs\"").count();
    let bid_updates = log.matches("UPDATE \\\"bids\\\"").count() + log.matches("UPDATE \"bids\"").count();
    assert_eq!(gig_updates, 1);
    assert_eq!(bid_updates, 2);
}

#[tokio::test]
async fn store_failure_mid_sequence_aborts_the_whole_unit() {
    let owner = Uuid::new_v4();
    let gig_id = Uuid::new_v4();
    let bid_id = Uuid::new_v4();

    // An infrastructure error during the write sequence must roll up into
    // a Store failure with the transaction aborted, never a partial commit.
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![bid(bid_id, gig_id, Uuid::new_v4(), BidStatus::Pending)]])
        .append_query_results([vec![gig(gig_id, owner, GigStatus::Open)]])
        .append_exec_results([exec_ok(1)])
        .append_exec_errors([sea_orm::DbErr::Custom("connection reset by peer".to_string())])
        .into_connection();

    let result = hire_freelancer(&db, bid_id, owner).await;
    assert!(matches!(result, Err(HireError::Store(_))));
}
