use sea_orm::prelude::Expr;
use sea_orm::*;
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::gigs::{self, CreateGig, GigStatus};

/// Insert a new gig. Gigs always start `open`.
pub async fn insert_gig(
    db: &DatabaseConnection,
    input: CreateGig,
    owner_id: Uuid,
) -> Result<gigs::Model, DbErr> {
    let new_gig = gigs::ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set(input.title),
        description: Set(input.description),
        budget: Set(input.budget),
        status: Set(GigStatus::Open),
        owner_id: Set(owner_id),
        created_at: Set(chrono::Utc::now()),
    };

    new_gig.insert(db).await
}

/// Fetch all open gigs, newest first, with an optional substring search
/// on title and description.
pub async fn get_open_gigs(
    db: &DatabaseConnection,
    search: Option<&str>,
) -> Result<Vec<gigs::Model>, DbErr> {
    let mut query = gigs::Entity::find().filter(gigs::Column::Status.eq(GigStatus::Open));

    if let Some(term) = search {
        let term = term.trim();
        if !term.is_empty() {
            query = query.filter(
                Condition::any()
                    .add(gigs::Column::Title.contains(term))
                    .add(gigs::Column::Description.contains(term)),
            );
        }
    }

    query
        .order_by_desc(gigs::Column::CreatedAt)
        .all(db)
        .await
}

/// Fetch a single gig by ID. Generic over the connection so it can run
/// inside the hire transaction.
pub async fn get_gig_by_id<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> Result<Option<gigs::Model>, DbErr> {
    gigs::Entity::find_by_id(id).one(db).await
}

/// Fetch all gigs owned by a user, newest first.
pub async fn get_gigs_by_owner(
    db: &DatabaseConnection,
    owner_id: Uuid,
) -> Result<Vec<gigs::Model>, DbErr> {
    gigs::Entity::find()
        .filter(gigs::Column::OwnerId.eq(owner_id))
        .order_by_desc(gigs::Column::CreatedAt)
        .all(db)
        .await
}

/// Fetch many gigs in one query and return an id -> gig map.
/// Used to resolve gig summaries on a freelancer's bid listing.
pub async fn get_gigs_by_ids(
    db: &DatabaseConnection,
    ids: Vec<Uuid>,
) -> Result<HashMap<Uuid, gigs::Model>, DbErr> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let found = gigs::Entity::find()
        .filter(gigs::Column::Id.is_in(ids))
        .all(db)
        .await?;

    Ok(found.into_iter().map(|g| (g.id, g)).collect())
}

/// Conditionally move a gig from one status to another.
///
/// The filter on the *current* status makes this a single atomic
/// read-modify-write evaluated by the store at commit time; it is the sole
/// concurrency-control primitive of the hire engine. Returns the number of
/// rows matched: 1 if the gig was still in `from`, 0 if some other
/// operation already moved it.
///
/// The guard is parameterized rather than hard-coded to `open -> assigned`
/// so any future transition revalidates against its own expected prior
/// state.
pub async fn update_gig_status_guarded<C: ConnectionTrait>(
    db: &C,
    gig_id: Uuid,
    from: GigStatus,
    to: GigStatus,
) -> Result<u64, DbErr> {
    let result = gigs::Entity::update_many()
        .col_expr(gigs::Column::Status, Expr::value(to))
        .filter(gigs::Column::Id.eq(gig_id))
        .filter(gigs::Column::Status.eq(from))
        .exec(db)
        .await?;

    Ok(result.rows_affected)
}

/// Delete a gig by ID.
pub async fn delete_gig(db: &DatabaseConnection, id: Uuid) -> Result<DeleteResult, DbErr> {
    gigs::Entity::delete_by_id(id).exec(db).await
}
