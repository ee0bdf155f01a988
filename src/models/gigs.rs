use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::users::UserBrief;

/// Gig status stored as a lowercase string in the database.
///
/// The only legal transition is `open -> assigned`, performed exactly once
/// per gig by the hire engine's guarded update. It never reverses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum GigStatus {
    #[sea_orm(string_value = "open")]
    Open,
    #[sea_orm(string_value = "assigned")]
    Assigned,
}

/// SeaORM entity for the `gigs` table.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "gigs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    #[sea_orm(column_type = "Double")]
    pub budget: f64,
    pub status: GigStatus,
    pub owner_id: Uuid,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::bids::Entity")]
    Bids,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::OwnerId",
        to = "super::users::Column::Id"
    )]
    Owner,
}

impl Related<super::bids::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bids.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// ── DTOs ──

#[derive(Debug, Clone, Deserialize)]
pub struct CreateGig {
    pub title: String,
    pub description: String,
    pub budget: f64,
}

/// Query parameters for the gig list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct GigListQuery {
    pub search: Option<String>,
}

/// Response DTO with the owner's display fields resolved.
#[derive(Debug, Clone, Serialize)]
pub struct GigResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub budget: f64,
    pub status: GigStatus,
    pub owner: Option<UserBrief>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl GigResponse {
    pub fn resolve(gig: Model, owner: Option<UserBrief>) -> Self {
        Self {
            id: gig.id,
            title: gig.title,
            description: gig.description,
            budget: gig.budget,
            status: gig.status,
            owner,
            created_at: gig.created_at,
        }
    }
}
