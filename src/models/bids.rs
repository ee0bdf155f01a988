use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::users::UserBrief;

/// Bid status stored as a lowercase string in the database.
///
/// Every bid starts `pending`. The hire engine moves it exactly once, to
/// `hired` or `rejected`; neither is ever reverted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum BidStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "hired")]
    Hired,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

/// SeaORM entity for the `bids` table.
///
/// A unique index on (gig_id, freelancer_id) enforces one bid per
/// freelancer per gig at the store level.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bids")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub gig_id: Uuid,
    pub freelancer_id: Uuid,
    #[sea_orm(column_type = "Text")]
    pub message: String,
    #[sea_orm(column_type = "Double")]
    pub price: f64,
    pub status: BidStatus,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::gigs::Entity",
        from = "Column::GigId",
        to = "super::gigs::Column::Id"
    )]
    Gig,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::FreelancerId",
        to = "super::users::Column::Id"
    )]
    Freelancer,
}

impl Related<super::gigs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Gig.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Freelancer.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// ── DTOs ──

/// Request body for POST /api/bids.
/// The freelancer is always the authenticated caller.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBid {
    pub gig_id: Uuid,
    pub message: String,
    pub price: f64,
}

/// Compact gig representation embedded in a freelancer's bid listing.
#[derive(Debug, Clone, Serialize)]
pub struct GigBrief {
    pub id: Uuid,
    pub title: String,
    pub status: super::gigs::GigStatus,
}

impl From<super::gigs::Model> for GigBrief {
    fn from(g: super::gigs::Model) -> Self {
        Self {
            id: g.id,
            title: g.title,
            status: g.status,
        }
    }
}

/// Response DTO with freelancer (and optionally gig) display fields resolved.
#[derive(Debug, Clone, Serialize)]
pub struct BidResponse {
    pub id: Uuid,
    pub gig_id: Uuid,
    pub freelancer: Option<UserBrief>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gig: Option<GigBrief>,
    pub message: String,
    pub price: f64,
    pub status: BidStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl BidResponse {
    pub fn resolve(bid: Model, freelancer: Option<UserBrief>, gig: Option<GigBrief>) -> Self {
        Self {
            id: bid.id,
            gig_id: bid.gig_id,
            freelancer,
            gig,
            message: bid.message,
            price: bid.price,
            status: bid.status,
            created_at: bid.created_at,
        }
    }
}
