use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Gigs {
    Table,
    Status,
    OwnerId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Bids {
    Table,
    GigId,
    FreelancerId,
    Status,
}

#[derive(DeriveIden)]
enum Messages {
    Table,
    GigId,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Open-gig listing: filter by status, order by created_at
        manager
            .create_index(
                Index::create()
                    .name("idx_gigs_status_created_at")
                    .table(Gigs::Table)
                    .col(Gigs::Status)
                    .col(Gigs::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Index on gigs.owner_id for fetching gigs by owner
        manager
            .create_index(
                Index::create()
                    .name("idx_gigs_owner_id")
                    .table(Gigs::Table)
                    .col(Gigs::OwnerId)
                    .to_owned(),
            )
            .await?;

        // Bulk reject targets pending bids of one gig
        manager
            .create_index(
                Index::create()
                    .name("idx_bids_gig_status")
                    .table(Bids::Table)
                    .col(Bids::GigId)
                    .col(Bids::Status)
                    .to_owned(),
            )
            .await?;

        // Index on bids.freelancer_id for a freelancer's bid listing
        manager
            .create_index(
                Index::create()
                    .name("idx_bids_freelancer_id")
                    .table(Bids::Table)
                    .col(Bids::FreelancerId)
                    .to_owned(),
            )
            .await?;

        // Chat history: filter by gig, order by created_at
        manager
            .create_index(
                Index::create()
                    .name("idx_messages_gig_created_at")
                    .table(Messages::Table)
                    .col(Messages::GigId)
                    .col(Messages::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_gigs_status_created_at").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_gigs_owner_id").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_bids_gig_status").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_bids_freelancer_id").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_messages_gig_created_at").to_owned())
            .await?;

        Ok(())
    }
}
