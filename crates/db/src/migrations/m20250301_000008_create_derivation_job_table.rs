//! Create `derivation_job` table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DerivationJob::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DerivationJob::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(DerivationJob::MediaId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DerivationJob::Status)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DerivationJob::Attempts)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(DerivationJob::LastError).text())
                    .col(
                        ColumnDef::new(DerivationJob::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(DerivationJob::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_derivation_job_media")
                            .from(DerivationJob::Table, DerivationJob::MediaId)
                            .to(Media::Table, Media::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_derivation_job_media_id")
                    .table(DerivationJob::Table)
                    .col(DerivationJob::MediaId)
                    .to_owned(),
            )
            .await?;

        // Index: status (finding stuck/failed work)
        manager
            .create_index(
                Index::create()
                    .name("idx_derivation_job_status")
                    .table(DerivationJob::Table)
                    .col(DerivationJob::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DerivationJob::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum DerivationJob {
    Table,
    Id,
    MediaId,
    Status,
    Attempts,
    LastError,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Media {
    Table,
    Id,
}
