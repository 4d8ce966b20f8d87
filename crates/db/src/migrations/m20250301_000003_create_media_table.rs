//! Create `media` table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Media::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Media::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Media::ContentHash)
                            .string_len(40)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Media::MediaType).string_len(128).not_null())
                    .col(ColumnDef::new(Media::Width).integer().not_null())
                    .col(ColumnDef::new(Media::Height).integer().not_null())
                    .col(
                        ColumnDef::new(Media::DurationSeconds)
                            .double()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Media::SizeBytes).big_integer().not_null())
                    .col(
                        ColumnDef::new(Media::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Media::CreatedBy).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_media_created_by")
                            .from(Media::Table, Media::CreatedBy)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: content_hash (exact-match download lookups).
        // Deliberately NOT unique: duplicate uploads share one blob but each
        // keeps its own row.
        manager
            .create_index(
                Index::create()
                    .name("idx_media_content_hash")
                    .table(Media::Table)
                    .col(Media::ContentHash)
                    .to_owned(),
            )
            .await?;

        // Index: created_by (Self-visibility listing)
        manager
            .create_index(
                Index::create()
                    .name("idx_media_created_by")
                    .table(Media::Table)
                    .col(Media::CreatedBy)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Media::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Media {
    Table,
    Id,
    ContentHash,
    MediaType,
    Width,
    Height,
    DurationSeconds,
    SizeBytes,
    CreatedAt,
    CreatedBy,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
