//! Create `tag_media` join table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TagMedia::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TagMedia::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TagMedia::TagId).big_integer().not_null())
                    .col(ColumnDef::new(TagMedia::MediaId).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tag_media_tag")
                            .from(TagMedia::Table, TagMedia::TagId)
                            .to(Tag::Table, Tag::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tag_media_media")
                            .from(TagMedia::Table, TagMedia::MediaId)
                            .to(Media::Table, Media::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_tag_media_tag_id")
                    .table(TagMedia::Table)
                    .col(TagMedia::TagId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_tag_media_media_id")
                    .table(TagMedia::Table)
                    .col(TagMedia::MediaId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TagMedia::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum TagMedia {
    Table,
    Id,
    TagId,
    MediaId,
}

#[derive(Iden)]
enum Tag {
    Table,
    Id,
}

#[derive(Iden)]
enum Media {
    Table,
    Id,
}
