//! Create `collection_media` join table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CollectionMedia::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CollectionMedia::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CollectionMedia::CollectionId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CollectionMedia::MediaId)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_collection_media_collection")
                            .from(CollectionMedia::Table, CollectionMedia::CollectionId)
                            .to(Collection::Table, Collection::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_collection_media_media")
                            .from(CollectionMedia::Table, CollectionMedia::MediaId)
                            .to(Media::Table, Media::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_collection_media_collection_id")
                    .table(CollectionMedia::Table)
                    .col(CollectionMedia::CollectionId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_collection_media_media_id")
                    .table(CollectionMedia::Table)
                    .col(CollectionMedia::MediaId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CollectionMedia::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum CollectionMedia {
    Table,
    Id,
    CollectionId,
    MediaId,
}

#[derive(Iden)]
enum Collection {
    Table,
    Id,
}

#[derive(Iden)]
enum Media {
    Table,
    Id,
}
