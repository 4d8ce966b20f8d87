//! Create `collection_share` table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CollectionShare::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CollectionShare::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CollectionShare::CollectionId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CollectionShare::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_collection_share_collection")
                            .from(CollectionShare::Table, CollectionShare::CollectionId)
                            .to(Collection::Table, Collection::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_collection_share_user")
                            .from(CollectionShare::Table, CollectionShare::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: user_id (Shared-visibility listing)
        manager
            .create_index(
                Index::create()
                    .name("idx_collection_share_user_id")
                    .table(CollectionShare::Table)
                    .col(CollectionShare::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CollectionShare::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum CollectionShare {
    Table,
    Id,
    CollectionId,
    UserId,
}

#[derive(Iden)]
enum Collection {
    Table,
    Id,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
