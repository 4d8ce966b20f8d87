//! Create `collection` table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Collection::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Collection::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Collection::Name).string_len(256).not_null())
                    .col(ColumnDef::new(Collection::Type).string_len(16).not_null())
                    .col(ColumnDef::new(Collection::OwnerId).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_collection_owner")
                            .from(Collection::Table, Collection::OwnerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: owner_id (for default-collection lookup)
        manager
            .create_index(
                Index::create()
                    .name("idx_collection_owner_id")
                    .table(Collection::Table)
                    .col(Collection::OwnerId)
                    .to_owned(),
            )
            .await?;

        // Invariant: at most one DEFAULT collection per owner
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE UNIQUE INDEX IF NOT EXISTS idx_collection_owner_default
                ON collection (owner_id)
                WHERE "type" = 'DEFAULT';
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Collection::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Collection {
    Table,
    Id,
    Name,
    Type,
    OwnerId,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
