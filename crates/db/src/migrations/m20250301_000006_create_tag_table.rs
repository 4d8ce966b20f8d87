//! Create `tag` table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Tag::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Tag::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Tag::Type).string_len(16).not_null())
                    .col(ColumnDef::new(Tag::Namespace).string_len(32).not_null())
                    .col(ColumnDef::new(Tag::TagName).string_len(256).not_null())
                    .to_owned(),
            )
            .await?;

        // Uniqueness lives in the store, not in check-then-insert: concurrent
        // creates of the same (namespace, tag_name) resolve via ON CONFLICT.
        manager
            .create_index(
                Index::create()
                    .name("idx_tag_namespace_name")
                    .table(Tag::Table)
                    .col(Tag::Namespace)
                    .col(Tag::TagName)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Tag::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Tag {
    Table,
    Id,
    Type,
    Namespace,
    TagName,
}
