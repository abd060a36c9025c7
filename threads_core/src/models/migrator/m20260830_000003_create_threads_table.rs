use sea_orm_migration::{prelude::*, schema::*};

use super::m20260830_000001_create_users_table::User;
use super::m20260830_000002_create_communities_table::Community;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Thread::Table)
                    .col(pk_uuid(Thread::Id))
                    .col(string(Thread::Text))
                    .col(string(Thread::AuthorId))
                    .col(string_null(Thread::CommunityId))
                    .col(uuid_null(Thread::ParentId)) // NULL for top-level threads
                    .col(timestamp(Thread::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-thread-author_id")
                            .from(Thread::Table, Thread::AuthorId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-thread-community_id")
                            .from(Thread::Table, Thread::CommunityId)
                            .to(Community::Table, Community::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-thread-parent_id")
                            .from(Thread::Table, Thread::ParentId)
                            .to(Thread::Table, Thread::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create index on author_id
        manager
            .create_index(
                Index::create()
                    .name("idx_threads_author_id")
                    .table(Thread::Table)
                    .col(Thread::AuthorId)
                    .to_owned(),
            )
            .await?;

        // Create index on parent_id for top-level/feed filtering
        manager
            .create_index(
                Index::create()
                    .name("idx_threads_parent_id")
                    .table(Thread::Table)
                    .col(Thread::ParentId)
                    .to_owned(),
            )
            .await?;

        // Create index on created_at for feed ordering
        manager
            .create_index(
                Index::create()
                    .name("idx_threads_created_at")
                    .table(Thread::Table)
                    .col(Thread::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Thread::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Thread {
    Table,
    Id,
    Text,
    AuthorId,
    CommunityId,
    ParentId,
    CreatedAt,
}
