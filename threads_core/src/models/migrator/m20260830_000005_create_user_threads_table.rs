use sea_orm_migration::prelude::*;

use super::m20260830_000001_create_users_table::User;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20260830_000005_create_user_threads_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserThread::Table)
                    .col(
                        ColumnDef::new(UserThread::Seq)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UserThread::UserId).string().not_null())
                    .col(ColumnDef::new(UserThread::ThreadId).uuid().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_thread_user_id")
                            .from(UserThread::Table, UserThread::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create index on user_id
        manager
            .create_index(
                Index::create()
                    .name("idx_user_threads_user_id")
                    .table(UserThread::Table)
                    .col(UserThread::UserId)
                    .to_owned(),
            )
            .await?;

        // Create index on thread_id for cleanup by deletion set
        manager
            .create_index(
                Index::create()
                    .name("idx_user_threads_thread_id")
                    .table(UserThread::Table)
                    .col(UserThread::ThreadId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserThread::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum UserThread {
    Table,
    Seq,
    UserId,
    ThreadId,
}
