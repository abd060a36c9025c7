use sea_orm_migration::prelude::*;

use super::m20260830_000002_create_communities_table::Community;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20260830_000006_create_community_threads_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CommunityThread::Table)
                    .col(
                        ColumnDef::new(CommunityThread::Seq)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CommunityThread::CommunityId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CommunityThread::ThreadId).uuid().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_community_thread_community_id")
                            .from(CommunityThread::Table, CommunityThread::CommunityId)
                            .to(Community::Table, Community::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create index on community_id
        manager
            .create_index(
                Index::create()
                    .name("idx_community_threads_community_id")
                    .table(CommunityThread::Table)
                    .col(CommunityThread::CommunityId)
                    .to_owned(),
            )
            .await?;

        // Create index on thread_id for cleanup by deletion set
        manager
            .create_index(
                Index::create()
                    .name("idx_community_threads_thread_id")
                    .table(CommunityThread::Table)
                    .col(CommunityThread::ThreadId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CommunityThread::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum CommunityThread {
    Table,
    Seq,
    CommunityId,
    ThreadId,
}
