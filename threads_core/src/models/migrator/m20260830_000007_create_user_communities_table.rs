use sea_orm_migration::prelude::*;

use super::m20260830_000001_create_users_table::User;
use super::m20260830_000002_create_communities_table::Community;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20260830_000007_create_user_communities_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserCommunity::Table)
                    .col(ColumnDef::new(UserCommunity::UserId).string().not_null())
                    .col(
                        ColumnDef::new(UserCommunity::CommunityId)
                            .string()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(UserCommunity::UserId)
                            .col(UserCommunity::CommunityId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_community_user_id")
                            .from(UserCommunity::Table, UserCommunity::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_community_community_id")
                            .from(UserCommunity::Table, UserCommunity::CommunityId)
                            .to(Community::Table, Community::Id)
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
                    .name("idx_user_communities_user_id")
                    .table(UserCommunity::Table)
                    .col(UserCommunity::UserId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserCommunity::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum UserCommunity {
    Table,
    UserId,
    CommunityId,
}
