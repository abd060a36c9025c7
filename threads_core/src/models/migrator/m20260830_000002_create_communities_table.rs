use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20260830_000002_create_communities_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Community::Table)
                    .col(
                        ColumnDef::new(Community::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Community::Name).string().not_null())
                    .col(ColumnDef::new(Community::Image).string().not_null())
                    .to_owned(),
            )
            .await?;

        // Create index on name
        manager
            .create_index(
                Index::create()
                    .name("idx_communities_name")
                    .table(Community::Table)
                    .col(Community::Name)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Community::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Community {
    Table,
    Id,
    Name,
    Image,
}
