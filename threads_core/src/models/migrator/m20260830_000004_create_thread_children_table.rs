use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20260830_000004_create_thread_children_table"
    }
}

// No foreign keys into `thread` here: the reply list mirrors a denormalized
// reference array, and the delete path removes thread rows before it scrubs
// these links.
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ThreadChild::Table)
                    .col(
                        ColumnDef::new(ThreadChild::Seq)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ThreadChild::ParentId).uuid().not_null())
                    .col(ColumnDef::new(ThreadChild::ChildId).uuid().not_null())
                    .to_owned(),
            )
            .await?;

        // Create index on parent_id for reply listing
        manager
            .create_index(
                Index::create()
                    .name("idx_thread_children_parent_id")
                    .table(ThreadChild::Table)
                    .col(ThreadChild::ParentId)
                    .to_owned(),
            )
            .await?;

        // Create index on child_id for cleanup by deletion set
        manager
            .create_index(
                Index::create()
                    .name("idx_thread_children_child_id")
                    .table(ThreadChild::Table)
                    .col(ThreadChild::ChildId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ThreadChild::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum ThreadChild {
    Table,
    Seq,
    ParentId,
    ChildId,
}
