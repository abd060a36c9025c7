use sea_orm_migration::prelude::*;

mod m20260830_000001_create_users_table;
mod m20260830_000002_create_communities_table;
mod m20260830_000003_create_threads_table;
mod m20260830_000004_create_thread_children_table;
mod m20260830_000005_create_user_threads_table;
mod m20260830_000006_create_community_threads_table;
mod m20260830_000007_create_user_communities_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260830_000001_create_users_table::Migration),
            Box::new(m20260830_000002_create_communities_table::Migration),
            Box::new(m20260830_000003_create_threads_table::Migration),
            Box::new(m20260830_000004_create_thread_children_table::Migration),
            Box::new(m20260830_000005_create_user_threads_table::Migration),
            Box::new(m20260830_000006_create_community_threads_table::Migration),
            Box::new(m20260830_000007_create_user_communities_table::Migration),
        ]
    }
}

#[cfg(test)]
use sea_orm::{Database, DbErr};

#[tokio::test]
async fn test_migrations_okay() -> Result<(), DbErr> {
    let db = Database::connect("sqlite:file::memory:?cache=shared").await?;
    let schema_manager = SchemaManager::new(&db);

    Migrator::refresh(&db).await?;

    assert!(schema_manager.has_table("user").await?);
    assert!(schema_manager.has_table("community").await?);
    assert!(schema_manager.has_table("thread").await?);
    assert!(schema_manager.has_table("thread_child").await?);
    assert!(schema_manager.has_table("user_thread").await?);
    assert!(schema_manager.has_table("community_thread").await?);
    assert!(schema_manager.has_table("user_community").await?);

    Ok(())
}
