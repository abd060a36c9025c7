pub mod entity;
pub mod ids;
pub mod models;
use tokio::sync::OnceCell;

use std::sync::Arc;

use tracing::info;

use crate::revalidate::Revalidator;
use crate::service::threads::ThreadsService;
use crate::service::users::UsersService;

pub mod service;

pub mod error;

pub mod config;

pub mod revalidate;

pub mod views;

static THREADS_CORE: OnceCell<Arc<ThreadsCore>> = OnceCell::const_new();

pub async fn core() -> Arc<ThreadsCore> {
    THREADS_CORE
        .get_or_init(|| async move { Arc::new(ThreadsCore::start().await.expect("failed to init")) })
        .await
        .clone()
}

/// Main runtime handle for the threads core.
pub struct ThreadsCore {
    pub config: config::ThreadsConfig,

    /// Fan-out channel for cache invalidation signals.
    pub revalidations: Revalidator,

    /// Thread tree writes and feed reads.
    pub threads: ThreadsService,

    /// Profile upsert and user-centric reads.
    pub users: UsersService,
}

impl ThreadsCore {
    pub async fn start() -> Result<Self, Box<dyn std::error::Error>> {
        let config = config::get_or_init().await?;
        info!(?config, "starting threads core");

        // DB + migrations
        let db = models::open_or_create_db(&config).await;
        models::migrate_up(db.clone()).await;

        let revalidations = Revalidator::new();

        let threads = ThreadsService::new(
            db.clone(),
            revalidations.clone(),
            config.transactional_writes(),
        );
        let users = UsersService::new(db, revalidations.clone());

        Ok(Self {
            config,
            revalidations,
            threads,
            users,
        })
    }
}

pub mod prelude {
    pub use super::ids;
    pub use super::entity;
    pub use super::models;

    pub use super::service;

    pub use super::error;

    pub use super::config;

    pub use super::revalidate;

    pub use super::views;
}
