// SeaORM entities
// User, Thread, Community records plus the link tables that carry the
// ordered cross-reference lists between them.

pub mod community;
pub mod community_thread;
pub mod thread;
pub mod thread_child;
pub mod user;
pub mod user_community;
pub mod user_thread;


pub mod prelude {
    // Re-export all entities for convenience
    pub use super::community::{
        ActiveModel as CommunityActiveModel, Column as CommunityColumn, Entity as Community,
        Model as CommunityModel,
    };
    pub use super::community_thread::{
        ActiveModel as CommunityThreadActiveModel, Column as CommunityThreadColumn,
        Entity as CommunityThread, Model as CommunityThreadModel,
    };
    pub use super::thread::{
        ActiveModel as ThreadActiveModel, Column as ThreadColumn, Entity as Thread,
        Model as ThreadModel,
    };
    pub use super::thread_child::{
        ActiveModel as ThreadChildActiveModel, Column as ThreadChildColumn, Entity as ThreadChild,
        Model as ThreadChildModel,
    };
    pub use super::user::{
        ActiveModel as UserActiveModel, Column as UserColumn, Entity as User, Model as UserModel,
    };
    pub use super::user_community::{
        ActiveModel as UserCommunityActiveModel, Column as UserCommunityColumn,
        Entity as UserCommunity, Model as UserCommunityModel,
    };
    pub use super::user_thread::{
        ActiveModel as UserThreadActiveModel, Column as UserThreadColumn, Entity as UserThread,
        Model as UserThreadModel,
    };

    // Re-export commonly used SeaORM types and traits
    pub use sea_orm::{
        ActiveModelTrait,
        ActiveValue,

        ColumnTrait,
        ConnectionTrait,

        // Database and connection types
        Database,
        DatabaseConnection,
        DbConn,
        // Common result types
        DbErr,
        Delete,

        // Core traits
        EntityTrait,
        Insert,
        ItemsAndPagesNumber,
        Linked,

        ModelTrait,
        NotSet,
        // Pagination
        Paginator,
        PaginatorTrait,
        QueryFilter,
        QueryOrder,
        QuerySelect,
        Related,
        RelationTrait,
        // Query builders
        Select,
        // Active model helpers
        Set,
        TryInsertResult,

        Unchanged,
        Update,
    };
}
