use crate::ids::ThreadId;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A user's ordered list of authored threads (replies included); `seq`
/// preserves append order.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_thread")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub seq: i64,
    pub user_id: String,
    pub thread_id: ThreadId,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
