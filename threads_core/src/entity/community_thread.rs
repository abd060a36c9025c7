use crate::ids::ThreadId;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A community's ordered list of threads posted into it.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "community_thread")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub seq: i64,
    pub community_id: String,
    pub thread_id: ThreadId,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::community::Entity",
        from = "Column::CommunityId",
        to = "super::community::Column::Id"
    )]
    Community,
}

impl Related<super::community::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Community.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
