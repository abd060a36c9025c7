use crate::ids::ThreadId;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A thread's ordered reply list; `seq` preserves append order.
///
/// No foreign key into `thread`: the list mirrors a denormalized reference
/// array, and a dangling id during a partially-completed delete is the
/// documented best-effort window.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "thread_child")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub seq: i64,
    pub parent_id: ThreadId,
    pub child_id: ThreadId,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
