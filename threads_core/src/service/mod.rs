use std::collections::{HashMap, HashSet};

use sea_orm::DatabaseConnection;

use crate::{
    entity::prelude::*,
    error::PersistenceError,
    ids::ThreadId,
    views::ReplyView,
};

pub mod threads;
pub mod users;

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Resolves a thread's reply list in append order.
///
/// Ids whose rows are gone (mid-delete window) are skipped rather than
/// surfaced as errors.
pub(crate) async fn direct_children(
    db: &DatabaseConnection,
    parent_id: ThreadId,
) -> Result<Vec<ThreadModel>, PersistenceError> {
    let links = ThreadChild::find()
        .filter(ThreadChildColumn::ParentId.eq(parent_id))
        .order_by_asc(ThreadChildColumn::Seq)
        .all(db)
        .await
        .map_err(PersistenceError::during("loading reply links"))?;

    let child_ids: Vec<ThreadId> = links.iter().map(|link| link.child_id).collect();

    let rows = Thread::find()
        .filter(ThreadColumn::Id.is_in(child_ids.clone()))
        .all(db)
        .await
        .map_err(PersistenceError::during("loading replies"))?;

    let mut by_id: HashMap<ThreadId, ThreadModel> = rows.into_iter().map(|t| (t.id, t)).collect();

    Ok(child_ids
        .into_iter()
        .filter_map(|id| by_id.remove(&id))
        .collect())
}

/// Reply list with each reply's author resolved (one level, no grandchildren).
pub(crate) async fn reply_views(
    db: &DatabaseConnection,
    parent_id: ThreadId,
) -> Result<Vec<ReplyView>, PersistenceError> {
    let children = direct_children(db, parent_id).await?;

    let author_ids: HashSet<String> = children.iter().map(|t| t.author_id.clone()).collect();
    let authors = load_users(db, author_ids, "resolving reply authors").await?;

    children
        .into_iter()
        .map(|thread| {
            let author = lookup_user(&authors, &thread.author_id, "resolving reply authors")?;
            Ok(ReplyView {
                thread,
                author: author.into(),
            })
        })
        .collect()
}

pub(crate) async fn resolve_author(
    db: &DatabaseConnection,
    user_id: &str,
) -> Result<UserModel, PersistenceError> {
    User::find_by_id(user_id.to_owned())
        .one(db)
        .await
        .map_err(PersistenceError::during("resolving thread author"))?
        .ok_or_else(|| {
            PersistenceError::new(
                "resolving thread author",
                DbErr::RecordNotFound(format!("user {user_id}")),
            )
        })
}

pub(crate) async fn resolve_community(
    db: &DatabaseConnection,
    community_id: Option<&String>,
) -> Result<Option<CommunityModel>, PersistenceError> {
    match community_id {
        Some(id) => Community::find_by_id(id.clone())
            .one(db)
            .await
            .map_err(PersistenceError::during("resolving thread community")),
        None => Ok(None),
    }
}

pub(crate) async fn load_users(
    db: &DatabaseConnection,
    ids: HashSet<String>,
    op: &'static str,
) -> Result<HashMap<String, UserModel>, PersistenceError> {
    let users = User::find()
        .filter(UserColumn::Id.is_in(ids))
        .all(db)
        .await
        .map_err(PersistenceError::during(op))?;

    Ok(users.into_iter().map(|u| (u.id.clone(), u)).collect())
}

pub(crate) fn lookup_user(
    users: &HashMap<String, UserModel>,
    user_id: &str,
    op: &'static str,
) -> Result<UserModel, PersistenceError> {
    users.get(user_id).cloned().ok_or_else(|| {
        PersistenceError::new(op, DbErr::RecordNotFound(format!("user {user_id}")))
    })
}
