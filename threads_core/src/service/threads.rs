use std::collections::HashSet;

use sea_orm::{Condition, DatabaseConnection, TransactionTrait};
use thiserror::Error;
use tracing::debug;

use crate::{
    entity::prelude::*,
    error::PersistenceError,
    ids::ThreadId,
    revalidate::Revalidator,
    views::{FeedPage, FeedPostView, ReplyTreeView, ThreadDetailView},
};

use super::{
    direct_children, load_users, lookup_user, now_rfc3339, reply_views, resolve_author,
    resolve_community,
};

#[derive(Debug, Error)]
pub enum ThreadsServiceError {
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("thread not found")]
    ThreadNotFound,

    #[error("reply tree is not acyclic: thread {0} reached twice")]
    ReplyCycle(ThreadId),
}

/// Thread tree engine: creation, reply attachment, recursive descendant
/// resolution, cascading deletion, plus the denormalized thread reads.
#[derive(Clone)]
pub struct ThreadsService {
    db: DatabaseConnection,
    revalidator: Revalidator,
    transactional_writes: bool,
}

impl ThreadsService {
    pub fn new(db: DatabaseConnection, revalidator: Revalidator, transactional_writes: bool) -> Self {
        Self {
            db,
            revalidator,
            transactional_writes,
        }
    }

    /// Create a top-level thread, recording it on its author and (when the
    /// external community id resolves) on the community.
    ///
    /// An unknown community id is not an error; the thread just lands outside
    /// any community.
    pub async fn create_thread(
        &self,
        text: String,
        author_id: &str,
        community_id: Option<&str>,
        path: &str,
    ) -> Result<ThreadId, ThreadsServiceError> {
        let community = match community_id {
            Some(id) => Community::find_by_id(id.to_owned())
                .one(&self.db)
                .await
                .map_err(PersistenceError::during("resolving community"))?,
            None => None,
        };

        let thread_id = ThreadId::new();

        if self.transactional_writes {
            let txn = self
                .db
                .begin()
                .await
                .map_err(PersistenceError::during("opening transaction"))?;
            insert_thread_rows(&txn, thread_id, text, author_id, community.as_ref()).await?;
            txn.commit()
                .await
                .map_err(PersistenceError::during("committing thread creation"))?;
        } else {
            insert_thread_rows(&self.db, thread_id, text, author_id, community.as_ref()).await?;
        }

        debug!(%thread_id, author_id, "created thread");
        self.revalidator.revalidate(path);
        Ok(thread_id)
    }

    /// Attach a reply to an existing thread.
    ///
    /// The reply lands on its author's thread list the same way a top-level
    /// thread does.
    pub async fn add_comment(
        &self,
        parent_thread_id: ThreadId,
        comment_text: String,
        author_id: &str,
        path: &str,
    ) -> Result<ThreadId, ThreadsServiceError> {
        let parent = Thread::find_by_id(parent_thread_id)
            .one(&self.db)
            .await
            .map_err(PersistenceError::during("loading parent thread"))?
            .ok_or(ThreadsServiceError::ThreadNotFound)?;

        let comment_id = ThreadId::new();

        if self.transactional_writes {
            let txn = self
                .db
                .begin()
                .await
                .map_err(PersistenceError::during("opening transaction"))?;
            insert_comment_rows(&txn, comment_id, &parent, comment_text, author_id).await?;
            txn.commit()
                .await
                .map_err(PersistenceError::during("committing comment"))?;
        } else {
            insert_comment_rows(&self.db, comment_id, &parent, comment_text, author_id).await?;
        }

        debug!(%comment_id, parent = %parent_thread_id, "attached comment");
        self.revalidator.revalidate(path);
        Ok(comment_id)
    }

    /// Every thread reachable from `thread_id` through the reply lists, in
    /// pre-order (each reply followed by its own descendants).
    ///
    /// Traversal runs on an explicit work stack; reply depth is caller data,
    /// so no call-stack recursion here. A thread surfacing twice means the
    /// link table is corrupt and fails the walk.
    pub async fn fetch_all_descendants(
        &self,
        thread_id: ThreadId,
    ) -> Result<Vec<ThreadModel>, ThreadsServiceError> {
        let mut descendants = Vec::new();
        let mut visited: HashSet<ThreadId> = HashSet::from([thread_id]);

        let mut stack = direct_children(&self.db, thread_id).await?;
        stack.reverse();

        while let Some(thread) = stack.pop() {
            if !visited.insert(thread.id) {
                return Err(ThreadsServiceError::ReplyCycle(thread.id));
            }

            let mut children = direct_children(&self.db, thread.id).await?;
            children.reverse();

            descendants.push(thread);
            stack.extend(children);
        }

        Ok(descendants)
    }

    /// Delete a thread and every descendant, then pull the deleted ids out of
    /// the affected authors' and communities' thread lists.
    pub async fn delete_thread_subtree(
        &self,
        thread_id: ThreadId,
        path: &str,
    ) -> Result<(), ThreadsServiceError> {
        let root = Thread::find_by_id(thread_id)
            .one(&self.db)
            .await
            .map_err(PersistenceError::during("loading thread"))?
            .ok_or(ThreadsServiceError::ThreadNotFound)?;

        let descendants = self.fetch_all_descendants(thread_id).await?;

        let mut doomed: Vec<ThreadId> = Vec::with_capacity(descendants.len() + 1);
        doomed.push(root.id);
        doomed.extend(descendants.iter().map(|t| t.id));

        // Distinct back-references to scrub once the thread rows are gone.
        let authors: HashSet<String> = std::iter::once(root.author_id.clone())
            .chain(descendants.iter().map(|t| t.author_id.clone()))
            .collect();
        let communities: HashSet<String> = root
            .community_id
            .iter()
            .cloned()
            .chain(descendants.iter().filter_map(|t| t.community_id.clone()))
            .collect();

        if self.transactional_writes {
            let txn = self
                .db
                .begin()
                .await
                .map_err(PersistenceError::during("opening transaction"))?;
            delete_subtree_rows(&txn, &doomed, &authors, &communities).await?;
            txn.commit()
                .await
                .map_err(PersistenceError::during("committing subtree deletion"))?;
        } else {
            delete_subtree_rows(&self.db, &doomed, &authors, &communities).await?;
        }

        debug!(%thread_id, count = doomed.len(), "deleted thread subtree");
        self.revalidator.revalidate(path);
        Ok(())
    }

    /// One feed page of top-level threads, newest first, denormalized with
    /// author, community, and direct replies (reply authors resolved,
    /// grandchildren not).
    pub async fn fetch_posts(
        &self,
        page_number: u64,
        page_size: u64,
    ) -> Result<FeedPage, ThreadsServiceError> {
        let page_number = page_number.max(1);
        let page_size = page_size.max(1);
        let skip = (page_number - 1) * page_size;

        let top_level = Thread::find()
            .filter(ThreadColumn::ParentId.is_null())
            .order_by_desc(ThreadColumn::CreatedAt)
            .offset(skip)
            .limit(page_size)
            .all(&self.db)
            .await
            .map_err(PersistenceError::during("loading feed page"))?;

        let total = Thread::find()
            .filter(ThreadColumn::ParentId.is_null())
            .count(&self.db)
            .await
            .map_err(PersistenceError::during("counting top-level threads"))?;

        let has_next = total > skip + top_level.len() as u64;

        let author_ids: HashSet<String> = top_level.iter().map(|t| t.author_id.clone()).collect();
        let authors = load_users(&self.db, author_ids, "resolving feed authors").await?;

        let mut posts = Vec::with_capacity(top_level.len());
        for thread in top_level {
            let author = lookup_user(&authors, &thread.author_id, "resolving feed authors")?;
            let community = resolve_community(&self.db, thread.community_id.as_ref()).await?;
            let children = reply_views(&self.db, thread.id).await?;
            posts.push(FeedPostView {
                thread,
                author,
                community,
                children,
            });
        }

        Ok(FeedPage { posts, has_next })
    }

    /// A single thread with author, community, and two levels of replies.
    ///
    /// Returns `None` for an unresolved id; the lookup is not an existence
    /// assertion.
    pub async fn fetch_thread_by_id(
        &self,
        thread_id: ThreadId,
    ) -> Result<Option<ThreadDetailView>, ThreadsServiceError> {
        let Some(thread) = Thread::find_by_id(thread_id)
            .one(&self.db)
            .await
            .map_err(PersistenceError::during("loading thread"))?
        else {
            return Ok(None);
        };

        let author = resolve_author(&self.db, &thread.author_id).await?;
        let community = resolve_community(&self.db, thread.community_id.as_ref()).await?;

        let mut children = Vec::new();
        for child in direct_children(&self.db, thread.id).await? {
            let child_author = resolve_author(&self.db, &child.author_id).await?;
            let grandchildren = reply_views(&self.db, child.id).await?;
            children.push(ReplyTreeView {
                thread: child,
                author: child_author.into(),
                children: grandchildren,
            });
        }

        Ok(Some(ThreadDetailView {
            thread,
            author,
            community,
            children,
        }))
    }
}

async fn insert_thread_rows<C: ConnectionTrait>(
    conn: &C,
    thread_id: ThreadId,
    text: String,
    author_id: &str,
    community: Option<&CommunityModel>,
) -> Result<(), PersistenceError> {
    let thread = ThreadActiveModel {
        id: Set(thread_id),
        text: Set(text),
        author_id: Set(author_id.to_owned()),
        community_id: Set(community.map(|c| c.id.clone())),
        parent_id: Set(None),
        created_at: Set(now_rfc3339()),
    };

    Thread::insert(thread)
        .exec(conn)
        .await
        .map_err(PersistenceError::during("creating thread"))?;

    let authored = UserThreadActiveModel {
        user_id: Set(author_id.to_owned()),
        thread_id: Set(thread_id),
        ..Default::default()
    };

    UserThread::insert(authored)
        .exec(conn)
        .await
        .map_err(PersistenceError::during("recording thread on author"))?;

    if let Some(community) = community {
        let posted = CommunityThreadActiveModel {
            community_id: Set(community.id.clone()),
            thread_id: Set(thread_id),
            ..Default::default()
        };

        CommunityThread::insert(posted)
            .exec(conn)
            .await
            .map_err(PersistenceError::during("recording thread on community"))?;
    }

    Ok(())
}

async fn insert_comment_rows<C: ConnectionTrait>(
    conn: &C,
    comment_id: ThreadId,
    parent: &ThreadModel,
    text: String,
    author_id: &str,
) -> Result<(), PersistenceError> {
    // Replies carry no community of their own; the parent's membership covers
    // the whole tree.
    let comment = ThreadActiveModel {
        id: Set(comment_id),
        text: Set(text),
        author_id: Set(author_id.to_owned()),
        community_id: Set(None),
        parent_id: Set(Some(parent.id)),
        created_at: Set(now_rfc3339()),
    };

    Thread::insert(comment)
        .exec(conn)
        .await
        .map_err(PersistenceError::during("creating comment"))?;

    let link = ThreadChildActiveModel {
        parent_id: Set(parent.id),
        child_id: Set(comment_id),
        ..Default::default()
    };

    ThreadChild::insert(link)
        .exec(conn)
        .await
        .map_err(PersistenceError::during("recording reply on parent"))?;

    let authored = UserThreadActiveModel {
        user_id: Set(author_id.to_owned()),
        thread_id: Set(comment_id),
        ..Default::default()
    };

    UserThread::insert(authored)
        .exec(conn)
        .await
        .map_err(PersistenceError::during("recording comment on author"))?;

    Ok(())
}

async fn delete_subtree_rows<C: ConnectionTrait>(
    conn: &C,
    doomed: &[ThreadId],
    authors: &HashSet<String>,
    communities: &HashSet<String>,
) -> Result<(), PersistenceError> {
    // Thread rows go first so a concurrent attach cannot re-link an id that
    // is about to disappear.
    Thread::delete_many()
        .filter(ThreadColumn::Id.is_in(doomed.to_vec()))
        .exec(conn)
        .await
        .map_err(PersistenceError::during("deleting thread subtree"))?;

    ThreadChild::delete_many()
        .filter(
            Condition::any()
                .add(ThreadChildColumn::ParentId.is_in(doomed.to_vec()))
                .add(ThreadChildColumn::ChildId.is_in(doomed.to_vec())),
        )
        .exec(conn)
        .await
        .map_err(PersistenceError::during("unlinking replies"))?;

    UserThread::delete_many()
        .filter(UserThreadColumn::UserId.is_in(authors.iter().cloned()))
        .filter(UserThreadColumn::ThreadId.is_in(doomed.to_vec()))
        .exec(conn)
        .await
        .map_err(PersistenceError::during("scrubbing author thread lists"))?;

    CommunityThread::delete_many()
        .filter(CommunityThreadColumn::CommunityId.is_in(communities.iter().cloned()))
        .filter(CommunityThreadColumn::ThreadId.is_in(doomed.to_vec()))
        .exec(conn)
        .await
        .map_err(PersistenceError::during("scrubbing community thread lists"))?;

    Ok(())
}
