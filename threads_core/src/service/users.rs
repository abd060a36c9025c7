use std::collections::{HashMap, HashSet};

use sea_orm::{
    sea_query::{Expr, Func},
    Condition, DatabaseConnection, Order,
};
use tracing::debug;

use crate::{
    entity::prelude::*,
    error::PersistenceError,
    ids::ThreadId,
    revalidate::Revalidator,
    views::{ActivityView, UserPage, UserPostView, UserPostsView, UserProfileView},
};

use super::{load_users, lookup_user, now_rfc3339, reply_views, resolve_community};

/// The only route the profile upsert refreshes. Other callers (implicit
/// onboarding on first sign-in) must not flush unrelated pages.
const PROFILE_EDIT_PATH: &str = "/profile/edit";

/// How `fetch_users` narrows the result set; built explicitly at the call
/// site.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UserFilter {
    Any,
    /// Case-insensitive substring match on username or display name.
    Matching(String),
}

impl UserFilter {
    /// Builds the filter from a raw search box value.
    pub fn from_search(search: &str) -> Self {
        let trimmed = search.trim();
        if trimmed.is_empty() {
            Self::Any
        } else {
            Self::Matching(trimmed.to_string())
        }
    }
}

/// Profile upsert plus the user-centric reads.
#[derive(Clone)]
pub struct UsersService {
    db: DatabaseConnection,
    revalidator: Revalidator,
}

impl UsersService {
    pub fn new(db: DatabaseConnection, revalidator: Revalidator) -> Self {
        Self { db, revalidator }
    }

    /// Create-or-update the user keyed on the identity provider's id.
    ///
    /// The username is stored lowercased and the user is marked onboarded;
    /// `created_at` is set on first insert and never touched again.
    pub async fn update_user(
        &self,
        user_id: &str,
        username: &str,
        name: &str,
        bio: &str,
        image: &str,
        path: &str,
    ) -> Result<(), PersistenceError> {
        let existing = User::find_by_id(user_id.to_owned())
            .one(&self.db)
            .await
            .map_err(PersistenceError::during("loading user"))?;

        match existing {
            Some(user) => {
                let mut active: UserActiveModel = user.into();
                active.username = Set(username.to_lowercase());
                active.name = Set(name.to_owned());
                active.bio = Set(bio.to_owned());
                active.image = Set(image.to_owned());
                active.onboarded = Set(true);

                active
                    .update(&self.db)
                    .await
                    .map_err(PersistenceError::during("updating user"))?;
            }
            None => {
                let user = UserActiveModel {
                    id: Set(user_id.to_owned()),
                    username: Set(username.to_lowercase()),
                    name: Set(name.to_owned()),
                    bio: Set(bio.to_owned()),
                    image: Set(image.to_owned()),
                    onboarded: Set(true),
                    created_at: Set(now_rfc3339()),
                };

                User::insert(user)
                    .exec(&self.db)
                    .await
                    .map_err(PersistenceError::during("creating user"))?;
            }
        }

        debug!(user_id, "upserted user profile");

        if path == PROFILE_EDIT_PATH {
            self.revalidator.revalidate(path);
        }

        Ok(())
    }

    /// The user with their community memberships resolved; `None` for an
    /// unknown id.
    pub async fn fetch_user(
        &self,
        user_id: &str,
    ) -> Result<Option<UserProfileView>, PersistenceError> {
        let Some(user) = User::find_by_id(user_id.to_owned())
            .one(&self.db)
            .await
            .map_err(PersistenceError::during("loading user"))?
        else {
            return Ok(None);
        };

        let memberships = UserCommunity::find()
            .filter(UserCommunityColumn::UserId.eq(user_id))
            .all(&self.db)
            .await
            .map_err(PersistenceError::during("loading community memberships"))?;

        let community_ids: Vec<String> = memberships.into_iter().map(|m| m.community_id).collect();

        let communities = Community::find()
            .filter(CommunityColumn::Id.is_in(community_ids))
            .all(&self.db)
            .await
            .map_err(PersistenceError::during("loading communities"))?;

        Ok(Some(UserProfileView { user, communities }))
    }

    /// The user's authored-thread list (replies included) expanded in append
    /// order, each thread with its community and direct replies.
    pub async fn fetch_user_posts(
        &self,
        user_id: &str,
    ) -> Result<Option<UserPostsView>, PersistenceError> {
        let Some(user) = User::find_by_id(user_id.to_owned())
            .one(&self.db)
            .await
            .map_err(PersistenceError::during("loading user"))?
        else {
            return Ok(None);
        };

        let links = UserThread::find()
            .filter(UserThreadColumn::UserId.eq(user_id))
            .order_by_asc(UserThreadColumn::Seq)
            .all(&self.db)
            .await
            .map_err(PersistenceError::during("loading authored thread list"))?;

        let thread_ids: Vec<ThreadId> = links.iter().map(|link| link.thread_id).collect();

        let rows = Thread::find()
            .filter(ThreadColumn::Id.is_in(thread_ids.clone()))
            .all(&self.db)
            .await
            .map_err(PersistenceError::during("loading authored threads"))?;

        let mut by_id: HashMap<ThreadId, ThreadModel> =
            rows.into_iter().map(|t| (t.id, t)).collect();

        let mut threads = Vec::with_capacity(thread_ids.len());
        for id in thread_ids {
            // Ids whose rows are gone (mid-delete window) are skipped
            let Some(thread) = by_id.remove(&id) else {
                continue;
            };

            let community = resolve_community(&self.db, thread.community_id.as_ref()).await?;
            let children = reply_views(&self.db, thread.id).await?;
            threads.push(UserPostView {
                thread,
                community,
                children,
            });
        }

        Ok(Some(UserPostsView { user, threads }))
    }

    /// One page of users, excluding the requester, ordered by creation time.
    pub async fn fetch_users(
        &self,
        requesting_user_id: &str,
        filter: UserFilter,
        page_number: u64,
        page_size: u64,
        sort: Order,
    ) -> Result<UserPage, PersistenceError> {
        let page_number = page_number.max(1);
        let page_size = page_size.max(1);
        let skip = (page_number - 1) * page_size;

        let mut condition = Condition::all().add(UserColumn::Id.ne(requesting_user_id));

        if let UserFilter::Matching(pattern) = &filter {
            let needle = format!("%{}%", pattern.to_lowercase());
            condition = condition.add(
                Condition::any()
                    .add(
                        Expr::expr(Func::lower(Expr::col(UserColumn::Username)))
                            .like(needle.clone()),
                    )
                    .add(Expr::expr(Func::lower(Expr::col(UserColumn::Name))).like(needle)),
            );
        }

        let total = User::find()
            .filter(condition.clone())
            .count(&self.db)
            .await
            .map_err(PersistenceError::during("counting users"))?;

        let users = User::find()
            .filter(condition)
            .order_by(UserColumn::CreatedAt, sort)
            .offset(skip)
            .limit(page_size)
            .all(&self.db)
            .await
            .map_err(PersistenceError::during("loading user page"))?;

        let has_next = total > skip + users.len() as u64;

        Ok(UserPage { users, has_next })
    }

    /// Replies other people left on any thread this user authored.
    pub async fn get_activity(&self, user_id: &str) -> Result<Vec<ActivityView>, PersistenceError> {
        let authored = Thread::find()
            .filter(ThreadColumn::AuthorId.eq(user_id))
            .all(&self.db)
            .await
            .map_err(PersistenceError::during("loading authored threads"))?;

        let authored_ids: Vec<ThreadId> = authored.iter().map(|t| t.id).collect();

        // Union of the reply lists across every authored thread
        let links = ThreadChild::find()
            .filter(ThreadChildColumn::ParentId.is_in(authored_ids))
            .order_by_asc(ThreadChildColumn::Seq)
            .all(&self.db)
            .await
            .map_err(PersistenceError::during("loading reply links"))?;

        let reply_ids: Vec<ThreadId> = links.iter().map(|link| link.child_id).collect();

        // The user replying to themselves is not activity
        let replies = Thread::find()
            .filter(ThreadColumn::Id.is_in(reply_ids))
            .filter(ThreadColumn::AuthorId.ne(user_id))
            .all(&self.db)
            .await
            .map_err(PersistenceError::during("loading replies"))?;

        let author_ids: HashSet<String> = replies.iter().map(|t| t.author_id.clone()).collect();
        let authors = load_users(&self.db, author_ids, "resolving reply authors").await?;

        replies
            .into_iter()
            .map(|thread| {
                let author = lookup_user(&authors, &thread.author_id, "resolving reply authors")?;
                Ok(ActivityView {
                    thread,
                    author: author.into(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::migrator::Migrator;
    use crate::service::threads::ThreadsService;
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;
    use std::time::Duration;

    async fn setup_test_services() -> (UsersService, ThreadsService) {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");

        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        let revalidator = Revalidator::new();
        let users = UsersService::new(db.clone(), revalidator.clone());
        let threads = ThreadsService::new(db, revalidator, false);
        (users, threads)
    }

    async fn create_test_user(service: &UsersService, id: &str, username: &str, name: &str) {
        service
            .update_user(id, username, name, "Test bio", "/avatar.png", "/onboarding")
            .await
            .expect("Failed to upsert user");
    }

    async fn create_test_community(service: &UsersService, id: &str) {
        let community = CommunityActiveModel {
            id: Set(id.to_string()),
            name: Set(format!("Community {}", id)),
            image: Set("/banner.png".to_string()),
        };
        Community::insert(community).exec(&service.db).await.unwrap();
    }

    async fn pause() {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    #[tokio::test]
    async fn test_update_user_creates() {
        let (users, _) = setup_test_services().await;

        users
            .update_user(
                "user_a",
                "NewUser",
                "Ada",
                "First bio",
                "/avatar.png",
                "/onboarding",
            )
            .await
            .unwrap();

        let user = User::find_by_id("user_a".to_string())
            .one(&users.db)
            .await
            .unwrap()
            .expect("User should exist");

        assert_eq!(user.username, "newuser", "Username must be lowercased");
        assert_eq!(user.name, "Ada");
        assert!(user.onboarded);
    }

    #[tokio::test]
    async fn test_update_user_idempotent() {
        let (users, _) = setup_test_services().await;

        users
            .update_user("user_a", "Ada", "Ada", "Bio", "/a.png", "/onboarding")
            .await
            .unwrap();

        let first = User::find_by_id("user_a".to_string())
            .one(&users.db)
            .await
            .unwrap()
            .unwrap();

        users
            .update_user("user_a", "Ada", "Ada", "Bio", "/a.png", "/onboarding")
            .await
            .unwrap();

        let second = User::find_by_id("user_a".to_string())
            .one(&users.db)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(first, second, "Second identical upsert must change nothing");

        let count = User::find().count(&users.db).await.unwrap();
        assert_eq!(count, 1, "Upsert must not duplicate the user");
    }

    #[tokio::test]
    async fn test_update_user_updates_existing() {
        let (users, _) = setup_test_services().await;

        create_test_user(&users, "user_a", "ada", "Ada").await;
        users
            .update_user("user_a", "ada", "Ada Lovelace", "New bio", "/b.png", "/onboarding")
            .await
            .unwrap();

        let user = User::find_by_id("user_a".to_string())
            .one(&users.db)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(user.name, "Ada Lovelace");
        assert_eq!(user.bio, "New bio");

        let count = User::find().count(&users.db).await.unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_update_user_narrow_invalidation() {
        let (users, _) = setup_test_services().await;
        let mut rx = users.revalidator.subscribe();

        // Implicit onboarding must not emit
        users
            .update_user("user_a", "ada", "Ada", "Bio", "/a.png", "/onboarding")
            .await
            .unwrap();
        assert!(rx.try_recv().is_err());

        // The profile editor does
        users
            .update_user("user_a", "ada", "Ada", "Bio", "/a.png", "/profile/edit")
            .await
            .unwrap();
        assert_eq!(rx.try_recv().unwrap(), "/profile/edit");
    }

    #[tokio::test]
    async fn test_fetch_user_with_communities() {
        let (users, _) = setup_test_services().await;

        create_test_user(&users, "user_a", "ada", "Ada").await;
        create_test_community(&users, "community_1").await;

        let membership = UserCommunityActiveModel {
            user_id: Set("user_a".to_string()),
            community_id: Set("community_1".to_string()),
        };
        UserCommunity::insert(membership)
            .exec(&users.db)
            .await
            .unwrap();

        let profile = users
            .fetch_user("user_a")
            .await
            .unwrap()
            .expect("User should resolve");

        assert_eq!(profile.user.id, "user_a");
        assert_eq!(profile.communities.len(), 1);
        assert_eq!(profile.communities[0].id, "community_1");
    }

    #[tokio::test]
    async fn test_fetch_user_missing_is_none() {
        let (users, _) = setup_test_services().await;

        let profile = users.fetch_user("ghost").await.unwrap();
        assert!(profile.is_none());
    }

    #[tokio::test]
    async fn test_fetch_user_posts_includes_replies() {
        let (users, threads) = setup_test_services().await;

        create_test_user(&users, "user_a", "ada", "Ada").await;
        create_test_user(&users, "user_b", "bob", "Bob").await;

        let t1 = threads
            .create_thread("T1".to_string(), "user_a", None, "/")
            .await
            .unwrap();
        let c1 = threads
            .add_comment(t1, "C1".to_string(), "user_b", "/")
            .await
            .unwrap();
        let c2 = threads
            .add_comment(c1, "C2".to_string(), "user_a", "/")
            .await
            .unwrap();

        let posts = users
            .fetch_user_posts("user_a")
            .await
            .unwrap()
            .expect("User should resolve");

        // Authored list in append order: the top-level thread, then the reply
        let ids: Vec<ThreadId> = posts.threads.iter().map(|p| p.thread.id).collect();
        assert_eq!(ids, vec![t1, c2]);

        assert_eq!(posts.threads[0].children.len(), 1);
        assert_eq!(posts.threads[0].children[0].thread.id, c1);
        assert_eq!(posts.threads[0].children[0].author.id, "user_b");
    }

    #[tokio::test]
    async fn test_fetch_users_excludes_requester() {
        let (users, _) = setup_test_services().await;

        create_test_user(&users, "user_a", "ada", "Ada").await;
        create_test_user(&users, "user_b", "bob", "Bob").await;

        let page = users
            .fetch_users("user_a", UserFilter::Any, 1, 20, Order::Desc)
            .await
            .unwrap();

        assert_eq!(page.users.len(), 1);
        assert_eq!(page.users[0].id, "user_b");
        assert!(!page.has_next);
    }

    #[tokio::test]
    async fn test_fetch_users_search_case_insensitive() {
        let (users, _) = setup_test_services().await;

        create_test_user(&users, "user_a", "ada", "Ada Lovelace").await;
        create_test_user(&users, "user_b", "bob", "Bob").await;
        create_test_user(&users, "user_c", "carol", "Carol").await;

        // Matches the display name regardless of casing
        let page = users
            .fetch_users(
                "user_c",
                UserFilter::from_search("  LOVELACE "),
                1,
                20,
                Order::Desc,
            )
            .await
            .unwrap();
        assert_eq!(page.users.len(), 1);
        assert_eq!(page.users[0].id, "user_a");

        // Matches the username too
        let page = users
            .fetch_users("user_c", UserFilter::from_search("BO"), 1, 20, Order::Desc)
            .await
            .unwrap();
        assert_eq!(page.users.len(), 1);
        assert_eq!(page.users[0].id, "user_b");

        // Blank search collapses to no filter
        assert_eq!(UserFilter::from_search("   "), UserFilter::Any);
    }

    #[tokio::test]
    async fn test_fetch_users_pagination_and_sort() {
        let (users, _) = setup_test_services().await;

        create_test_user(&users, "user_a", "ada", "Ada").await;
        pause().await;
        create_test_user(&users, "user_b", "bob", "Bob").await;
        pause().await;
        create_test_user(&users, "user_c", "carol", "Carol").await;

        let page1 = users
            .fetch_users("user_x", UserFilter::Any, 1, 2, Order::Asc)
            .await
            .unwrap();
        assert_eq!(page1.users.len(), 2);
        assert!(page1.has_next);
        assert_eq!(page1.users[0].id, "user_a");
        assert_eq!(page1.users[1].id, "user_b");

        let page2 = users
            .fetch_users("user_x", UserFilter::Any, 2, 2, Order::Asc)
            .await
            .unwrap();
        assert_eq!(page2.users.len(), 1);
        assert!(!page2.has_next);
        assert_eq!(page2.users[0].id, "user_c");

        let newest_first = users
            .fetch_users("user_x", UserFilter::Any, 1, 3, Order::Desc)
            .await
            .unwrap();
        assert_eq!(newest_first.users[0].id, "user_c");
    }

    #[tokio::test]
    async fn test_get_activity_excludes_own_replies() {
        let (users, threads) = setup_test_services().await;

        create_test_user(&users, "user_a", "ada", "Ada").await;
        create_test_user(&users, "user_b", "bob", "Bob").await;

        let t1 = threads
            .create_thread("T1".to_string(), "user_a", None, "/")
            .await
            .unwrap();
        let from_b = threads
            .add_comment(t1, "From B".to_string(), "user_b", "/")
            .await
            .unwrap();
        // Self-reply must not show up
        threads
            .add_comment(t1, "Self reply".to_string(), "user_a", "/")
            .await
            .unwrap();

        let activity = users.get_activity("user_a").await.unwrap();

        assert_eq!(activity.len(), 1);
        assert_eq!(activity[0].thread.id, from_b);
        assert_eq!(activity[0].author.id, "user_b");
        assert_eq!(activity[0].author.name, "Bob");
    }

    #[tokio::test]
    async fn test_get_activity_empty() {
        let (users, threads) = setup_test_services().await;

        create_test_user(&users, "user_a", "ada", "Ada").await;
        threads
            .create_thread("No replies yet".to_string(), "user_a", None, "/")
            .await
            .unwrap();

        let activity = users.get_activity("user_a").await.unwrap();
        assert!(activity.is_empty());
    }
}
