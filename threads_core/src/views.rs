//! Denormalized read models handed to the presentation layer.
//!
//! Each view bundles a thread row with the cross-references already resolved,
//! so the UI never issues follow-up lookups.

use serde::{Deserialize, Serialize};

use crate::entity::prelude::*;

/// The author fields exposed on replies: id, name, image.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorSummary {
    pub id: String,
    pub name: String,
    pub image: String,
}

impl From<UserModel> for AuthorSummary {
    fn from(user: UserModel) -> Self {
        Self {
            id: user.id,
            name: user.name,
            image: user.image,
        }
    }
}

/// A reply with its author resolved.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyView {
    pub thread: ThreadModel,
    pub author: AuthorSummary,
}

/// A reply whose own direct replies are resolved as well.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyTreeView {
    pub thread: ThreadModel,
    pub author: AuthorSummary,
    pub children: Vec<ReplyView>,
}

/// Feed entry: a top-level thread with author, community, and direct replies.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FeedPostView {
    pub thread: ThreadModel,
    pub author: UserModel,
    pub community: Option<CommunityModel>,
    pub children: Vec<ReplyView>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FeedPage {
    pub posts: Vec<FeedPostView>,
    pub has_next: bool,
}

/// Single-thread page: two levels of replies, author resolved at each level.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ThreadDetailView {
    pub thread: ThreadModel,
    pub author: UserModel,
    pub community: Option<CommunityModel>,
    pub children: Vec<ReplyTreeView>,
}

/// One entry of a user's posts tab.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserPostView {
    pub thread: ThreadModel,
    pub community: Option<CommunityModel>,
    pub children: Vec<ReplyView>,
}

/// A user with their authored-thread list expanded in append order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserPostsView {
    pub user: UserModel,
    pub threads: Vec<UserPostView>,
}

/// A user with their community memberships resolved.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserProfileView {
    pub user: UserModel,
    pub communities: Vec<CommunityModel>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserPage {
    pub users: Vec<UserModel>,
    pub has_next: bool,
}

/// A reply somebody left on one of the user's threads.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityView {
    pub thread: ThreadModel,
    pub author: AuthorSummary,
}
