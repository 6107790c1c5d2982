use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;

use crate::routes::paths;

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// Identity record from the `users` table. Resolved by the auth extractor and
/// used to validate the per-user post listing.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq, Eq)]
#[ts(export)]
pub struct User {
    pub id: i32,
    pub username: String,
}

/// Post
///
/// A row of the `posts` table.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq, Eq)]
#[ts(export)]
pub struct Post {
    pub id: i32,
    pub body: String,
    // Creation time, overwritten on every update.
    #[ts(type = "string")]
    pub timestamp: DateTime<Utc>,
    // FK to users.id (Owner).
    pub user_id: i32,
}

/// NewPost
///
/// A validated post ready for insertion. Only built by the create handler, after
/// the owner has been forced to the authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub body: String,
    pub user_id: i32,
}

/// PostChanges
///
/// The column updates applied by `Repository::update_post`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostChanges {
    pub timestamp: DateTime<Utc>,
    pub body: Option<String>,
}

// --- Request Payloads (Input Schemas) ---

/// CreatePostRequest
///
/// Input payload for POST /posts. Every field is optional so that a missing
/// `body` is reported as a validation error rather than a deserialization one.
/// Unknown fields, including a client-supplied `user_id`, are ignored.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreatePostRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "hello")]
    pub body: Option<String>,
}

/// UpdatePostRequest
///
/// Partial update payload for PUT /posts/{id}. Absent fields are left untouched.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdatePostRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

// --- Response Schemas (Output) ---

/// PostLinks
///
/// Navigation links embedded in every post representation.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq, Eq)]
#[ts(export)]
pub struct PostLinks {
    #[serde(rename = "self")]
    pub self_link: String,
    pub user_posts: String,
}

/// PostResponse
///
/// The JSON representation of a post returned by every post endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq, Eq)]
#[ts(export)]
pub struct PostResponse {
    pub id: i32,
    pub body: String,
    #[ts(type = "string")]
    pub timestamp: DateTime<Utc>,
    pub user_id: i32,
    #[serde(rename = "_links")]
    pub links: PostLinks,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        let links = PostLinks {
            self_link: paths::post(post.id),
            user_posts: paths::user_posts(post.user_id),
        };
        Self {
            id: post.id,
            body: post.body,
            timestamp: post.timestamp,
            user_id: post.user_id,
            links,
        }
    }
}
