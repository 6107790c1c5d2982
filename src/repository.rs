use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tokio::sync::RwLock;

use crate::{
    error::RepositoryError,
    models::{NewPost, Post, PostChanges, User},
    pagination::{Page, PageRequest},
};

/// Repository Trait
///
/// The persistence contract used by the handlers and the auth extractor. Handlers
/// only see this trait, so the Postgres store and the in-memory store are
/// interchangeable.
///
/// **Send + Sync + async_trait** make `Arc<dyn Repository>` shareable across
/// Axum's task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn get_user(&self, id: i32) -> Result<Option<User>, RepositoryError>;

    // --- Post Retrieval ---
    async fn get_post(&self, id: i32) -> Result<Option<Post>, RepositoryError>;
    // All posts, ordered by id.
    async fn list_posts(&self, request: PageRequest) -> Result<Page<Post>, RepositoryError>;
    // Posts owned by `user_id`, ordered by id.
    async fn list_user_posts(
        &self,
        user_id: i32,
        request: PageRequest,
    ) -> Result<Page<Post>, RepositoryError>;

    // --- Post Actions ---
    // Stamps the creation time and returns the stored row.
    async fn create_post(&self, post: NewPost) -> Result<Post, RepositoryError>;
    // Returns None when no post has this id.
    async fn update_post(
        &self,
        id: i32,
        changes: PostChanges,
    ) -> Result<Option<Post>, RepositoryError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

const POST_COLUMNS: &str = "id, body, timestamp, user_id";

/// PostgresRepository
///
/// The `Repository` backed by PostgreSQL through a shared connection pool.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the embedded migrations under `migrations/`.
    pub async fn migrate(&self) -> Result<(), RepositoryError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    async fn fetch_page(
        &self,
        user_id: Option<i32>,
        request: PageRequest,
    ) -> Result<Page<Post>, RepositoryError> {
        // `$1 IS NULL` lets both listings share one pair of statements.
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE ($1::INT IS NULL OR user_id = $1)")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        let items = sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts \
             WHERE ($1::INT IS NULL OR user_id = $1) \
             ORDER BY id LIMIT $2 OFFSET $3"
        ))
        .bind(user_id)
        .bind(request.limit())
        .bind(request.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page {
            items,
            total: u64::try_from(total).unwrap_or_default(),
        })
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn get_user(&self, id: i32) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>("SELECT id, username FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn get_post(&self, id: i32) -> Result<Option<Post>, RepositoryError> {
        let post = sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(post)
    }

    async fn list_posts(&self, request: PageRequest) -> Result<Page<Post>, RepositoryError> {
        self.fetch_page(None, request).await
    }

    async fn list_user_posts(
        &self,
        user_id: i32,
        request: PageRequest,
    ) -> Result<Page<Post>, RepositoryError> {
        self.fetch_page(Some(user_id), request).await
    }

    /// create_post
    ///
    /// Single INSERT; the foreign key on `user_id` rejects unknown owners.
    async fn create_post(&self, post: NewPost) -> Result<Post, RepositoryError> {
        let created = sqlx::query_as::<_, Post>(&format!(
            "INSERT INTO posts (body, timestamp, user_id) VALUES ($1, $2, $3) \
             RETURNING {POST_COLUMNS}"
        ))
        .bind(post.body)
        .bind(Utc::now())
        .bind(post.user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    /// update_post
    ///
    /// Uses `COALESCE` so an absent body leaves the column untouched while the
    /// timestamp is always rewritten.
    async fn update_post(
        &self,
        id: i32,
        changes: PostChanges,
    ) -> Result<Option<Post>, RepositoryError> {
        let updated = sqlx::query_as::<_, Post>(&format!(
            "UPDATE posts SET timestamp = $2, body = COALESCE($3, body) WHERE id = $1 \
             RETURNING {POST_COLUMNS}"
        ))
        .bind(id)
        .bind(changes.timestamp)
        .bind(changes.body)
        .fetch_optional(&self.pool)
        .await?;
        Ok(updated)
    }
}

/// MemoryRepository
///
/// A `Repository` kept in process memory. Backs the test suites and mirrors the
/// Postgres semantics: ids are assigned sequentially from 1 and posts require an
/// existing owner.
#[derive(Default)]
pub struct MemoryRepository {
    tables: RwLock<Tables>,
}

#[derive(Default)]
struct Tables {
    users: BTreeMap<i32, User>,
    posts: BTreeMap<i32, Post>,
    last_post_id: i32,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with `users`.
    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        let tables = Tables {
            users: users.into_iter().map(|user| (user.id, user)).collect(),
            ..Tables::default()
        };
        Self {
            tables: RwLock::new(tables),
        }
    }

    pub async fn insert_user(&self, user: User) {
        self.tables.write().await.users.insert(user.id, user);
    }

    pub async fn post_count(&self) -> usize {
        self.tables.read().await.posts.len()
    }

    fn page_of<'a>(posts: impl Iterator<Item = &'a Post>, request: PageRequest) -> Page<Post> {
        let matching: Vec<&Post> = posts.collect();
        let skip = usize::try_from(request.offset()).unwrap_or(usize::MAX);
        let take = usize::try_from(request.limit()).unwrap_or_default();
        Page {
            items: matching.iter().skip(skip).take(take).map(|post| (*post).clone()).collect(),
            total: matching.len() as u64,
        }
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn get_user(&self, id: i32) -> Result<Option<User>, RepositoryError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn get_post(&self, id: i32) -> Result<Option<Post>, RepositoryError> {
        Ok(self.tables.read().await.posts.get(&id).cloned())
    }

    async fn list_posts(&self, request: PageRequest) -> Result<Page<Post>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(Self::page_of(tables.posts.values(), request))
    }

    async fn list_user_posts(
        &self,
        user_id: i32,
        request: PageRequest,
    ) -> Result<Page<Post>, RepositoryError> {
        let tables = self.tables.read().await;
        let owned = tables.posts.values().filter(|post| post.user_id == user_id);
        Ok(Self::page_of(owned, request))
    }

    async fn create_post(&self, post: NewPost) -> Result<Post, RepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&post.user_id) {
            return Err(RepositoryError::UnknownUser(post.user_id));
        }
        tables.last_post_id += 1;
        let created = Post {
            id: tables.last_post_id,
            body: post.body,
            timestamp: Utc::now(),
            user_id: post.user_id,
        };
        tables.posts.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_post(
        &self,
        id: i32,
        changes: PostChanges,
    ) -> Result<Option<Post>, RepositoryError> {
        let mut tables = self.tables.write().await;
        let Some(post) = tables.posts.get_mut(&id) else {
            return Ok(None);
        };
        post.timestamp = changes.timestamp;
        if let Some(body) = changes.body {
            post.body = body;
        }
        Ok(Some(post.clone()))
    }
}
