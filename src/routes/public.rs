use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Read-only endpoints available to anonymous clients. Mounted under
/// [`API_PREFIX`](super::API_PREFIX).
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /posts?page=...&per_page=...
        // Paginated listing of every post.
        .route("/posts", get(handlers::get_posts))
        // GET /posts/{id}
        // A single post, or a bare 404.
        .route("/posts/{id}", get(handlers::get_post))
        // GET /user-{id}/posts?page=...&per_page=...
        // Paginated listing of one user's posts; 400 when the user is unknown.
        .route("/user-{id}/posts", get(handlers::get_user_posts))
}
