use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{post, put},
};

/// Authenticated Router Module
///
/// Write endpoints. The router built by `create_router` wraps these in the
/// `require_auth` middleware, and each handler also takes the `AuthUser`
/// extractor to learn who the caller is.
pub fn authenticated_routes() -> Router<AppState> {
    Router::new()
        // POST /posts
        // Creates a post owned by the caller; 201 with a Location header.
        .route("/posts", post(handlers::create_post))
        // PUT /posts/{id}
        // Rewrites the timestamp and applies the submitted fields.
        .route("/posts/{id}", put(handlers::update_post))
}
