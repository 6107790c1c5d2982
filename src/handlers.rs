use crate::{
    AppState,
    auth::AuthUser,
    error::{ApiError, ErrorBody},
    models::{CreatePostRequest, NewPost, PostChanges, PostResponse, UpdatePostRequest},
    pagination::{Collection, PageRequest, PaginationParams},
    routes::paths,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use chrono::Utc;

pub const NO_SUCH_USER: &str = "No such user";
pub const EMPTY_POST_BODY: &str = "Post body is empty! No post created.";

// --- Public Handlers ---

/// get_post
///
/// [Public Route] Retrieves a single post by id. A missing post answers with a
/// bare 404.
#[utoipa::path(
    get,
    path = "/api/posts/{id}",
    params(("id" = i32, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Found", body = PostResponse),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<PostResponse>, ApiError> {
    let post = state.repo.get_post(id).await?.ok_or(ApiError::NotFound)?;
    Ok(Json(post.into()))
}

/// get_posts
///
/// [Public Route] Paginated listing of every post.
#[utoipa::path(
    get,
    path = "/api/posts",
    params(PaginationParams),
    responses((status = 200, description = "Page of posts", body = Collection<PostResponse>))
)]
pub async fn get_posts(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Collection<PostResponse>>, ApiError> {
    let request = PageRequest::from(params);
    let page = state.repo.list_posts(request).await?;
    Ok(Json(Collection::new(
        page.map(PostResponse::from),
        request,
        paths::posts_page,
    )))
}

/// get_user_posts
///
/// [Public Route] Paginated listing of one user's posts. An unknown user is a
/// 400 with the structured error body.
#[utoipa::path(
    get,
    path = "/api/user-{id}/posts",
    params(("id" = i32, Path, description = "User ID"), PaginationParams),
    responses(
        (status = 200, description = "Page of posts", body = Collection<PostResponse>),
        (status = 400, description = "No such user", body = ErrorBody)
    )
)]
pub async fn get_user_posts(
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Collection<PostResponse>>, ApiError> {
    if state.repo.get_user(user_id).await?.is_none() {
        return Err(ApiError::bad_request(NO_SUCH_USER));
    }

    let request = PageRequest::from(params);
    let page = state.repo.list_user_posts(user_id, request).await?;
    Ok(Json(Collection::new(
        page.map(PostResponse::from),
        request,
        |request| paths::user_posts_page(user_id, request),
    )))
}

// --- Authenticated Handlers ---

/// create_post
///
/// [Authenticated Route] Creates a post owned by the caller. The owner always
/// comes from `AuthUser`; any `user_id` in the payload is ignored.
#[utoipa::path(
    post,
    path = "/api/posts",
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Created", body = PostResponse,
            headers(("Location" = String, description = "URL of the new post"))),
        (status = 400, description = "Empty body", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody)
    ),
    security(("bearer_token" = []))
)]
pub async fn create_post(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    payload: Option<Json<CreatePostRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload.unwrap_or_default();

    let body = payload
        .body
        .filter(|body| !body.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request(EMPTY_POST_BODY))?;

    let post = state.repo.create_post(NewPost { body, user_id }).await?;
    tracing::info!(post_id = post.id, user_id, "post created");

    let location = paths::post(post.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(PostResponse::from(post)),
    ))
}

/// update_post
///
/// [Authenticated Route] Rewrites the timestamp to now and applies the
/// submitted fields.
///
/// *Authorization*: any authenticated user may update any post; no ownership
/// check is made.
#[utoipa::path(
    put,
    path = "/api/posts/{id}",
    params(("id" = i32, Path, description = "Post ID")),
    request_body = UpdatePostRequest,
    responses(
        (status = 200, description = "Updated", body = PostResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_token" = []))
)]
pub async fn update_post(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    payload: Option<Json<UpdatePostRequest>>,
) -> Result<Json<PostResponse>, ApiError> {
    let Json(payload) = payload.unwrap_or_default();

    let changes = PostChanges {
        timestamp: Utc::now(),
        body: payload.body,
    };

    let post = state
        .repo
        .update_post(id, changes)
        .await?
        .ok_or(ApiError::NotFound)?;

    if post.user_id != user_id {
        tracing::info!(post_id = id, owner_id = post.user_id, user_id, "post updated by non-owner");
    } else {
        tracing::info!(post_id = id, user_id, "post updated");
    }

    Ok(Json(post.into()))
}
