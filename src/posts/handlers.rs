use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{CreatePostRequest, Pagination, UpdatePostRequest},
    repo_types::{NewPost, Post},
};
use crate::{
    auth::extractors::SessionUser,
    error::{method_not_allowed, AppError, AppResult, Json, Path, Query},
    state::AppState,
};

pub fn post_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/posts",
            get(list_posts).post(create_post).fallback(method_not_allowed),
        )
        .route(
            "/posts/:id",
            get(get_post)
                .put(update_post)
                .delete(delete_post)
                .fallback(method_not_allowed),
        )
}

/// Dashboard listing: the caller's posts, newest first.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn list_posts(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
    Query(p): Query<Pagination>,
) -> AppResult<Json<Vec<Post>>> {
    let (limit, offset) = p.clamped();
    let posts = state.posts.list_by_author(user.id, limit, offset).await?;
    Ok(Json(posts))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create_post(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
    Json(payload): Json<CreatePostRequest>,
) -> AppResult<(StatusCode, Json<Post>)> {
    let new_post = NewPost::try_from(payload).inspect_err(|e| {
        warn!(error = %e, "post rejected");
    })?;
    let post = state.posts.create(user.id, new_post).await?;
    info!(post_id = %post.id, published = post.published, "post created");
    Ok((StatusCode::CREATED, Json(post)))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn get_post(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Post>> {
    state
        .posts
        .get(user.id, id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound("Post not found"))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn update_post(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePostRequest>,
) -> AppResult<Json<Post>> {
    let current = state
        .posts
        .get(user.id, id)
        .await?
        .ok_or(AppError::NotFound("Post not found"))?;
    let changes = payload.merge(&current)?;
    let post = state
        .posts
        .update(user.id, id, changes)
        .await?
        .ok_or(AppError::NotFound("Post not found"))?;
    info!(post_id = %post.id, "post updated");
    Ok(Json(post))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete_post(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    if !state.posts.delete(user.id, id).await? {
        return Err(AppError::NotFound("Post not found"));
    }
    info!(post_id = %id, "post deleted");
    Ok(StatusCode::NO_CONTENT)
}
