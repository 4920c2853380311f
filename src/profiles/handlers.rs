use axum::{
    extract::State,
    routing::{get, put},
    Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{dto::UpdateProfileRequest, repo_types::{Profile, ProfileFields}};
use crate::{
    auth::extractors::SessionUser,
    error::{method_not_allowed, AppError, AppResult, Json, Path},
    state::AppState,
};

pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/profile", put(update_profile).fallback(method_not_allowed))
        .route("/profile/:user_id", get(get_profile).fallback(method_not_allowed))
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<Profile>> {
    state
        .profiles
        .get(user_id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound("Profile not found"))
}

/// Upserts the caller's own profile.
#[instrument(skip_all)]
pub async fn update_profile(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> AppResult<Json<Profile>> {
    let fields = ProfileFields::try_from(payload)?;
    let profile = state.profiles.upsert(user.id, fields).await?;
    info!(user_id = %user.id, "profile updated");
    Ok(Json(profile))
}
