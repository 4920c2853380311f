use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::CookieJar;
use tracing::warn;

use super::{cookie::SESSION_COOKIE, jwt::TokenError, repo_types::User};
use crate::{error::AppError, state::AppState};

/// The authenticated user behind the `token` cookie. Read-only: extracting
/// it never touches the store beyond a lookup by id.
pub struct SessionUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for SessionUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_owned())
            .filter(|v| !v.is_empty())
            .ok_or(AppError::Unauthorized("Unauthorized: no token provided"))?;

        let user_id = state.keys.validate(&token).map_err(|e| {
            match e {
                TokenError::Expired => warn!("expired session token"),
                TokenError::Invalid => warn!("invalid session token"),
            }
            AppError::Unauthorized("Invalid or expired token")
        })?;

        let user = state
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::NotFound("User not found"))?;

        Ok(SessionUser(user))
    }
}
