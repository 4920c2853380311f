use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Profile record, keyed by the owning user's id. Lives apart from `users`.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Profile {
    pub user_id: Uuid,
    pub username: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Validated replacement values for a profile upsert.
#[derive(Debug, Clone, Default)]
pub struct ProfileFields {
    pub username: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}
