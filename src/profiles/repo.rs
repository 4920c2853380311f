use std::collections::HashMap;

use axum::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::repo_types::{Profile, ProfileFields};

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get(&self, user_id: Uuid) -> anyhow::Result<Option<Profile>>;
    /// Creates or replaces the profile in a single statement.
    async fn upsert(&self, user_id: Uuid, fields: ProfileFields) -> anyhow::Result<Profile>;
}

#[derive(Clone)]
pub struct PgProfileStore {
    db: PgPool,
}

impl PgProfileStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn get(&self, user_id: Uuid) -> anyhow::Result<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            SELECT user_id, username, bio, avatar_url, updated_at
            FROM profiles
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(profile)
    }

    async fn upsert(&self, user_id: Uuid, fields: ProfileFields) -> anyhow::Result<Profile> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO profiles (user_id, username, bio, avatar_url, updated_at)
            VALUES ($1, $2, $3, $4, now())
            ON CONFLICT (user_id) DO UPDATE
               SET username = EXCLUDED.username,
                   bio = EXCLUDED.bio,
                   avatar_url = EXCLUDED.avatar_url,
                   updated_at = now()
            RETURNING user_id, username, bio, avatar_url, updated_at
            "#,
        )
        .bind(user_id)
        .bind(fields.username)
        .bind(fields.bio)
        .bind(fields.avatar_url)
        .fetch_one(&self.db)
        .await?;
        Ok(profile)
    }
}

#[derive(Default)]
pub struct MemoryProfileStore {
    profiles: RwLock<HashMap<Uuid, Profile>>,
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn get(&self, user_id: Uuid) -> anyhow::Result<Option<Profile>> {
        Ok(self.profiles.read().await.get(&user_id).cloned())
    }

    async fn upsert(&self, user_id: Uuid, fields: ProfileFields) -> anyhow::Result<Profile> {
        let profile = Profile {
            user_id,
            username: fields.username,
            bio: fields.bio,
            avatar_url: fields.avatar_url,
            updated_at: OffsetDateTime::now_utc(),
        };
        self.profiles.write().await.insert(user_id, profile.clone());
        Ok(profile)
    }
}
