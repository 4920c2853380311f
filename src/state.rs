use std::sync::Arc;

use crate::{
    auth::{
        jwt::JwtKeys,
        repo::{MemoryUserStore, PgUserStore, UserStore},
    },
    config::AppConfig,
    db,
    posts::repo::{MemoryPostStore, PgPostStore, PostStore},
    profiles::repo::{MemoryProfileStore, PgProfileStore, ProfileStore},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub keys: JwtKeys,
    pub users: Arc<dyn UserStore>,
    pub profiles: Arc<dyn ProfileStore>,
    pub posts: Arc<dyn PostStore>,
}

impl AppState {
    /// Reads configuration, builds signing keys and opens the stores.
    /// Fails before serving anything if the JWT secret is missing.
    pub async fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;
        let keys = JwtKeys::new(&config.jwt)?;

        let Some(database_url) = config.database_url.clone() else {
            tracing::warn!("DATABASE_URL not set; using in-memory stores, data is lost on exit");
            return Ok(Self::in_memory_with_keys(config, keys));
        };

        let pool = db::connect(&database_url, config.database_max_connections).await?;
        db::migrate(&pool).await?;

        Ok(Self {
            config: Arc::new(config),
            keys,
            users: Arc::new(PgUserStore::new(pool.clone())),
            profiles: Arc::new(PgProfileStore::new(pool.clone())),
            posts: Arc::new(PgPostStore::new(pool)),
        })
    }

    fn in_memory_with_keys(config: AppConfig, keys: JwtKeys) -> Self {
        Self {
            config: Arc::new(config),
            keys,
            users: Arc::new(MemoryUserStore::default()),
            profiles: Arc::new(MemoryProfileStore::default()),
            posts: Arc::new(MemoryPostStore::default()),
        }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        let config = AppConfig::for_tests();
        let keys = JwtKeys::new(&config.jwt).expect("test config is valid");
        Self::in_memory_with_keys(config, keys)
    }
}
