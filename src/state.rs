use std::sync::Arc;

use crate::config::{AppConfig, UserStore};
use crate::db;
use crate::users::{
    memory::InMemoryUserRepo,
    repo::{PgUserRepo, UserRepo},
    services::UserService,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: UserService,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let repo = match config.user_store {
            UserStore::Postgres => {
                let pool = db::connect(&config).await?;
                // Run migrations if present
                if let Err(e) = db::migrate(&pool).await {
                    tracing::warn!(error = %e, "migration failed; continuing");
                }
                Arc::new(PgUserRepo::new(pool)) as Arc<dyn UserRepo>
            }
            UserStore::Memory => {
                tracing::warn!("USER_STORE=memory: users are not persisted");
                Arc::new(InMemoryUserRepo::new()) as Arc<dyn UserRepo>
            }
        };

        Ok(Self::from_parts(config, repo))
    }

    pub fn from_parts(config: Arc<AppConfig>, repo: Arc<dyn UserRepo>) -> Self {
        Self {
            config,
            users: UserService::new(repo),
        }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        let config = Arc::new(AppConfig {
            host: "127.0.0.1".into(),
            port: 0,
            user_store: UserStore::Memory,
            database_url: None,
            db_max_connections: 1,
        });
        Self::from_parts(config, Arc::new(InMemoryUserRepo::new()))
    }
}
