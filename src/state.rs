use crate::config::AppConfig;
use crate::db;
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let db = db::connect(&config.database_url).await?;
        Ok(Self { db, config })
    }

    /// In-memory store with the schema applied, for tests.
    #[cfg(test)]
    pub async fn fake() -> Self {
        let db = db::connect_in_memory().await.expect("in-memory pool ok");
        db::run_migrations(&db).await.expect("migrations ok");

        let config = Arc::new(AppConfig {
            database_url: "sqlite::memory:".into(),
            host: "127.0.0.1".into(),
            port: 0,
            seed_file: "suits.json".into(),
            import_on_startup: false,
        });
        Self { db, config }
    }
}
