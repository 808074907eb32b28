//! One-off import of posts from a JSON seed file.
//!
//! Usage: `import_posts [path]` (defaults to `SEED_FILE`, then `suits.json`).

use std::path::PathBuf;

use vocab_server::{config::AppConfig, db, import, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init_tracing();

    let config = AppConfig::from_env()?;
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| config.seed_file.clone());

    let pool = db::connect(&config.database_url).await?;
    db::run_migrations(&pool).await?;

    let outcome = import::import_posts(&pool, &path).await?;
    tracing::info!(?outcome, path = %path.display(), "done");
    pool.close().await;
    Ok(())
}
