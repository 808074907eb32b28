use vocab_server::{app, db, import, state::AppState, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init_tracing();

    let app_state = AppState::init().await?;
    db::run_migrations(&app_state.db).await?;

    if app_state.config.import_on_startup {
        match import::import_posts(&app_state.db, &app_state.config.seed_file).await {
            Ok(outcome) => tracing::info!(?outcome, "seed import"),
            Err(e) => tracing::warn!(error = ?e, "seed import failed; continuing"),
        }
    }

    let config = app_state.config.clone();
    app::serve(app::build_app(app_state), &config).await
}
