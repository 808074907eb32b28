use axum::{extract::State, routing::get, Json, Router};
use tracing::instrument;

use super::{repo, repo_types::Post};
use crate::{error::AppError, extract::LooseId, state::AppState};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_posts))
        .route("/posts/:id", get(get_post))
}

#[instrument(skip(state))]
pub async fn list_posts(State(state): State<AppState>) -> Result<Json<Vec<Post>>, AppError> {
    let posts = repo::list_posts(&state.db).await?;
    Ok(Json(posts))
}

#[instrument(skip(state))]
pub async fn get_post(
    State(state): State<AppState>,
    LooseId(id): LooseId,
) -> Result<Json<Option<Post>>, AppError> {
    let Some(id) = id else {
        return Ok(Json(None));
    };
    let post = repo::get_post(&state.db, id).await?;
    Ok(Json(post))
}
