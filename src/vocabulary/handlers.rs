use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use tracing::{error, info, instrument, warn};

use super::{
    dto::{KeywordQuery, PayloadError},
    repo,
    repo_types::{NewVocabulary, Vocabulary},
    schema,
};
use crate::{error::AppError, extract::LooseId, state::AppState};

const CREATE_FAILED: &str = "failed to create vocabulary";
const UPDATE_FAILED: &str = "failed to update vocabulary";
const DELETE_FAILED: &str = "failed to delete vocabulary";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/vocabularys", get(list_vocabulary))
        .route("/vocabularies", post(create_vocabulary))
        .route(
            "/vocabularies/:id",
            get(get_vocabulary)
                .put(update_vocabulary)
                .delete(delete_vocabulary),
        )
}

fn validated(payload: Result<Json<Value>, JsonRejection>) -> Result<NewVocabulary, PayloadError> {
    let Json(body) = payload?;
    Ok(schema::validate(&body)?)
}

#[instrument(skip(state))]
pub async fn list_vocabulary(
    State(state): State<AppState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<Vec<Vocabulary>>, AppError> {
    let Query(pairs) = query.map_err(|e| {
        warn!(error = %e, "unreadable query string");
        AppError::BadRequest("invalid query")
    })?;
    let q = KeywordQuery::from_pairs(pairs);
    let rows = repo::list_vocabulary(&state.db, q.keyword.as_deref()).await?;
    Ok(Json(rows))
}

#[instrument(skip(state))]
pub async fn get_vocabulary(
    State(state): State<AppState>,
    LooseId(id): LooseId,
) -> Result<Json<Option<Vocabulary>>, AppError> {
    let Some(id) = id else {
        return Ok(Json(None));
    };
    let row = repo::get_vocabulary(&state.db, id).await?;
    Ok(Json(row))
}

/// Every failure here, store errors included, answers 400 with a generic message.
#[instrument(skip(state, payload))]
pub async fn create_vocabulary(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Vocabulary>, AppError> {
    let record = validated(payload).map_err(|e| {
        warn!(error = %e, "create vocabulary rejected");
        AppError::BadRequest(CREATE_FAILED)
    })?;

    match repo::create_vocabulary(&state.db, &record).await {
        Ok(row) => {
            info!(id = row.id, original = %row.original, "vocabulary created");
            Ok(Json(row))
        }
        Err(e) => {
            error!(error = ?e, "create vocabulary failed");
            Err(AppError::BadRequest(CREATE_FAILED))
        }
    }
}

#[instrument(skip(state, payload))]
pub async fn update_vocabulary(
    State(state): State<AppState>,
    LooseId(id): LooseId,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Option<Vocabulary>>, AppError> {
    let record = validated(payload).map_err(|e| {
        warn!(error = %e, "update vocabulary rejected");
        AppError::BadRequest(UPDATE_FAILED)
    })?;
    let Some(id) = id else {
        return Ok(Json(None));
    };

    repo::update_vocabulary(&state.db, id, &record)
        .await
        .map(Json)
        .map_err(|e| {
            error!(error = ?e, id, "update vocabulary failed");
            AppError::BadRequest(UPDATE_FAILED)
        })
}

#[instrument(skip(state))]
pub async fn delete_vocabulary(
    State(state): State<AppState>,
    LooseId(id): LooseId,
) -> Result<Json<Option<Vocabulary>>, AppError> {
    let Some(id) = id else {
        return Ok(Json(None));
    };

    match repo::delete_vocabulary(&state.db, id).await {
        Ok(row) => {
            if row.is_some() {
                info!(id, "vocabulary deleted");
            }
            Ok(Json(row))
        }
        Err(e) => {
            error!(error = ?e, id, "delete vocabulary failed");
            Err(AppError::BadRequest(DELETE_FAILED))
        }
    }
}
