use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::auth::Caller;
use crate::errors::AppError;
use crate::forms::validate_submission;
use crate::models::quiz::{QuizRecord, QuizSubmission};
use crate::profile::scoring::score_answers;
use crate::state::AppState;
use crate::translation::Translation;

/// Request bodies carry no profile; a client-supplied `profile` key is
/// ignored and the value is always derived from the answers.
fn validated(
    payload: Result<Json<QuizSubmission>, JsonRejection>,
) -> Result<(QuizSubmission, String), AppError> {
    let Json(submission) = payload.map_err(|e| AppError::Validation(e.body_text()))?;
    let submission = validate_submission(submission).map_err(AppError::InvalidFields)?;
    let profile = score_answers(&submission.answers).label();
    Ok((submission, profile))
}

/// GET /api/v1/quiz-records
pub async fn list_records(State(state): State<AppState>) -> Result<Json<Vec<QuizRecord>>, AppError> {
    Ok(Json(state.store.list().await?))
}

/// GET /api/v1/quiz-records/:id
pub async fn get_record(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<QuizRecord>, AppError> {
    Ok(Json(state.store.get(id).await?))
}

/// POST /api/v1/quiz-records
pub async fn create_record(
    State(state): State<AppState>,
    caller: Caller,
    payload: Result<Json<QuizSubmission>, JsonRejection>,
) -> Result<(StatusCode, Json<QuizRecord>), AppError> {
    let user = caller.require_authenticated()?;
    let (submission, profile) = validated(payload)?;

    let record = state.store.create(&submission, &profile).await?;
    info!("{} created quiz record {}", user.username, record.id);
    Ok((StatusCode::CREATED, Json(record)))
}

/// PUT /api/v1/quiz-records/:id
pub async fn update_record(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
    payload: Result<Json<QuizSubmission>, JsonRejection>,
) -> Result<Json<QuizRecord>, AppError> {
    let user = caller.require_authenticated()?;
    let (submission, profile) = validated(payload)?;

    let record = state.store.update(id, &submission, &profile).await?;
    info!("{} updated quiz record {id}", user.username);
    Ok(Json(record))
}

/// DELETE /api/v1/quiz-records/:id
pub async fn delete_record(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let user = caller.require_authenticated()?;
    state.store.delete(id).await?;
    info!("{} deleted quiz record {id}", user.username);
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct TranslateQuery {
    pub text: Option<String>,
}

/// GET /api/v1/translate?text=...
pub async fn translate(
    State(state): State<AppState>,
    Query(query): Query<TranslateQuery>,
) -> Result<Json<Value>, AppError> {
    let text = query
        .text
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Validation("Query parameter 'text' is required".to_string()))?;

    match state.translator.translate(text, &state.target_lang).await {
        Translation::Available(translation) => Ok(Json(json!({
            "original_text": text,
            "translation": translation,
        }))),
        Translation::Unavailable => Err(AppError::UpstreamUnavailable(
            "Translation service unavailable".to_string(),
        )),
    }
}
