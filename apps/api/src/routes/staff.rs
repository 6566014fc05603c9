use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Json,
};
use serde_json::json;
use tracing::info;

use crate::auth::Caller;
use crate::errors::AppError;
use crate::forms::QuizForm;
use crate::profile::scoring::score_answers;
use crate::render;
use crate::routes::{invalid_form, FormBody, Origin};
use crate::state::AppState;

const RECORDS_PATH: &str = "/staff/records";

/// GET /staff
pub async fn dashboard(caller: Caller, origin: Origin) -> Result<Html<String>, AppError> {
    let user = caller.require_staff_for(origin)?;
    Ok(Html(render::dashboard_page(&user.username)))
}

/// GET /staff/records
pub async fn list_records(
    State(state): State<AppState>,
    caller: Caller,
    origin: Origin,
) -> Result<Response, AppError> {
    caller.require_staff_for(origin)?;
    let records = state.store.list().await?;

    Ok(match origin {
        Origin::Programmatic => Json(records).into_response(),
        Origin::Interactive => Html(render::records_page(&records)).into_response(),
    })
}

/// GET /staff/records/:id/edit
pub async fn edit_record_form(
    State(state): State<AppState>,
    caller: Caller,
    origin: Origin,
    Path(id): Path<i64>,
) -> Result<Html<String>, AppError> {
    caller.require_staff_for(origin)?;
    let record = state.store.get(id).await?;
    Ok(Html(render::edit_record_page(
        id,
        &QuizForm::from_record(&record),
        None,
    )))
}

/// POST /staff/records/:id/edit
///
/// The stored profile is recomputed from the edited answers.
pub async fn edit_record(
    State(state): State<AppState>,
    caller: Caller,
    origin: Origin,
    Path(id): Path<i64>,
    FormBody(fields): FormBody,
) -> Result<Response, AppError> {
    let user = caller.require_staff_for(origin)?;

    let form = fields
        .as_ref()
        .map(QuizForm::from_fields)
        .unwrap_or_default();
    let submission = match fields.and_then(|_| form.validate()) {
        Ok(submission) => submission,
        Err(errors) => {
            return Ok(match origin {
                Origin::Programmatic => invalid_form(&errors),
                Origin::Interactive => (
                    StatusCode::BAD_REQUEST,
                    Html(render::edit_record_page(id, &form, Some(&errors))),
                )
                    .into_response(),
            });
        }
    };

    let profile = score_answers(&submission.answers).label();
    let record = state.store.update(id, &submission, &profile).await?;
    info!("{} updated quiz record {}", user.username, record.id);

    Ok(match origin {
        Origin::Programmatic => Json(json!({
            "success": true,
            "profile": record.profile,
        }))
        .into_response(),
        Origin::Interactive => Redirect::to(RECORDS_PATH).into_response(),
    })
}

/// POST /staff/records/:id/delete
pub async fn delete_record(
    State(state): State<AppState>,
    caller: Caller,
    origin: Origin,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let user = caller.require_staff_for(origin)?;
    state.store.delete(id).await?;
    info!("{} deleted quiz record {id}", user.username);

    Ok(match origin {
        Origin::Programmatic => Json(json!({
            "success": true,
            "id": id,
            "message": "Consulta eliminada.",
        }))
        .into_response(),
        Origin::Interactive => Redirect::to(RECORDS_PATH).into_response(),
    })
}
