use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::forms::QuizForm;
use crate::notify::Delivery;
use crate::profile::courses::CourseEntry;
use crate::profile::submission::{submit_quiz, StatusTier, SubmissionOutcome};
use crate::render;
use crate::routes::{invalid_form, FormBody, Origin};
use crate::state::AppState;
use crate::translation::Translation;

#[derive(Debug, Serialize)]
pub struct QuizResultResponse {
    pub success: bool,
    pub record_id: Option<i64>,
    pub profile: String,
    pub description: String,
    pub description_translation: Translation,
    pub courses: Vec<CourseEntry>,
    pub name: String,
    pub email: String,
    pub user_message: &'static str,
    pub status_class: StatusTier,
    /// `null` when the report email failed.
    pub delivery: Option<Delivery>,
}

impl From<SubmissionOutcome> for QuizResultResponse {
    fn from(outcome: SubmissionOutcome) -> Self {
        Self {
            success: true,
            record_id: outcome.record.as_ref().map(|r| r.id),
            profile: outcome.report.profile,
            description: outcome.report.description,
            description_translation: outcome.report.description_translation,
            courses: outcome.report.courses,
            name: outcome.submission.name,
            email: outcome.submission.email,
            user_message: outcome.status.user_message(),
            status_class: outcome.status,
            delivery: outcome.delivery,
        }
    }
}

/// GET /
pub async fn quiz_form() -> Html<String> {
    Html(render::quiz_page(&QuizForm::default(), None, None))
}

/// POST /
///
/// Validates the quiz, then runs score → recommend → translate → persist →
/// notify. XHR callers get the result as JSON; browsers get the page back
/// with results rendered.
pub async fn submit_quiz_handler(
    State(state): State<AppState>,
    origin: Origin,
    FormBody(fields): FormBody,
) -> Response {
    let form = fields
        .as_ref()
        .map(QuizForm::from_fields)
        .unwrap_or_default();
    let submission = match fields.and_then(|_| form.validate()) {
        Ok(submission) => submission,
        Err(errors) => {
            return match origin {
                Origin::Programmatic => invalid_form(&errors),
                Origin::Interactive => (
                    StatusCode::BAD_REQUEST,
                    Html(render::quiz_page(&form, Some(&errors), None)),
                )
                    .into_response(),
            };
        }
    };

    let outcome = submit_quiz(&state, submission).await;

    match origin {
        Origin::Programmatic => Json(QuizResultResponse::from(outcome)).into_response(),
        Origin::Interactive => Html(render::quiz_page(&form, None, Some(&outcome))).into_response(),
    }
}
