use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::warn;

use crate::forms::EnrollmentForm;
use crate::render;
use crate::routes::{invalid_form, FormBody, Origin};
use crate::state::AppState;

const ENROLLED_MESSAGE: &str = "¡Inscripción recibida con éxito!";

/// GET /enroll
pub async fn enroll_form() -> Html<String> {
    Html(render::enroll_page(None, None))
}

/// POST /enroll
///
/// Accepts the course checkboxes from the results page (repeated `courses`
/// keys) or a JSON body from XHR callers.
pub async fn enroll_handler(
    State(state): State<AppState>,
    origin: Origin,
    FormBody(fields): FormBody,
) -> Response {
    let enrollment = match fields.and_then(|f| EnrollmentForm::from_fields(&f).validate()) {
        Ok(enrollment) => enrollment,
        Err(errors) => {
            return match origin {
                Origin::Programmatic => invalid_form(&errors),
                Origin::Interactive => (
                    StatusCode::BAD_REQUEST,
                    Html(render::enroll_page(None, Some(&errors))),
                )
                    .into_response(),
            };
        }
    };

    let sent = match state.notifier.send_enrollment(&enrollment).await {
        Ok(_) => true,
        Err(e) => {
            warn!("Enrollment confirmation for {} failed: {e}", enrollment.email);
            false
        }
    };

    let (status, message) = if sent {
        (StatusCode::OK, ENROLLED_MESSAGE.to_string())
    } else {
        (
            StatusCode::BAD_REQUEST,
            format!(
                "Inscripción recibida, pero hubo un error al enviar la confirmación a {}.",
                enrollment.email
            ),
        )
    };

    match origin {
        Origin::Programmatic => (
            status,
            Json(json!({
                "success": sent,
                "user_message": message,
                "name": enrollment.name,
                "email": enrollment.email,
                "courses": enrollment.courses,
            })),
        )
            .into_response(),
        Origin::Interactive => (
            status,
            Html(render::enroll_page(Some((&enrollment, &message, sent)), None)),
        )
            .into_response(),
    }
}
