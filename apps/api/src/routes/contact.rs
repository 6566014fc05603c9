use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::forms::ContactForm;
use crate::render;
use crate::routes::{invalid_form, FormBody, Origin};
use crate::state::AppState;

const SENT_MESSAGE: &str = "¡Mensaje enviado con éxito! Te responderemos pronto.";
const FAILED_MESSAGE: &str = "Hubo un error al enviar el mensaje. Intenta más tarde.";

/// GET /contact
pub async fn contact_form() -> Html<String> {
    Html(render::contact_page(&ContactForm::default(), None, None))
}

/// POST /contact
pub async fn contact_handler(
    State(state): State<AppState>,
    origin: Origin,
    FormBody(fields): FormBody,
) -> Response {
    let form = fields
        .as_ref()
        .map(ContactForm::from_fields)
        .unwrap_or_default();
    let message = match fields.and_then(|_| form.validate()) {
        Ok(message) => message,
        Err(errors) => {
            return match origin {
                Origin::Programmatic => invalid_form(&errors),
                Origin::Interactive => (
                    StatusCode::BAD_REQUEST,
                    Html(render::contact_page(&form, Some(&errors), None)),
                )
                    .into_response(),
            };
        }
    };

    let sent = state.notifier.send_contact(&message).await.is_ok();
    let user_message = if sent { SENT_MESSAGE } else { FAILED_MESSAGE };

    match origin {
        Origin::Programmatic => Json(json!({
            "success": sent,
            "user_message": user_message,
        }))
        .into_response(),
        // A sent message clears the form; a failed one keeps it for a retry.
        Origin::Interactive if sent => {
            Html(render::contact_page(&ContactForm::default(), None, Some(user_message))).into_response()
        }
        Origin::Interactive => {
            Html(render::contact_page(&form, None, Some(user_message))).into_response()
        }
    }
}

/// GET /about
pub async fn about() -> Html<String> {
    Html(render::about_page())
}
