pub mod account;
pub mod api;
pub mod contact;
pub mod enroll;
pub mod health;
pub mod quiz;
pub mod staff;

use std::convert::Infallible;

use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Request},
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tracing::warn;

use crate::forms::{FieldErrors, FormFields};
use crate::state::AppState;

pub const INVALID_FORM_MESSAGE: &str = "Por favor, revisa los errores en el formulario.";

/// Who is asking: XHR and token-bearing callers get JSON, browsers get
/// rendered pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Programmatic,
    Interactive,
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Origin {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let is_xhr = parts
            .headers
            .get("x-requested-with")
            .and_then(|v| v.to_str().ok())
            .map(|v| v.eq_ignore_ascii_case("XMLHttpRequest"))
            .unwrap_or(false);
        let has_token = parts.headers.contains_key(header::AUTHORIZATION);
        Ok(if is_xhr || has_token {
            Origin::Programmatic
        } else {
            Origin::Interactive
        })
    }
}

/// A posted form body. Never rejects: an unreadable body arrives as field
/// errors so handlers answer with their usual invalid-form response.
pub struct FormBody(pub Result<FormFields, FieldErrors>);

#[async_trait]
impl<S: Send + Sync> FromRequest<S> for FormBody {
    type Rejection = Infallible;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        let fields = match Bytes::from_request(req, state).await {
            Ok(body) => FormFields::parse(content_type.as_deref(), &body),
            Err(rejection) => {
                warn!("Unreadable form body: {}", rejection.body_text());
                Err(FieldErrors::unreadable())
            }
        };
        Ok(FormBody(fields))
    }
}

/// 400 `{success: false, errors, user_message}` for programmatic callers.
pub fn invalid_form(errors: &FieldErrors) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "success": false,
            "errors": errors,
            "user_message": INVALID_FORM_MESSAGE,
        })),
    )
        .into_response()
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Public pages
        .route("/", get(quiz::quiz_form).post(quiz::submit_quiz_handler))
        .route("/enroll", get(enroll::enroll_form).post(enroll::enroll_handler))
        .route("/contact", get(contact::contact_form).post(contact::contact_handler))
        .route("/about", get(contact::about))
        // Accounts
        .route("/login", get(account::login_form).post(account::login))
        .route("/logout", post(account::logout))
        .route("/register", get(account::register_form).post(account::register))
        .route("/accounts/redirect", get(account::login_redirect))
        .route("/no-admin", get(account::no_admin))
        // Staff
        .route("/staff", get(staff::dashboard))
        .route("/staff/records", get(staff::list_records))
        .route(
            "/staff/records/:id/edit",
            get(staff::edit_record_form).post(staff::edit_record),
        )
        .route("/staff/records/:id/delete", post(staff::delete_record))
        // CRUD API
        .route(
            "/api/v1/quiz-records",
            get(api::list_records).post(api::create_record),
        )
        .route(
            "/api/v1/quiz-records/:id",
            get(api::get_record)
                .put(api::update_record)
                .delete(api::delete_record),
        )
        .route("/api/v1/translate", get(api::translate))
        .with_state(state)
}
