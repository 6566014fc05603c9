use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Json,
};
use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};

use crate::auth::password::{hash_password, verify_password};
use crate::auth::{session, Caller, LOGIN_PATH, NO_ADMIN_PATH};
use crate::errors::AppError;
use crate::forms::{FieldErrors, LoginForm, RegistrationForm, NON_FIELD_ERRORS};
use crate::models::user::{NewUser, User};
use crate::render;
use crate::routes::{invalid_form, FormBody, Origin};
use crate::state::AppState;
use crate::store::StoreError;

const AFTER_LOGIN_PATH: &str = "/accounts/redirect";
const STAFF_HOME_PATH: &str = "/staff";
const INVALID_LOGIN: &str = "Por favor, introduzca un nombre de usuario y clave correctos.";
const USERNAME_TAKEN: &str = "Ya existe un usuario con este nombre.";

fn landing_path(user: &User) -> &'static str {
    if user.is_staff {
        STAFF_HOME_PATH
    } else {
        NO_ADMIN_PATH
    }
}

/// GET /login
pub async fn login_form() -> Html<String> {
    Html(render::login_page(None, None))
}

fn login_failed(origin: Origin, form: &LoginForm, errors: &FieldErrors) -> Response {
    match origin {
        Origin::Programmatic => invalid_form(errors),
        Origin::Interactive => (
            StatusCode::BAD_REQUEST,
            Html(render::login_page(form.username.as_deref(), Some(errors))),
        )
            .into_response(),
    }
}

/// POST /login
///
/// Checks the password and opens a session. Unknown users, wrong
/// passwords and accounts without a password all get the same message.
pub async fn login(
    State(state): State<AppState>,
    origin: Origin,
    FormBody(fields): FormBody,
) -> Result<Response, AppError> {
    let form = fields
        .as_ref()
        .map(LoginForm::from_fields)
        .unwrap_or_default();
    let (username, password) = match fields.and_then(|_| form.validate()) {
        Ok(credentials) => credentials,
        Err(errors) => return Ok(login_failed(origin, &form, &errors)),
    };

    let credentials = state.store.find_credentials(&username).await?;
    let user = match credentials {
        Some(c) => {
            let hash = c.password_hash.clone();
            let matches = tokio::task::spawn_blocking(move || {
                hash.is_some_and(|hash| verify_password(&password, &hash))
            })
            .await
            .unwrap_or(false);
            matches.then_some(c.user)
        }
        None => None,
    };
    let Some(user) = user else {
        warn!("Failed login for {username}");
        let mut errors = FieldErrors::default();
        errors.add(NON_FIELD_ERRORS, INVALID_LOGIN);
        return Ok(login_failed(origin, &form, &errors));
    };

    let token = session::new_token();
    state
        .store
        .create_session(&token, user.id, session::expires_at(Utc::now()))
        .await?;
    info!("{} logged in", user.username);

    let response = match origin {
        Origin::Programmatic => Json(json!({
            "success": true,
            "username": user.username,
            "redirect": landing_path(&user),
        }))
        .into_response(),
        Origin::Interactive => Redirect::to(AFTER_LOGIN_PATH).into_response(),
    };
    Ok(([(header::SET_COOKIE, session::session_cookie(&token))], response).into_response())
}

/// POST /logout
pub async fn logout(
    State(state): State<AppState>,
    origin: Origin,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    if let Some(token) = session::session_token(&headers) {
        state.store.delete_session(token).await?;
        info!("Session closed");
    }

    let response = match origin {
        Origin::Programmatic => Json(json!({ "success": true })).into_response(),
        Origin::Interactive => Redirect::to("/").into_response(),
    };
    Ok(([(header::SET_COOKIE, session::cleared_cookie())], response).into_response())
}

/// GET /accounts/redirect
///
/// Where a fresh login lands: staff go to the dashboard, everyone else to
/// the no-access page.
pub async fn login_redirect(caller: Caller) -> Redirect {
    match &caller.0 {
        Some(user) => Redirect::to(landing_path(user)),
        None => Redirect::to(LOGIN_PATH),
    }
}

/// GET /no-admin
pub async fn no_admin(caller: Caller) -> Response {
    match &caller.0 {
        Some(user) => Html(render::no_admin_page(&user.username)).into_response(),
        None => Redirect::to("/").into_response(),
    }
}

/// GET /register
pub async fn register_form() -> Html<String> {
    Html(render::register_page(&RegistrationForm::default(), None))
}

fn registration_failed(origin: Origin, form: &RegistrationForm, errors: &FieldErrors) -> Response {
    match origin {
        Origin::Programmatic => invalid_form(errors),
        Origin::Interactive => (
            StatusCode::BAD_REQUEST,
            Html(render::register_page(form, Some(errors))),
        )
            .into_response(),
    }
}

/// POST /register
///
/// Creates a regular (non-staff) account; staff access is granted
/// out of band.
pub async fn register(
    State(state): State<AppState>,
    origin: Origin,
    FormBody(fields): FormBody,
) -> Result<Response, AppError> {
    let form = fields
        .as_ref()
        .map(RegistrationForm::from_fields)
        .unwrap_or_default();
    let registration = match fields.and_then(|_| form.validate()) {
        Ok(registration) => registration,
        Err(errors) => return Ok(registration_failed(origin, &form, &errors)),
    };

    let new_user = NewUser {
        username: registration.username,
        password_hash: hash_password(&registration.password),
        api_token: session::new_token(),
        is_staff: false,
    };
    let user = match state.store.create_user(&new_user).await {
        Ok(user) => user,
        Err(StoreError::UsernameTaken(name)) => {
            warn!("Registration for taken username {name}");
            let mut errors = FieldErrors::default();
            errors.add("username", USERNAME_TAKEN);
            return Ok(registration_failed(origin, &form, &errors));
        }
        Err(e) => return Err(e.into()),
    };
    info!("Registered user {} ({})", user.username, user.id);

    Ok(match origin {
        Origin::Programmatic => (
            StatusCode::CREATED,
            Json(json!({ "success": true, "username": user.username })),
        )
            .into_response(),
        Origin::Interactive => Redirect::to(LOGIN_PATH).into_response(),
    })
}
