//! Caller identification: `Authorization: Bearer <token>` for API clients,
//! the session cookie for browsers.

pub mod password;
pub mod session;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts, HeaderMap};
use tracing::{debug, info, warn};

use crate::errors::AppError;
use crate::models::user::{NewUser, User};
use crate::routes::Origin;
use crate::state::AppState;
use crate::store::{RecordStore, StoreError};

pub const LOGIN_PATH: &str = "/login";
pub const NO_ADMIN_PATH: &str = "/no-admin";

/// The user behind a request, if any. Unknown tokens and expired sessions
/// count as anonymous.
#[derive(Debug, Clone)]
pub struct Caller(pub Option<User>);

impl Caller {
    pub fn require_authenticated(&self) -> Result<&User, AppError> {
        self.0.as_ref().ok_or(AppError::Unauthorized)
    }

    pub fn require_staff(&self) -> Result<&User, AppError> {
        let user = self.require_authenticated()?;
        if !user.is_staff {
            return Err(AppError::Forbidden);
        }
        Ok(user)
    }

    /// Like `require_staff`, but browsers are sent to the login page (or
    /// the non-staff landing page) instead of getting a 401/403 body.
    pub fn require_staff_for(&self, origin: Origin) -> Result<&User, AppError> {
        match (self.require_staff(), origin) {
            (Err(AppError::Unauthorized), Origin::Interactive) => Err(AppError::Redirect(LOGIN_PATH)),
            (Err(AppError::Forbidden), Origin::Interactive) => Err(AppError::Redirect(NO_ADMIN_PATH)),
            (result, _) => result,
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(token) = bearer_token(&parts.headers) {
            let user = state.store.find_user_by_token(token).await?;
            if user.is_none() {
                debug!("Rejected unknown API token");
            }
            return Ok(Caller(user));
        }

        let Some(token) = session::session_token(&parts.headers) else {
            return Ok(Caller(None));
        };
        let user = state.store.find_user_by_session(token).await?;
        if user.is_none() {
            debug!("Ignored unknown or expired session");
        }
        Ok(Caller(user))
    }
}

/// Creates the configured staff account unless the username is already taken.
pub async fn ensure_staff_user(
    store: &dyn RecordStore,
    username: &str,
    password: &str,
) -> Result<(), StoreError> {
    if store.find_credentials(username).await?.is_some() {
        info!("Staff user {username} already exists");
        return Ok(());
    }

    let new_user = NewUser {
        username: username.to_string(),
        password_hash: password::hash_password(password),
        api_token: session::new_token(),
        is_staff: true,
    };
    match store.create_user(&new_user).await {
        Ok(user) => {
            info!("Created staff user {} ({})", user.username, user.id);
            Ok(())
        }
        Err(StoreError::UsernameTaken(name)) => {
            warn!("Staff username {name} belongs to an inactive account; not creating it");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn user(is_staff: bool) -> Caller {
        Caller(Some(User {
            id: 1,
            username: "ana".into(),
            is_staff,
        }))
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&headers("Bearer abc123")), Some("abc123"));
        assert_eq!(bearer_token(&headers("bearer  abc123 ")), Some("abc123"));
        assert_eq!(bearer_token(&headers("Basic abc123")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_staff_requirements() {
        let staff = user(true);
        let regular = user(false);

        assert!(staff.require_staff().is_ok());
        assert!(matches!(regular.require_staff(), Err(AppError::Forbidden)));
        assert!(regular.require_authenticated().is_ok());
        assert!(matches!(Caller(None).require_staff(), Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_browsers_are_redirected() {
        assert!(matches!(
            Caller(None).require_staff_for(Origin::Interactive),
            Err(AppError::Redirect("/login"))
        ));
        assert!(matches!(
            user(false).require_staff_for(Origin::Interactive),
            Err(AppError::Redirect("/no-admin"))
        ));
        assert!(matches!(
            Caller(None).require_staff_for(Origin::Programmatic),
            Err(AppError::Unauthorized)
        ));
        assert!(user(true).require_staff_for(Origin::Interactive).is_ok());
    }

    #[tokio::test]
    async fn test_staff_bootstrap_is_idempotent() {
        let store = MemoryStore::new();

        ensure_staff_user(&store, "admin", "cambiar-esto").await.unwrap();
        ensure_staff_user(&store, "admin", "otra-clave").await.unwrap();

        let credentials = store.find_credentials("admin").await.unwrap().unwrap();
        assert!(credentials.user.is_staff);
        let hash = credentials.password_hash.unwrap();
        assert!(password::verify_password("cambiar-esto", &hash));
        assert!(!password::verify_password("otra-clave", &hash));
    }
}
