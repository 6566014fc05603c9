use serde::Serialize;
use sqlx::FromRow;

/// An account allowed to call authenticated endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub is_staff: bool,
}

/// Fields for a new account; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub api_token: String,
    pub is_staff: bool,
}

/// An active user and their stored hash. Accounts created before
/// passwords existed have none and cannot log in.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: Option<String>,
}
