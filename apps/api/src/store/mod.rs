//! Record store: persistence seam for quiz records, users and sessions.
//!
//! `AppState` carries an `Arc<dyn RecordStore>`; production uses
//! `PgRecordStore`, tests use the in-memory store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::quiz::{QuizRecord, QuizSubmission};
use crate::models::user::{NewUser, User, UserCredentials};

#[cfg(test)]
pub mod memory;
pub mod postgres;

pub use postgres::PgRecordStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Quiz record {0} not found")]
    NotFound(i64),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Username {0} is already taken")]
    UsernameTaken(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                StoreError::Unavailable(err.to_string())
            }
            other => StoreError::Database(other),
        }
    }
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Inserts a record with a generated id and timestamp.
    async fn create(
        &self,
        submission: &QuizSubmission,
        profile: &str,
    ) -> Result<QuizRecord, StoreError>;

    /// All records, newest first.
    async fn list(&self) -> Result<Vec<QuizRecord>, StoreError>;

    async fn get(&self, id: i64) -> Result<QuizRecord, StoreError>;

    async fn update(
        &self,
        id: i64,
        submission: &QuizSubmission,
        profile: &str,
    ) -> Result<QuizRecord, StoreError>;

    async fn delete(&self, id: i64) -> Result<(), StoreError>;

    async fn find_user_by_token(&self, token: &str) -> Result<Option<User>, StoreError>;

    /// Fails with `UsernameTaken` when the name exists, active or not.
    async fn create_user(&self, user: &NewUser) -> Result<User, StoreError>;

    /// Active users only.
    async fn find_credentials(&self, username: &str) -> Result<Option<UserCredentials>, StoreError>;

    async fn create_session(
        &self,
        token: &str,
        user_id: i64,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// The active user behind an unexpired session.
    async fn find_user_by_session(&self, token: &str) -> Result<Option<User>, StoreError>;

    /// Deleting an unknown session is not an error.
    async fn delete_session(&self, token: &str) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_errors_are_unavailable() {
        assert!(matches!(
            StoreError::from(sqlx::Error::PoolTimedOut),
            StoreError::Unavailable(_)
        ));
        assert!(matches!(
            StoreError::from(sqlx::Error::RowNotFound),
            StoreError::Database(_)
        ));
    }
}
