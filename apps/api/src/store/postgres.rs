use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::info;

use crate::models::quiz::{QuizRecord, QuizSubmission};
use crate::models::user::{NewUser, User, UserCredentials};
use crate::store::{RecordStore, StoreError};

/// Postgres-backed store over the `quiz_records`, `users` and `sessions` tables.
#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct CredentialRow {
    id: i64,
    username: String,
    is_staff: bool,
    password_hash: Option<String>,
}

impl From<CredentialRow> for UserCredentials {
    fn from(row: CredentialRow) -> Self {
        Self {
            user: User {
                id: row.id,
                username: row.username,
                is_staff: row.is_staff,
            },
            password_hash: row.password_hash,
        }
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn create(
        &self,
        submission: &QuizSubmission,
        profile: &str,
    ) -> Result<QuizRecord, StoreError> {
        let record = sqlx::query_as::<_, QuizRecord>(
            r#"
            INSERT INTO quiz_records
                (name, age, email, level, q1, q2, q3, q4, q5, profile)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(&submission.name)
        .bind(submission.age)
        .bind(&submission.email)
        .bind(&submission.level)
        .bind(&submission.answers.q1)
        .bind(&submission.answers.q2)
        .bind(&submission.answers.q3)
        .bind(&submission.answers.q4)
        .bind(&submission.answers.q5)
        .bind(profile)
        .fetch_one(&self.pool)
        .await?;

        info!("Inserted quiz record {} ({})", record.id, record.profile);
        Ok(record)
    }

    async fn list(&self) -> Result<Vec<QuizRecord>, StoreError> {
        Ok(sqlx::query_as::<_, QuizRecord>(
            "SELECT * FROM quiz_records ORDER BY submitted_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    async fn get(&self, id: i64) -> Result<QuizRecord, StoreError> {
        sqlx::query_as::<_, QuizRecord>("SELECT * FROM quiz_records WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound(id))
    }

    async fn update(
        &self,
        id: i64,
        submission: &QuizSubmission,
        profile: &str,
    ) -> Result<QuizRecord, StoreError> {
        let record = sqlx::query_as::<_, QuizRecord>(
            r#"
            UPDATE quiz_records
            SET name = $2, age = $3, email = $4, level = $5,
                q1 = $6, q2 = $7, q3 = $8, q4 = $9, q5 = $10,
                profile = $11
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&submission.name)
        .bind(submission.age)
        .bind(&submission.email)
        .bind(&submission.level)
        .bind(&submission.answers.q1)
        .bind(&submission.answers.q2)
        .bind(&submission.answers.q3)
        .bind(&submission.answers.q4)
        .bind(&submission.answers.q5)
        .bind(profile)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound(id))?;

        info!("Updated quiz record {id} ({})", record.profile);
        Ok(record)
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM quiz_records WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        info!("Deleted quiz record {id}");
        Ok(())
    }

    async fn find_user_by_token(&self, token: &str) -> Result<Option<User>, StoreError> {
        Ok(sqlx::query_as::<_, User>(
            "SELECT id, username, is_staff FROM users WHERE api_token = $1 AND is_active",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn create_user(&self, user: &NewUser) -> Result<User, StoreError> {
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash, api_token, is_staff)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, is_staff
            "#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.api_token)
        .bind(user.is_staff)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                StoreError::UsernameTaken(user.username.clone())
            }
            other => StoreError::from(other),
        })?;

        info!("Created user {} ({})", created.username, created.id);
        Ok(created)
    }

    async fn find_credentials(&self, username: &str) -> Result<Option<UserCredentials>, StoreError> {
        let row = sqlx::query_as::<_, CredentialRow>(
            "SELECT id, username, is_staff, password_hash FROM users WHERE username = $1 AND is_active",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(UserCredentials::from))
    }

    async fn create_session(
        &self,
        token: &str,
        user_id: i64,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO sessions (token, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(token)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_user_by_session(&self, token: &str) -> Result<Option<User>, StoreError> {
        Ok(sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.username, u.is_staff
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.token = $1 AND s.expires_at > now() AND u.is_active
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_session(&self, token: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM sessions WHERE token = $1 OR expires_at <= now()")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
