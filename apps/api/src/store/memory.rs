use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::models::quiz::{QuizRecord, QuizSubmission};
use crate::models::user::{NewUser, User, UserCredentials};
use crate::store::{RecordStore, StoreError};

struct StoredUser {
    token: String,
    user: User,
    password_hash: Option<String>,
    active: bool,
}

/// In-memory store for handler tests. `failing()` rejects every write.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<BTreeMap<i64, QuizRecord>>,
    users: Mutex<Vec<StoredUser>>,
    sessions: Mutex<HashMap<String, (i64, DateTime<Utc>)>>,
    next_id: Mutex<i64>,
    fail_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    pub fn with_user(self, token: &str, username: &str, is_staff: bool) -> Self {
        {
            let mut users = self.users.lock().unwrap();
            let id = users.len() as i64 + 1;
            users.push(StoredUser {
                token: token.to_string(),
                user: User {
                    id,
                    username: username.to_string(),
                    is_staff,
                },
                password_hash: None,
                active: true,
            });
        }
        self
    }

    pub fn deactivate(&self, username: &str) {
        for stored in self.users.lock().unwrap().iter_mut() {
            if stored.user.username == username {
                stored.active = false;
            }
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::Unavailable("writes disabled".to_string()));
        }
        Ok(())
    }
}

fn build_record(id: i64, submission: &QuizSubmission, profile: &str) -> QuizRecord {
    // Deterministic timestamps: later ids are always newer.
    let base = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    QuizRecord {
        id,
        name: submission.name.clone(),
        age: submission.age,
        email: submission.email.clone(),
        level: submission.level.clone(),
        q1: submission.answers.q1.clone(),
        q2: submission.answers.q2.clone(),
        q3: submission.answers.q3.clone(),
        q4: submission.answers.q4.clone(),
        q5: submission.answers.q5.clone(),
        profile: profile.to_string(),
        submitted_at: base + Duration::minutes(id),
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn create(
        &self,
        submission: &QuizSubmission,
        profile: &str,
    ) -> Result<QuizRecord, StoreError> {
        self.check_writable()?;
        let id = {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            *next
        };
        let record = build_record(id, submission, profile);
        self.records.lock().unwrap().insert(id, record.clone());
        Ok(record)
    }

    async fn list(&self) -> Result<Vec<QuizRecord>, StoreError> {
        Ok(self.records.lock().unwrap().values().rev().cloned().collect())
    }

    async fn get(&self, id: i64) -> Result<QuizRecord, StoreError> {
        self.records
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn update(
        &self,
        id: i64,
        submission: &QuizSubmission,
        profile: &str,
    ) -> Result<QuizRecord, StoreError> {
        self.check_writable()?;
        let mut records = self.records.lock().unwrap();
        let existing = records.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        let submitted_at = existing.submitted_at;
        *existing = QuizRecord {
            submitted_at,
            ..build_record(id, submission, profile)
        };
        Ok(existing.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        self.check_writable()?;
        self.records
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }

    async fn find_user_by_token(&self, token: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.active && u.token == token)
            .map(|u| u.user.clone()))
    }

    async fn create_user(&self, new_user: &NewUser) -> Result<User, StoreError> {
        self.check_writable()?;
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.user.username == new_user.username) {
            return Err(StoreError::UsernameTaken(new_user.username.clone()));
        }
        let user = User {
            id: users.len() as i64 + 1,
            username: new_user.username.clone(),
            is_staff: new_user.is_staff,
        };
        users.push(StoredUser {
            token: new_user.api_token.clone(),
            user: user.clone(),
            password_hash: Some(new_user.password_hash.clone()),
            active: true,
        });
        Ok(user)
    }

    async fn find_credentials(&self, username: &str) -> Result<Option<UserCredentials>, StoreError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.active && u.user.username == username)
            .map(|u| UserCredentials {
                user: u.user.clone(),
                password_hash: u.password_hash.clone(),
            }))
    }

    async fn create_session(
        &self,
        token: &str,
        user_id: i64,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.check_writable()?;
        self.sessions
            .lock()
            .unwrap()
            .insert(token.to_string(), (user_id, expires_at));
        Ok(())
    }

    async fn find_user_by_session(&self, token: &str) -> Result<Option<User>, StoreError> {
        let Some((user_id, expires_at)) = self.sessions.lock().unwrap().get(token).copied() else {
            return Ok(None);
        };
        if expires_at <= Utc::now() {
            return Ok(None);
        }
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.active && u.user.id == user_id)
            .map(|u| u.user.clone()))
    }

    async fn delete_session(&self, token: &str) -> Result<(), StoreError> {
        let now = Utc::now();
        self.sessions
            .lock()
            .unwrap()
            .retain(|t, (_, expires_at)| t != token && *expires_at > now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(username: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            password_hash: "pbkdf2_sha256$1$sal$00".to_string(),
            api_token: format!("{username}-token"),
            is_staff: false,
        }
    }

    #[tokio::test]
    async fn test_usernames_are_unique() {
        let store = MemoryStore::new();
        store.create_user(&new_user("ana")).await.unwrap();

        let err = store.create_user(&new_user("ana")).await.unwrap_err();
        assert!(matches!(err, StoreError::UsernameTaken(name) if name == "ana"));
    }

    #[tokio::test]
    async fn test_expired_and_inactive_sessions_are_anonymous() {
        let store = MemoryStore::new();
        let user = store.create_user(&new_user("ana")).await.unwrap();
        store
            .create_session("old", user.id, Utc::now() - Duration::minutes(1))
            .await
            .unwrap();
        store
            .create_session("live", user.id, Utc::now() + Duration::days(1))
            .await
            .unwrap();

        assert_eq!(store.find_user_by_session("old").await.unwrap(), None);
        assert_eq!(store.find_user_by_session("live").await.unwrap(), Some(user));

        store.deactivate("ana");
        assert_eq!(store.find_user_by_session("live").await.unwrap(), None);
        assert!(store.find_credentials("ana").await.unwrap().is_none());
    }
}
