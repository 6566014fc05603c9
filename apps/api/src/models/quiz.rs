use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::profile::scoring::AnswerSet;

/// A persisted quiz submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct QuizRecord {
    pub id: i64,
    pub name: String,
    pub age: i32,
    pub email: String,
    pub level: String,
    pub q1: String,
    pub q2: String,
    pub q3: String,
    pub q4: String,
    pub q5: String,
    pub profile: String,
    pub submitted_at: DateTime<Utc>,
}

impl QuizRecord {
    pub fn answers(&self) -> AnswerSet {
        AnswerSet {
            q1: self.q1.clone(),
            q2: self.q2.clone(),
            q3: self.q3.clone(),
            q4: self.q4.clone(),
            q5: self.q5.clone(),
        }
    }
}

/// Validated quiz input. The profile is never part of it; it is always
/// derived from `answers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizSubmission {
    pub name: String,
    pub age: i32,
    pub email: String,
    pub level: String,
    #[serde(flatten)]
    pub answers: AnswerSet,
}
