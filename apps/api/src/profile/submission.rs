//! Quiz submission pipeline.
//!
//! Flow: score answers → catalog lookup → course aggregation → translation →
//!       persist → notify → status tier.
//!
//! Persistence and email are independent: a failed insert still attempts the
//! email, and a failed email never undoes the insert.

use serde::Serialize;
use tracing::{error, info, warn};

use crate::models::quiz::{QuizRecord, QuizSubmission};
use crate::notify::{Delivery, QuizReport};
use crate::profile::catalog::Catalog;
use crate::profile::courses::{aggregate_courses, CourseEntry};
use crate::profile::scoring::{score_answers, AnswerSet, ProfileResult};
use crate::state::AppState;
use crate::translation::{Translation, Translator};

/// Everything shown to the user after a quiz: profile, descriptions and
/// translated course recommendations.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileReport {
    #[serde(skip)]
    pub result: ProfileResult,
    pub profile: String,
    pub description: String,
    pub description_translation: Translation,
    pub courses: Vec<CourseEntry>,
}

impl ProfileReport {
    pub fn course_names(&self) -> Vec<String> {
        self.courses.iter().map(|c| c.name.clone()).collect()
    }
}

pub async fn build_report(
    catalog: &Catalog,
    translator: &dyn Translator,
    target_lang: &str,
    answers: &AnswerSet,
) -> ProfileReport {
    let result = score_answers(answers);
    let description = catalog.describe(&result);
    let description_translation = translator.translate(&description, target_lang).await;
    let courses = aggregate_courses(catalog, &result, translator, target_lang).await;

    ProfileReport {
        profile: result.label(),
        result,
        description,
        description_translation,
        courses,
    }
}

/// User-facing outcome of a submission. Persistence failure dominates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusTier {
    Success,
    Warning,
    Danger,
}

impl StatusTier {
    pub fn from_outcomes(persisted: bool, emailed: bool) -> Self {
        match (persisted, emailed) {
            (false, _) => StatusTier::Danger,
            (true, false) => StatusTier::Warning,
            (true, true) => StatusTier::Success,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StatusTier::Success => "success",
            StatusTier::Warning => "warning",
            StatusTier::Danger => "danger",
        }
    }

    pub fn user_message(self) -> &'static str {
        match self {
            StatusTier::Success => {
                "¡Test completado! Tus resultados y guía personalizada han sido enviados a tu correo."
            }
            StatusTier::Warning => {
                "Test completado pero no pudimos enviar el correo con tus resultados. Revisa tu dirección y contáctanos."
            }
            StatusTier::Danger => {
                "Test completado. Hubo un error al guardar tu consulta en el sistema. Contacta a soporte."
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct SubmissionOutcome {
    pub submission: QuizSubmission,
    pub report: ProfileReport,
    pub record: Option<QuizRecord>,
    pub delivery: Option<Delivery>,
    pub status: StatusTier,
}

/// Runs the full pipeline for a validated submission. Never fails: every
/// side-channel problem is folded into the status tier.
pub async fn submit_quiz(state: &AppState, submission: QuizSubmission) -> SubmissionOutcome {
    let report = build_report(
        &state.catalog,
        state.translator.as_ref(),
        &state.target_lang,
        &submission.answers,
    )
    .await;
    info!(
        "Scored quiz for {}: {} (tie: {})",
        submission.email,
        report.profile,
        report.result.is_tie()
    );

    let record = match state.store.create(&submission, &report.profile).await {
        Ok(record) => Some(record),
        Err(e) => {
            error!("Failed to persist quiz submission: {e}");
            None
        }
    };

    let course_names = report.course_names();
    let email = QuizReport {
        name: &submission.name,
        email: &submission.email,
        profile: &report.profile,
        description: &report.description,
        courses: &course_names,
    };
    let delivery = match state.notifier.send_quiz_report(&email).await {
        Ok(delivery) => Some(delivery),
        Err(e) => {
            warn!("Quiz report email failed for {}: {e}", submission.email);
            None
        }
    };

    let status = StatusTier::from_outcomes(record.is_some(), delivery.is_some());
    SubmissionOutcome {
        submission,
        report,
        record,
        delivery,
        status,
    }
}
