use serde::{Deserialize, Serialize};

use crate::profile::category::Category;

/// Raw answers to the five quiz questions. Values are expected to be category
/// labels but are kept as submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSet {
    pub q1: String,
    pub q2: String,
    pub q3: String,
    pub q4: String,
    pub q5: String,
}

impl AnswerSet {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        [&self.q1, &self.q2, &self.q3, &self.q4, &self.q5]
            .into_iter()
            .map(String::as_str)
    }
}

/// Categories tied at the highest tally, in declaration order. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileResult(Vec<Category>);

impl ProfileResult {
    pub fn categories(&self) -> &[Category] {
        &self.0
    }

    pub fn is_tie(&self) -> bool {
        self.0.len() > 1
    }

    /// Persisted form: labels joined with ", ".
    pub fn label(&self) -> String {
        self.0
            .iter()
            .map(|c| c.label())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Per-category count of answers, indexed in declaration order.
pub fn tally(answers: &AnswerSet) -> [u32; 4] {
    let mut counts = [0_u32; 4];
    for answer in answers.iter() {
        // Unrecognized answers are not counted.
        if let Some(category) = Category::from_label(answer) {
            counts[category.index()] += 1;
        }
    }
    counts
}

/// Computes the winning profile: every category whose tally equals the max.
///
/// With no recognized answers every category sits at zero, so all four are
/// returned.
pub fn score_answers(answers: &AnswerSet) -> ProfileResult {
    let counts = tally(answers);
    let max = counts.iter().copied().max().unwrap_or(0);
    ProfileResult(
        Category::ALL
            .into_iter()
            .filter(|c| counts[c.index()] == max)
            .collect(),
    )
}
