use std::collections::HashSet;

use serde::Serialize;

use crate::profile::catalog::Catalog;
use crate::profile::scoring::ProfileResult;
use crate::translation::{Translation, Translator};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseEntry {
    pub name: String,
    pub translation: Translation,
}

/// Drops repeated names, keeping the first occurrence of each in place.
pub fn dedup_first_seen<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen: HashSet<String> = HashSet::new();
    let mut unique = Vec::new();
    for name in names {
        let name = name.as_ref();
        if seen.insert(name.to_string()) {
            unique.push(name.to_string());
        }
    }
    unique
}

/// Recommended courses for a profile: each category's list in profile order,
/// repeats removed.
pub fn recommended_courses(catalog: &Catalog, profile: &ProfileResult) -> Vec<String> {
    dedup_first_seen(
        profile
            .categories()
            .iter()
            .flat_map(|c| catalog.lookup(c.label()).1.iter()),
    )
}

/// Recommended courses paired with their translations. Each distinct course
/// is translated exactly once.
pub async fn aggregate_courses(
    catalog: &Catalog,
    profile: &ProfileResult,
    translator: &dyn Translator,
    target_lang: &str,
) -> Vec<CourseEntry> {
    let mut entries = Vec::new();
    for name in recommended_courses(catalog, profile) {
        let translation = translator.translate(&name, target_lang).await;
        entries.push(CourseEntry { name, translation });
    }
    entries
}
