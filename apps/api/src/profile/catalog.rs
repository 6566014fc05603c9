use std::collections::BTreeMap;

use crate::profile::category::Category;
use crate::profile::scoring::ProfileResult;

#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub description: String,
    pub courses: Vec<String>,
}

/// Static description and course recommendations per category.
/// Built once at startup and shared read-only through `AppState`.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: BTreeMap<Category, CatalogEntry>,
}

const STANDARD: &[(Category, &str, &[&str])] = &[
    (
        Category::Technological,
        "Te interesa la tecnología la programación y la innovación.",
        &["Introducción a Python", "Desarrollo Web", "Electrónica básica"],
    ),
    (
        Category::CreativeArtistic,
        "Te atrae la expresión artística y las ideas originales.",
        &["Diseño Gráfico", "Fotografía Digital", "Edición de video"],
    ),
    (
        Category::SocialHumanistic,
        "Tenés interés en ayudar a otros y en lo comunitario.",
        &["Oratoria", "Trabajo Social", "Gestión de proyectos comunitarios"],
    ),
    (
        Category::ScientificAnalytical,
        "Te motiva investigar analizar y comprender como funcionan las cosas.",
        &["Estadística básica", "Laboratorio de ciencias", "Análisis de datos"],
    ),
];

impl Catalog {
    pub fn standard() -> Self {
        Self::from_entries(STANDARD.iter().map(|(category, description, courses)| {
            (
                *category,
                CatalogEntry {
                    description: description.to_string(),
                    courses: courses.iter().map(|c| c.to_string()).collect(),
                },
            )
        }))
    }

    pub fn from_entries(entries: impl IntoIterator<Item = (Category, CatalogEntry)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    pub fn description(&self, category: Category) -> &str {
        self.entries
            .get(&category)
            .map(|e| e.description.as_str())
            .unwrap_or("")
    }

    pub fn courses(&self, category: Category) -> &[String] {
        self.entries
            .get(&category)
            .map(|e| e.courses.as_slice())
            .unwrap_or(&[])
    }

    /// Lookup by wire label. Unknown labels resolve to an empty description
    /// and no courses.
    pub fn lookup(&self, label: &str) -> (&str, &[String]) {
        match Category::from_label(label) {
            Some(category) => (self.description(category), self.courses(category)),
            None => ("", &[]),
        }
    }

    /// Descriptions of every category in the profile, joined with " / ".
    pub fn describe(&self, profile: &ProfileResult) -> String {
        profile
            .categories()
            .iter()
            .map(|c| self.lookup(c.label()).0)
            .collect::<Vec<_>>()
            .join(" / ")
    }
}
