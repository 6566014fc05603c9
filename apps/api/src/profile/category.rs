use std::fmt;

use serde::{Deserialize, Serialize};

/// The four vocational-interest categories a quiz answer can point at.
///
/// Declaration order matters: every ordered output (profile results, course
/// aggregation) follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Tecnológico")]
    Technological,
    #[serde(rename = "Creativo/Artístico")]
    CreativeArtistic,
    #[serde(rename = "Social/Humanístico")]
    SocialHumanistic,
    #[serde(rename = "Científico/Analítico")]
    ScientificAnalytical,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Technological,
        Category::CreativeArtistic,
        Category::SocialHumanistic,
        Category::ScientificAnalytical,
    ];

    /// The label used on the wire, in forms and in persisted profiles.
    pub fn label(self) -> &'static str {
        match self {
            Category::Technological => "Tecnológico",
            Category::CreativeArtistic => "Creativo/Artístico",
            Category::SocialHumanistic => "Social/Humanístico",
            Category::ScientificAnalytical => "Científico/Analítico",
        }
    }

    /// Exact label match. Anything else is not a category.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.label() == label)
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Category::Technological => 0,
            Category::CreativeArtistic => 1,
            Category::SocialHumanistic => 2,
            Category::ScientificAnalytical => 3,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
