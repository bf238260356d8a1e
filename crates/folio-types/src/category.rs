use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// The fixed set of artwork categories.
///
/// Rows edited directly in the backing store may carry a label outside the
/// set; those load as [`Category::Unrecognized`] so the gallery still shows
/// them, but the catalog never writes one.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Abstract,
    Botanical,
    Portrait,
    MixedMedia,
    Other,
    Unrecognized(String),
}

impl Category {
    /// Every known category in display order.
    pub const ALL: [Category; 5] = [
        Category::Abstract,
        Category::Botanical,
        Category::Portrait,
        Category::MixedMedia,
        Category::Other,
    ];

    /// Display label, also the stored representation.
    pub fn label(&self) -> &str {
        match self {
            Self::Abstract => "Abstract",
            Self::Botanical => "Botanical",
            Self::Portrait => "Portrait",
            Self::MixedMedia => "Mixed Media",
            Self::Other => "Other",
            Self::Unrecognized(label) => label,
        }
    }

    /// Returns `false` only for labels outside the fixed set.
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }

    /// Strict parse: only exact labels of the fixed set are accepted.
    pub fn parse_known(label: &str) -> Result<Self, TypeError> {
        match Self::from(label.to_string()) {
            Self::Unrecognized(other) => Err(TypeError::UnknownCategory(other)),
            known => Ok(known),
        }
    }
}

impl Default for Category {
    fn default() -> Self {
        Self::Abstract
    }
}

impl From<String> for Category {
    fn from(label: String) -> Self {
        match label.as_str() {
            "Abstract" => Self::Abstract,
            "Botanical" => Self::Botanical,
            "Portrait" => Self::Portrait,
            "Mixed Media" => Self::MixedMedia,
            "Other" => Self::Other,
            _ => Self::Unrecognized(label),
        }
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        match category {
            Category::Unrecognized(label) => label,
            known => known.label().to_string(),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Gallery category filter: everything, or one exact category.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    pub fn matches(&self, category: &Category) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == category,
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = std::convert::Infallible;

    /// `"All"` in any case is the sentinel; anything else filters exactly.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            Ok(Self::Only(Category::from(trimmed.to_string())))
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("All"),
            Self::Only(category) => category.fmt(f),
        }
    }
}
