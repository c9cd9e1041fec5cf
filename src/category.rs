use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// The closed set of spending categories an expense can be filed under
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Housing,
    Transportation,
    Food,
    Utilities,
    Insurance,
    Healthcare,
    Entertainment,
    Personal,
    Education,
    Debt,
    Savings,
    Gifts,
    Other,
}

#[derive(Error, Debug, PartialEq)]
pub enum CategoryError {
    #[error("'{0}' is not a known category")]
    Unknown(String),
}

impl Category {
    /// Every category, in display order
    pub const ALL: [Category; 13] = [
        Category::Housing,
        Category::Transportation,
        Category::Food,
        Category::Utilities,
        Category::Insurance,
        Category::Healthcare,
        Category::Entertainment,
        Category::Personal,
        Category::Education,
        Category::Debt,
        Category::Savings,
        Category::Gifts,
        Category::Other,
    ];

    /// The raw identifier used when a category is stored or transmitted
    pub fn id(&self) -> &'static str {
        match *self {
            Category::Housing => "housing",
            Category::Transportation => "transportation",
            Category::Food => "food",
            Category::Utilities => "utilities",
            Category::Insurance => "insurance",
            Category::Healthcare => "healthcare",
            Category::Entertainment => "entertainment",
            Category::Personal => "personal",
            Category::Education => "education",
            Category::Debt => "debt",
            Category::Savings => "savings",
            Category::Gifts => "gifts",
            Category::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match *self {
            Category::Housing => "Housing",
            Category::Transportation => "Transportation",
            Category::Food => "Food & Dining",
            Category::Utilities => "Utilities",
            Category::Insurance => "Insurance",
            Category::Healthcare => "Healthcare",
            Category::Entertainment => "Entertainment",
            Category::Personal => "Personal Care",
            Category::Education => "Education",
            Category::Debt => "Debt Payments",
            Category::Savings => "Savings",
            Category::Gifts => "Gifts & Donations",
            Category::Other => "Other",
        }
    }

    /// Chart colour for this category, as a `#rrggbb` hex string
    pub fn color(&self) -> &'static str {
        match *self {
            Category::Housing => "#4f46e5",
            Category::Transportation => "#0ea5e9",
            Category::Food => "#f97316",
            Category::Utilities => "#eab308",
            Category::Insurance => "#14b8a6",
            Category::Healthcare => "#ef4444",
            Category::Entertainment => "#a855f7",
            Category::Personal => "#ec4899",
            Category::Education => "#22c55e",
            Category::Debt => "#64748b",
            Category::Savings => "#10b981",
            Category::Gifts => "#f43f5e",
            Category::Other => "#9ca3af",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = CategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .iter()
            .find(|c| c.id() == s)
            .copied()
            .ok_or_else(|| CategoryError::Unknown(s.into()))
    }
}
