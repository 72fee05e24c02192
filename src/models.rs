use std::fmt;

use chrono::{DateTime, Utc};

/// The fixed set of spending categories every user's totals are reported against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Housing,
    Transportation,
    Food,
    Utilities,
    Entertainment,
    Savings,
    Personal,
    Other,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Housing,
        Category::Transportation,
        Category::Food,
        Category::Utilities,
        Category::Entertainment,
        Category::Savings,
        Category::Personal,
        Category::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Housing => "Housing",
            Category::Transportation => "Transportation",
            Category::Food => "Food",
            Category::Utilities => "Utilities",
            Category::Entertainment => "Entertainment",
            Category::Savings => "Savings",
            Category::Personal => "Personal",
            Category::Other => "Other",
        }
    }

    /// Share of the monthly budget a category is allotted when a user has
    /// no custom split. Sums to 1.
    pub fn default_share(self) -> f64 {
        match self {
            Category::Housing => 0.30,
            Category::Transportation => 0.15,
            Category::Food => 0.15,
            Category::Utilities => 0.10,
            Category::Entertainment => 0.10,
            Category::Savings => 0.10,
            Category::Personal => 0.05,
            Category::Other => 0.05,
        }
    }

    /// Case-insensitive lookup; `None` for anything outside the fixed set.
    pub fn parse(name: &str) -> Option<Category> {
        let name = name.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: Option<i64>,
    pub user_id: String,
    /// Raw category as stored; may be missing or outside the fixed set.
    pub category: Option<String>,
    pub amount: f64,
    pub timestamp: DateTime<Utc>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub username: Option<String>,
    pub budget: f64,
}
