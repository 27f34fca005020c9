//! Fixed keyword and synonym vocabulary.
//!
//! Everything here is read-only process-wide data. Matchers use the trigger lists to decide
//! whether a category is mentioned at all, the resolver uses the role synonyms to find columns by
//! meaning, and the workflow generator uses the step keywords to classify fragments.

/// Trigger words for the row-wise sum derive.
pub const SUM_TRIGGERS: &[&str] = &["total", "sum", "add up", "calculate sum"];

/// Trigger words for the row-wise mean derive.
pub const MEAN_TRIGGERS: &[&str] = &["average", "mean", "avg"];

pub const CLEAN_TRIGGERS: &[&str] = &["clean", "standardize", "format", "proper case"];

pub const ACTIVE_TRIGGERS: &[&str] = &[
    "active only",
    "filter active",
    "active customers",
    "active records",
];

pub const FULL_NAME_TRIGGERS: &[&str] = &["full name", "combine names", "full_name"];

pub const CATEGORY_TRIGGERS: &[&str] = &["category", "classify", "group into"];

pub const PERFORMANCE_DOMAIN: &[&str] = &["performance"];

pub const INVENTORY_DOMAIN: &[&str] = &["inventory", "stock"];

pub const TIMESTAMP_TRIGGERS: &[&str] = &["add timestamp", "current time", "processing time"];

/// Semantic roles a column can be looked up by when the instruction names no column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    Quantity,
    Price,
    Status,
    FirstName,
    LastName,
    Performance,
    Stock,
}

impl ColumnRole {
    /// Fragments a column name may contain to play this role.
    pub fn synonyms(&self) -> &'static [&'static str] {
        match self {
            ColumnRole::Quantity => &["qty", "quantity", "count", "units"],
            ColumnRole::Price => &["price", "cost", "rate", "amount"],
            ColumnRole::Status => &["status"],
            ColumnRole::FirstName => &["first"],
            ColumnRole::LastName => &["last", "surname"],
            ColumnRole::Performance => &["rating", "score", "performance"],
            ColumnRole::Stock => &["stock", "inventory", "quantity", "qty", "units"],
        }
    }
}

/// Step classification keywords, checked in this order.
pub const EXTRACT_KEYWORDS: &[&str] = &["extract", "read", "import", "fetch", "get", "source"];

pub const TRANSFORM_KEYWORDS: &[&str] = &[
    "transform",
    "clean",
    "calculate",
    "process",
    "filter",
    "aggregate",
    "join",
    "enrich",
];

pub const LOAD_KEYWORDS: &[&str] = &["load", "write", "export", "save", "store", "output"];

/// Returns true when any of `words` occurs in `text` starting at a word boundary.
///
/// Only the start is anchored, so "total" also matches "totals" while "sum" does not match
/// "consumer".
pub fn mentions_any(text: &str, words: &[&str]) -> bool {
    words.iter().any(|w| mentions(text, w))
}

fn mentions(text: &str, word: &str) -> bool {
    text.match_indices(word).any(|(idx, _)| {
        text[..idx]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric())
    })
}
