//! Column Resolver - maps tokens taken from an instruction to real columns.
//!
//! Resolution is case-insensitive substring containment of the token inside the column name.
//! Candidates come back in the table's column order and callers use the first one; an empty list
//! means the dependent operation does not apply.

use crate::vocabulary::ColumnRole;
use polars::prelude::*;

pub struct ColumnResolver {
    columns: Vec<String>,
}

impl ColumnResolver {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }

    pub fn for_table(df: &DataFrame) -> Self {
        Self::new(df.get_column_names().iter().map(|s| s.to_string()).collect())
    }

    /// All columns whose name contains `token`, in column order.
    pub fn resolve(&self, token: &str) -> Vec<String> {
        let token = token.trim().to_lowercase();
        if token.is_empty() {
            return Vec::new();
        }
        self.columns
            .iter()
            .filter(|name| name.to_lowercase().contains(&token))
            .cloned()
            .collect()
    }

    /// First column matching `token`.
    pub fn resolve_first(&self, token: &str) -> Option<String> {
        self.resolve(token).into_iter().next()
    }

    /// All columns whose name contains any synonym of `role`, in column order.
    pub fn resolve_role(&self, role: ColumnRole) -> Vec<String> {
        self.columns
            .iter()
            .filter(|name| {
                let lower = name.to_lowercase();
                role.synonyms().iter().any(|syn| lower.contains(syn))
            })
            .cloned()
            .collect()
    }

    pub fn resolve_role_first(&self, role: ColumnRole) -> Option<String> {
        self.resolve_role(role).into_iter().next()
    }
}
