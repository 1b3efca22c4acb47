use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Trim labels, drop empty ones and keep the first occurrence of each.
pub fn dedup_labels<I, S>(labels: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for label in labels {
        let label = label.as_ref().trim();
        if label.is_empty() || !seen.insert(label.to_string()) {
            continue;
        }
        out.push(label.to_string());
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("a checklist needs at least one non-blank item")]
pub struct EmptyChecklistError;

/// Ordered, de-duplicated, non-empty list of checklist labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct ChecklistDefinition {
    items: Vec<String>,
}

impl ChecklistDefinition {
    pub fn new<I, S>(labels: I) -> Result<Self, EmptyChecklistError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let items = dedup_labels(labels);
        if items.is_empty() {
            return Err(EmptyChecklistError);
        }
        Ok(Self { items })
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn get(&self, step: usize) -> Option<&str> {
        self.items.get(step).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }
}

impl TryFrom<Vec<String>> for ChecklistDefinition {
    type Error = EmptyChecklistError;

    fn try_from(value: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ChecklistDefinition> for Vec<String> {
    fn from(value: ChecklistDefinition) -> Self {
        value.items
    }
}
