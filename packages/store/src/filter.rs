//! Equality filters and ordering for record-store queries.
//!
//! A [`Filter`] is a conjunction of `column = value` predicates. The same value is
//! evaluated locally by [`crate::MemoryBackend`] and rendered to query parameters by
//! the HTTP client (`email=eq.a@b.com`), so both backends agree on what matches.

use std::cmp::Ordering;

use serde_json::Value;

/// A conjunction of equality predicates.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Filter {
    predicates: Vec<(String, Value)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a `column = value` predicate.
    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.predicates.push((column.to_string(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn predicates(&self) -> &[(String, Value)] {
        &self.predicates
    }

    /// Whether a row satisfies every predicate.
    pub fn matches(&self, row: &Value) -> bool {
        self.predicates
            .iter()
            .all(|(column, expected)| row.get(column) == Some(expected))
    }

    /// Render as query parameters: `[("email", "eq.a@b.com")]`.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        self.predicates
            .iter()
            .map(|(column, value)| (column.clone(), format!("eq.{}", scalar_text(value))))
            .collect()
    }

    /// Render the first predicate as a realtime subscription filter: `email=eq.a@b.com`.
    ///
    /// The realtime service accepts a single predicate per subscription.
    pub fn to_realtime(&self) -> Option<String> {
        self.predicates
            .first()
            .map(|(column, value)| format!("{column}=eq.{}", scalar_text(value)))
    }
}

/// Result ordering for a select.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

impl Order {
    pub fn asc(column: &str) -> Self {
        Self {
            column: column.to_string(),
            ascending: true,
        }
    }

    pub fn desc(column: &str) -> Self {
        Self {
            column: column.to_string(),
            ascending: false,
        }
    }

    /// Render as the `order` query parameter value: `created_at.desc`.
    pub fn to_query_value(&self) -> String {
        let direction = if self.ascending { "asc" } else { "desc" };
        format!("{}.{direction}", self.column)
    }

    /// Compare two rows by this ordering.
    pub fn compare(&self, a: &Value, b: &Value) -> Ordering {
        let ord = compare_values(a.get(&self.column), b.get(&self.column));
        if self.ascending {
            ord
        } else {
            ord.reverse()
        }
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

// Missing and null sort first; numbers numerically; everything else by text.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Less,
        (_, None | Some(Value::Null)) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(x), Some(y)) => scalar_text(x).cmp(&scalar_text(y)),
    }
}
