//! Sort expressions: parsing and stable multi-key ordering
//!
//! # Grammar
//!
//! A sort expression is a comma-separated list of field names. A leading
//! `-` marks a key as descending; a trailing `desc` or `asc` word is also
//! accepted. Whitespace around tokens is trimmed and empty tokens are
//! skipped.
//!
//! ```text
//! sort=-departureDateTimeUtc,cost
//! sort=name desc, id
//! ```
//!
//! Unlike field selection, parsing is strict: a token that names a field
//! outside the output schema fails with
//! [`QueryError::InvalidSortExpression`]. Dropping such a token would change
//! the result order without telling the caller.

use crate::core::error::QueryError;
use crate::core::field::FieldValue;
use crate::core::record::FieldSource;
use crate::core::shaping::Selection;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

/// One ordering key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SortKey {
    pub field: String,
    pub descending: bool,
}

impl SortKey {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }
}

/// Ordered, non-empty list of sort keys; the first key is primary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    keys: Vec<SortKey>,
}

impl SortSpec {
    /// Build a spec from keys, or `None` if there are none
    pub fn new(keys: Vec<SortKey>) -> Option<Self> {
        if keys.is_empty() {
            None
        } else {
            Some(Self { keys })
        }
    }

    /// Single ascending key
    pub fn by(field: impl Into<String>) -> Self {
        Self {
            keys: vec![SortKey::ascending(field)],
        }
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    pub fn primary(&self) -> &SortKey {
        &self.keys[0]
    }

    /// Parse an expression against the selected output fields
    ///
    /// An absent or blank expression yields `default`.
    pub fn parse(
        expression: Option<&str>,
        selection: &Selection,
        default: &SortSpec,
    ) -> Result<Self, QueryError> {
        let known: Vec<&str> = selection.fields().iter().map(String::as_str).collect();
        Self::parse_against(expression, &known, default)
    }

    /// Parse an expression against an explicit list of field names
    pub fn parse_against(
        expression: Option<&str>,
        known: &[&str],
        default: &SortSpec,
    ) -> Result<Self, QueryError> {
        let Some(expression) = expression.filter(|e| !e.trim().is_empty()) else {
            return Ok(default.clone());
        };

        let mut keys = Vec::new();
        for token in expression.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let (name, descending) = split_direction(token)
                .ok_or_else(|| invalid(expression, format!("malformed sort token '{token}'")))?;

            let Some(canonical) = known.iter().find(|k| k.eq_ignore_ascii_case(name)) else {
                return Err(invalid(expression, format!("unknown sort field '{name}'")));
            };

            keys.push(SortKey {
                field: canonical.to_string(),
                descending,
            });
        }

        Ok(Self::new(keys).unwrap_or_else(|| default.clone()))
    }

    /// Compare two records key by key
    pub fn compare<R: FieldSource + ?Sized>(&self, a: &R, b: &R) -> Ordering {
        for key in &self.keys {
            let left = a.field_value(&key.field).unwrap_or(FieldValue::Null);
            let right = b.field_value(&key.field).unwrap_or(FieldValue::Null);

            let ordering = left.natural_cmp(&right);
            let ordering = if key.descending {
                ordering.reverse()
            } else {
                ordering
            };

            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }

    /// Stable in-place sort
    pub fn sort<R: FieldSource>(&self, records: &mut [R]) {
        records.sort_by(|a, b| self.compare(a, b));
    }

    /// Stable sort of an owned sequence
    pub fn apply<R: FieldSource>(&self, mut records: Vec<R>) -> Vec<R> {
        self.sort(&mut records);
        records
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tokens: Vec<String> = self
            .keys
            .iter()
            .map(|key| {
                if key.descending {
                    format!("-{}", key.field)
                } else {
                    key.field.clone()
                }
            })
            .collect();
        write!(f, "{}", tokens.join(","))
    }
}

/// Split a token into field name and direction
fn split_direction(token: &str) -> Option<(&str, bool)> {
    if let Some(rest) = token.strip_prefix('-') {
        let rest = rest.trim();
        return (!rest.is_empty() && !rest.contains(char::is_whitespace)).then_some((rest, true));
    }

    let mut words = token.split_whitespace();
    let name = words.next()?;
    let descending = match words.next().map(str::to_ascii_lowercase).as_deref() {
        None | Some("asc") => false,
        Some("desc") => true,
        Some(_) => return None,
    };

    words.next().is_none().then_some((name, descending))
}

fn invalid(expression: &str, reason: String) -> QueryError {
    QueryError::InvalidSortExpression {
        expression: expression.to_string(),
        reason,
    }
}
