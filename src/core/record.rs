//! Dynamically-shaped records produced by the listing pipeline

use crate::core::field::FieldValue;
use indexmap::IndexMap;
use serde::Serialize;

/// Anything that can enumerate its fields and fetch them by name
///
/// Field names are matched case-insensitively; `field_names` returns the
/// canonical spelling. Entities implement this through `impl_resource!`,
/// and a shaped [`Record`] implements it too, so shaping and sorting never
/// need compile-time knowledge of a particular schema.
pub trait FieldSource {
    /// Canonical names of every field this source exposes
    fn field_names(&self) -> Vec<&str>;

    /// Get the value of a field, matching the name case-insensitively
    fn field_value(&self, name: &str) -> Option<FieldValue>;
}

/// A partial projection of an entity, keyed by output field name
///
/// Fields keep the order in which they were inserted, which is the order
/// the caller requested them in. Serializes as a flat JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record {
    fields: IndexMap<String, FieldValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field, replacing any existing field with the same name
    /// (compared case-insensitively)
    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        let name = name.into();
        match self.position(&name) {
            Some(index) => {
                if let Some((_, slot)) = self.fields.get_index_mut(index) {
                    *slot = value;
                }
            }
            None => {
                self.fields.insert(name, value);
            }
        }
    }

    /// Get a field by name, case-insensitively
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .get(name)
            .or_else(|| self.position(name).map(|index| &self.fields[index]))
    }

    /// Check whether the record has a field with this name
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Field names in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.fields
            .keys()
            .position(|key| key.eq_ignore_ascii_case(name))
    }
}

impl FieldSource for Record {
    fn field_names(&self) -> Vec<&str> {
        self.keys().collect()
    }

    fn field_value(&self, name: &str) -> Option<FieldValue> {
        self.get(name).cloned()
    }
}

impl FromIterator<(String, FieldValue)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (name, value) in iter {
            record.insert(name, value);
        }
        record
    }
}
