//! Resource trait and the type-erased field accessor table

use crate::core::field::FieldValue;
use crate::core::record::FieldSource;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;

/// Getter for one public field of an entity
pub type FieldGetter<T> = fn(&T) -> FieldValue;

/// Mapping from public field name to getter for one entity type
///
/// Built once per type (see `impl_resource!`) and shared by every request.
/// Lookups are case-insensitive; [`names`](Self::names) keeps the declared
/// order and spelling.
pub struct FieldAccessors<T> {
    entries: Vec<(&'static str, FieldGetter<T>)>,
    index: HashMap<String, usize>,
}

impl<T> FieldAccessors<T> {
    /// Build the table from `(name, getter)` pairs
    ///
    /// A later entry with the same (case-insensitive) name is ignored.
    pub fn new(entries: Vec<(&'static str, FieldGetter<T>)>) -> Self {
        let mut kept = Vec::with_capacity(entries.len());
        let mut index = HashMap::with_capacity(entries.len());

        for (name, getter) in entries {
            let key = name.to_ascii_lowercase();
            if index.contains_key(&key) {
                continue;
            }
            index.insert(key, kept.len());
            kept.push((name, getter));
        }

        Self {
            entries: kept,
            index,
        }
    }

    /// Declared field names, in order
    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|(name, _)| *name).collect()
    }

    /// Canonical spelling of a field name, if the type exposes it
    pub fn canonical(&self, name: &str) -> Option<&'static str> {
        self.lookup(name).map(|(name, _)| *name)
    }

    /// Read one field from an entity
    pub fn get(&self, entity: &T, name: &str) -> Option<FieldValue> {
        self.lookup(name).map(|(_, getter)| getter(entity))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn lookup(&self, name: &str) -> Option<&(&'static str, FieldGetter<T>)> {
        self.index
            .get(&name.trim().to_ascii_lowercase())
            .map(|&position| &self.entries[position])
    }
}

/// Base trait for every resource exposed through the listing pipeline
///
/// A resource is a persisted domain entity with an integer identifier and
/// a public field table. Implementations are generated by `impl_resource!`.
pub trait Resource: FieldSource + Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// The plural resource name used in URLs (e.g., "vehicleEnrollments")
    fn resource_name() -> &'static str;

    /// The singular resource name (e.g., "vehicleEnrollment")
    fn resource_name_singular() -> &'static str;

    /// Name of the identifier field in the public shape
    fn id_field() -> &'static str {
        "id"
    }

    /// Comma-separated field list used when the caller does not ask for any
    fn default_fields() -> &'static str;

    /// Public field table for this type
    fn accessors() -> &'static FieldAccessors<Self>;

    /// Get the unique identifier for this entity instance
    fn id(&self) -> i64;

    /// Replace the identifier (used by stores when assigning one)
    fn set_id(&mut self, id: i64);
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Stop {
        id: i64,
        name: String,
    }

    fn table() -> FieldAccessors<Stop> {
        FieldAccessors::new(vec![
            ("id", (|s: &Stop| FieldValue::Integer(s.id)) as FieldGetter<Stop>),
            (
                "stationName",
                (|s: &Stop| FieldValue::String(s.name.clone())) as FieldGetter<Stop>,
            ),
            ("STATIONNAME", (|_: &Stop| FieldValue::Null) as FieldGetter<Stop>),
        ])
    }

    #[test]
    fn test_duplicate_names_keep_first() {
        let table = table();
        assert_eq!(table.len(), 2);
        assert_eq!(table.names(), vec!["id", "stationName"]);
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let table = table();
        let stop = Stop {
            id: 3,
            name: "Central".to_string(),
        };

        assert_eq!(table.canonical("stationname"), Some("stationName"));
        assert_eq!(
            table.get(&stop, "STATIONNAME"),
            Some(FieldValue::String("Central".to_string()))
        );
        assert_eq!(table.get(&stop, " id "), Some(FieldValue::Integer(3)));
        assert_eq!(table.get(&stop, "platform"), None);
    }
}
