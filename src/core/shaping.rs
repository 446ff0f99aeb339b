//! Field selection: reducing a full record to the fields a caller asked for
//!
//! Selection is forgiving. Unknown names are dropped without error, blank
//! input falls back to the resource's default field list, and the
//! identifier field is always part of the output.

use crate::core::entity::Resource;
use crate::core::record::{FieldSource, Record};

/// The resolved, de-duplicated list of output fields for one request
///
/// Names use the canonical spelling of the underlying source.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selection {
    fields: Vec<String>,
}

impl Selection {
    /// Output field names in order
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Canonical spelling of a selected field, matched case-insensitively
    pub fn canonical(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|field| field.eq_ignore_ascii_case(name))
            .map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.canonical(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Build the partial record for one source
    pub fn project<S: FieldSource + ?Sized>(&self, source: &S) -> Record {
        let mut record = Record::new();
        for field in &self.fields {
            if let Some(value) = source.field_value(field) {
                record.insert(field.clone(), value);
            }
        }
        record
    }
}

/// Shapes records down to a requested subset of fields
#[derive(Debug, Clone)]
pub struct FieldSelector {
    default_fields: String,
    id_field: String,
}

impl FieldSelector {
    /// Create a selector with a comma-separated default list and the
    /// identifier field that is always included
    pub fn new(default_fields: impl Into<String>, id_field: impl Into<String>) -> Self {
        Self {
            default_fields: default_fields.into(),
            id_field: id_field.into(),
        }
    }

    /// Selector configured from a resource's defaults
    pub fn for_resource<T: Resource>() -> Self {
        Self::new(T::default_fields(), T::id_field())
    }

    pub fn default_fields(&self) -> &str {
        &self.default_fields
    }

    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    /// Resolve a requested field list against the names a source exposes
    ///
    /// `requested` is a comma-separated, case-insensitive list. When it is
    /// absent or blank the default list is used instead.
    pub fn select(&self, known: &[&str], requested: Option<&str>) -> Selection {
        let list = match requested {
            Some(list) if !list.trim().is_empty() => list,
            _ => self.default_fields.as_str(),
        };

        let mut fields: Vec<String> = Vec::new();
        for token in list.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let Some(canonical) = known.iter().find(|name| name.eq_ignore_ascii_case(token)) else {
                tracing::debug!(field = token, "ignoring unknown field in selection");
                continue;
            };
            if !fields.iter().any(|f| f == canonical) {
                fields.push(canonical.to_string());
            }
        }

        if let Some(id) = known.iter().find(|name| name.eq_ignore_ascii_case(&self.id_field)) {
            if !fields.iter().any(|f| f == id) {
                fields.insert(0, id.to_string());
            }
        }

        Selection { fields }
    }

    /// Shape one source
    pub fn shape<S: FieldSource + ?Sized>(&self, source: &S, requested: Option<&str>) -> Record {
        self.select(&source.field_names(), requested).project(source)
    }

    /// Shape every source with one shared selection
    pub fn shape_all<S: FieldSource>(
        &self,
        known: &[&str],
        sources: &[S],
        requested: Option<&str>,
    ) -> Vec<Record> {
        let selection = self.select(known, requested);
        sources.iter().map(|source| selection.project(source)).collect()
    }
}
