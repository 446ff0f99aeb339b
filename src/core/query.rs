//! Listing query parameters
//!
//! Query strings are read leniently. Parameter names match
//! case-insensitively, and a value that does not parse is logged and
//! treated as if it had not been sent. Only the sort expression is checked
//! strictly, later, by the pipeline.
//!
//! # Example
//! ```text
//! GET /vehicleEnrollments?fields=id,cost&sort=-cost&pageNumber=2&pageSize=20
//! GET /vehicleEnrollments?routeId=3&fromCost=10&toCost=50&isCancelled=false
//! ```

use crate::core::field::{parse_bool, parse_datetime, parse_duration};
use crate::core::filter::FilterSet;
use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;

/// Raw query-string parameters with case-insensitive names
#[derive(Debug, Clone, Default)]
pub struct RawQuery {
    params: HashMap<String, String>,
}

impl RawQuery {
    /// Build from `(name, value)` pairs; a repeated name keeps the last value
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let params = pairs
            .into_iter()
            .map(|(name, value)| (name.as_ref().to_ascii_lowercase(), value.into()))
            .collect();
        Self { params }
    }

    /// Trimmed, non-blank value of a parameter
    pub fn str(&self, name: &str) -> Option<&str> {
        self.params
            .get(&name.to_ascii_lowercase())
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    pub fn i64(&self, name: &str) -> Option<i64> {
        self.parsed(name, |raw| raw.parse::<i64>().ok())
    }

    /// Integer that saturates at the `i64` bounds instead of being dropped
    /// when it is all digits but too large
    pub fn i64_saturating(&self, name: &str) -> Option<i64> {
        self.parsed(name, |raw| {
            raw.parse::<i64>().ok().or_else(|| {
                let (negative, digits) = match raw.strip_prefix('-') {
                    Some(rest) => (true, rest),
                    None => (false, raw.strip_prefix('+').unwrap_or(raw)),
                };
                (!digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
                    .then_some(if negative { i64::MIN } else { i64::MAX })
            })
        })
    }

    pub fn f64(&self, name: &str) -> Option<f64> {
        self.parsed(name, |raw| raw.parse::<f64>().ok().filter(|v| v.is_finite()))
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.parsed(name, parse_bool)
    }

    pub fn datetime(&self, name: &str) -> Option<DateTime<Utc>> {
        self.parsed(name, parse_datetime)
    }

    pub fn duration(&self, name: &str) -> Option<TimeDelta> {
        self.parsed(name, parse_duration)
    }

    pub fn uuid(&self, name: &str) -> Option<Uuid> {
        self.parsed(name, |raw| Uuid::from_str(raw).ok())
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    fn parsed<V>(&self, name: &str, parse: impl FnOnce(&str) -> Option<V>) -> Option<V> {
        let raw = self.str(name)?;
        let value = parse(raw);
        if value.is_none() {
            tracing::warn!(parameter = name, value = raw, "ignoring unparsable query parameter");
        }
        value
    }
}

/// Parameters shared by every listing endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QueryParams {
    /// Comma-separated output fields (resource default when absent)
    pub fields: Option<String>,

    /// Sort expression, e.g. `-departureDateTimeUtc,cost`
    pub sort: Option<String>,

    /// Page number (starts at 1, clamped)
    pub page_number: Option<i64>,

    /// Items per page (clamped to the configured maximum)
    pub page_size: Option<i64>,
}

impl QueryParams {
    /// Extract the shared parameters from a raw query
    pub fn from_raw(query: &RawQuery) -> Self {
        Self {
            fields: query.str("fields").map(str::to_string),
            sort: query.str("sort").map(str::to_string),
            page_number: query.i64_saturating("pageNumber"),
            page_size: query.i64_saturating("pageSize"),
        }
    }

    pub fn fields(&self) -> Option<&str> {
        self.fields.as_deref()
    }

    pub fn sort(&self) -> Option<&str> {
        self.sort.as_deref()
    }
}

/// Resource-specific filter parameters
///
/// Implementations read their optional parameters from the raw query and
/// turn the present ones into clauses.
pub trait FilterCriteria: Default + Send + Sync + Sized {
    /// Entity type the criteria filter
    type Target: 'static;

    /// Read the criteria from a raw query
    fn from_query(query: &RawQuery) -> Self;

    /// Build the conjunction of every present criterion
    fn into_filter(self) -> FilterSet<Self::Target>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn query(pairs: &[(&str, &str)]) -> RawQuery {
        RawQuery::from_pairs(pairs.iter().map(|(k, v)| (*k, v.to_string())))
    }

    #[test]
    fn test_names_are_case_insensitive() {
        let q = query(&[("PAGENUMBER", "3"), ("routeid", "7")]);
        assert_eq!(q.i64("pageNumber"), Some(3));
        assert_eq!(q.i64("routeId"), Some(7));
    }

    #[test]
    fn test_blank_values_are_absent() {
        let q = query(&[("search", "   "), ("fields", "")]);
        assert_eq!(q.str("search"), None);
        assert_eq!(q.str("fields"), None);
    }

    #[test]
    fn test_unparsable_values_are_absent() {
        let q = query(&[
            ("fromCost", "cheap"),
            ("isCancelled", "maybe"),
            ("userId", "not-a-uuid"),
            ("fromDepartureDateTime", "yesterday"),
        ]);
        assert_eq!(q.f64("fromCost"), None);
        assert_eq!(q.bool("isCancelled"), None);
        assert_eq!(q.uuid("userId"), None);
        assert_eq!(q.datetime("fromDepartureDateTime"), None);
    }

    #[test]
    fn test_typed_getters() {
        let q = query(&[
            ("fromCost", "10.5"),
            ("isCancelled", "TRUE"),
            ("fromTotalTripDuration", "02:30:00"),
            ("fromDepartureDateTime", "2024-05-01T08:00:00Z"),
        ]);
        assert_eq!(q.f64("fromCost"), Some(10.5));
        assert_eq!(q.bool("isCancelled"), Some(true));
        assert_eq!(q.duration("fromTotalTripDuration"), Some(TimeDelta::minutes(150)));
        assert_eq!(
            q.datetime("fromDepartureDateTime"),
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_non_finite_floats_are_rejected() {
        let q = query(&[("toCost", "NaN"), ("fromCost", "inf")]);
        assert_eq!(q.f64("toCost"), None);
        assert_eq!(q.f64("fromCost"), None);
    }

    #[test]
    fn test_query_params_from_raw() {
        let q = query(&[
            ("Fields", "id,name"),
            ("sort", "-name"),
            ("pageNumber", "two"),
            ("pagesize", "25"),
        ]);
        let params = QueryParams::from_raw(&q);
        assert_eq!(params.fields(), Some("id,name"));
        assert_eq!(params.sort(), Some("-name"));
        assert_eq!(params.page_number, None);
        assert_eq!(params.page_size, Some(25));
    }

    #[test]
    fn test_oversized_page_coordinates_saturate() {
        let q = query(&[
            ("pageSize", "99999999999999999999999"),
            ("pageNumber", "-99999999999999999999999"),
            ("routeId", "99999999999999999999999"),
        ]);
        let params = QueryParams::from_raw(&q);
        assert_eq!(params.page_size, Some(i64::MAX));
        assert_eq!(params.page_number, Some(i64::MIN));
        assert_eq!(q.i64("routeId"), None);
        assert_eq!(q.i64_saturating("pageSize"), Some(i64::MAX));
        assert_eq!(query(&[("pageSize", "12abc")]).i64_saturating("pageSize"), None);
    }

    #[test]
    fn test_query_params_defaults() {
        let params = QueryParams::from_raw(&RawQuery::default());
        assert_eq!(params, QueryParams::default());
    }
}
