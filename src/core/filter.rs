//! Filter composition: per-resource predicates combined as a conjunction
//!
//! Two classes of clause make up a [`FilterSet`]:
//!
//! - **simple** clauses look at one scalar of the entity (equality,
//!   inclusive ranges, case-insensitive substring search). A store may
//!   evaluate them while scanning, before anything is materialized.
//! - **aggregate** clauses reduce a nested collection to a scalar (for
//!   example the summed leg cost of an enrollment) and compare that against
//!   a range. They run as a separate pass over the materialized candidates,
//!   after simple clauses and relation scoping have shrunk the set. That pass
//!   costs O(candidates × nested size) and is not index-assisted.
//!
//! Every clause is optional: builders only add one when its parameter is
//! present, so a missing parameter never narrows the result.

use chrono::TimeDelta;

type Predicate<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

struct Clause<T> {
    name: &'static str,
    test: Predicate<T>,
}

/// A conjunction of optional clauses over `T`
pub struct FilterSet<T> {
    simple: Vec<Clause<T>>,
    aggregate: Vec<Clause<T>>,
}

impl<T: 'static> Default for FilterSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> FilterSet<T> {
    pub fn new() -> Self {
        Self {
            simple: Vec::new(),
            aggregate: Vec::new(),
        }
    }

    /// Add a simple clause
    pub fn clause<P>(mut self, name: &'static str, predicate: P) -> Self
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.simple.push(Clause {
            name,
            test: Box::new(predicate),
        });
        self
    }

    /// Add a simple clause only when `value` is present
    pub fn clause_if<V, P>(self, name: &'static str, value: Option<V>, build: impl FnOnce(V) -> P) -> Self
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        match value {
            Some(value) => self.clause(name, build(value)),
            None => self,
        }
    }

    /// Add an aggregate clause, evaluated after materialization
    pub fn aggregate<P>(mut self, name: &'static str, predicate: P) -> Self
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.aggregate.push(Clause {
            name,
            test: Box::new(predicate),
        });
        self
    }

    /// Add an aggregate clause only when `value` is present
    pub fn aggregate_if<V, P>(
        self,
        name: &'static str,
        value: Option<V>,
        build: impl FnOnce(V) -> P,
    ) -> Self
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        match value {
            Some(value) => self.aggregate(name, build(value)),
            None => self,
        }
    }

    /// Merge another set into this one (still a conjunction)
    pub fn and(mut self, other: FilterSet<T>) -> Self {
        self.simple.extend(other.simple);
        self.aggregate.extend(other.aggregate);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.simple.is_empty() && self.aggregate.is_empty()
    }

    pub fn has_aggregates(&self) -> bool {
        !self.aggregate.is_empty()
    }

    /// Names of the active clauses, simple first
    pub fn clause_names(&self) -> Vec<&'static str> {
        self.simple
            .iter()
            .chain(self.aggregate.iter())
            .map(|clause| clause.name)
            .collect()
    }

    /// Whether `item` passes every simple clause
    pub fn matches_simple(&self, item: &T) -> bool {
        self.simple.iter().all(|clause| (clause.test)(item))
    }

    /// Whether `item` passes every aggregate clause
    pub fn matches_aggregate(&self, item: &T) -> bool {
        self.aggregate.iter().all(|clause| (clause.test)(item))
    }

    /// Whether `item` passes every clause
    pub fn matches(&self, item: &T) -> bool {
        self.matches_simple(item) && self.matches_aggregate(item)
    }

    /// Keep only items passing the simple clauses
    pub fn apply_simple(&self, items: Vec<T>) -> Vec<T> {
        items.into_iter().filter(|item| self.matches_simple(item)).collect()
    }

    /// Keep only items passing the aggregate clauses
    pub fn apply_aggregate(&self, items: Vec<T>) -> Vec<T> {
        if self.aggregate.is_empty() {
            return items;
        }
        items
            .into_iter()
            .filter(|item| self.matches_aggregate(item))
            .collect()
    }
}

// =============================================================================
// Ranges
// =============================================================================

/// Inclusive range with independently optional bounds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeBound<V> {
    pub from: Option<V>,
    pub to: Option<V>,
}

impl<V: PartialOrd> RangeBound<V> {
    /// Build a range from `from*`/`to*` parameters, or `None` when neither
    /// bound was given
    pub fn from_options(from: Option<V>, to: Option<V>) -> Option<Self> {
        if from.is_none() && to.is_none() {
            None
        } else {
            Some(Self { from, to })
        }
    }

    /// Both bounds are inclusive
    pub fn contains(&self, value: &V) -> bool {
        self.from.as_ref().is_none_or(|from| value >= from)
            && self.to.as_ref().is_none_or(|to| value <= to)
    }
}

// =============================================================================
// Simple predicate builders
// =============================================================================

/// Field equals a value
pub fn equals<T, V>(get: fn(&T) -> V, expected: V) -> impl Fn(&T) -> bool + Send + Sync + 'static
where
    T: 'static,
    V: PartialEq + Send + Sync + 'static,
{
    move |item| get(item) == expected
}

/// Field lies in an inclusive range
pub fn within<T, V>(get: fn(&T) -> V, range: RangeBound<V>) -> impl Fn(&T) -> bool + Send + Sync + 'static
where
    T: 'static,
    V: PartialOrd + Send + Sync + 'static,
{
    move |item| range.contains(&get(item))
}

/// Case-insensitive substring match over one or more text fields
///
/// Matches when any of the fields contains `needle`. Absent (`None`) fields
/// never match.
pub fn contains_text<T: 'static>(
    fields: &[fn(&T) -> Option<&str>],
    needle: &str,
) -> impl Fn(&T) -> bool + Send + Sync + 'static + use<T> {
    let fields = fields.to_vec();
    let needle = needle.trim().to_lowercase();
    move |item| {
        fields.iter().any(|get| {
            get(item).is_some_and(|text| text.to_lowercase().contains(&needle))
        })
    }
}

// =============================================================================
// Aggregate predicate builders
// =============================================================================

/// Scalar that nested measurements can be summed into
pub trait Aggregate: Copy + PartialOrd + Send + Sync + 'static {
    fn zero() -> Self;
    fn combine(self, other: Self) -> Self;
}

impl Aggregate for f64 {
    fn zero() -> Self {
        0.0
    }

    fn combine(self, other: Self) -> Self {
        self + other
    }
}

impl Aggregate for i64 {
    fn zero() -> Self {
        0
    }

    fn combine(self, other: Self) -> Self {
        self.saturating_add(other)
    }
}

impl Aggregate for TimeDelta {
    fn zero() -> Self {
        TimeDelta::zero()
    }

    fn combine(self, other: Self) -> Self {
        self.checked_add(&other).unwrap_or(TimeDelta::MAX)
    }
}

/// Sum one measurement over a nested collection
///
/// A missing (`None`) or empty collection sums to zero.
pub fn sum_nested<T, N, V: Aggregate>(item: &T, nested: fn(&T) -> Option<&[N]>, measure: fn(&N) -> V) -> V {
    nested(item)
        .unwrap_or_default()
        .iter()
        .map(measure)
        .fold(V::zero(), V::combine)
}

/// Nested sum lies in an inclusive range
pub fn nested_sum_within<T, N, V>(
    nested: fn(&T) -> Option<&[N]>,
    measure: fn(&N) -> V,
    range: RangeBound<V>,
) -> impl Fn(&T) -> bool + Send + Sync + 'static
where
    T: 'static,
    N: 'static,
    V: Aggregate,
{
    move |item| range.contains(&sum_nested(item, nested, measure))
}
