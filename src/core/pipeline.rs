//! The listing pipeline shared by every resource
//!
//! A listing request runs through fixed stages:
//!
//! 1. **plan**: resolve the output selection, parse the sort expression
//!    against it and normalize page coordinates. A bad sort fails here,
//!    before any data is touched.
//! 2. **filter**: simple clauses (normally already applied by the store
//!    while scanning), then aggregate clauses over the materialized
//!    candidates.
//! 3. **sort**: stable multi-key sort of the matched entities. Requested
//!    keys are always selected fields; the default order may name a field
//!    the caller left out and still applies.
//! 4. **shape**: project each entity onto the selection.
//! 5. **paginate**: slice the requested page and compute metadata.

use crate::core::entity::Resource;
use crate::core::error::QueryError;
use crate::core::filter::FilterSet;
use crate::core::paging::{Page, PageRequest, Paginator};
use crate::core::query::QueryParams;
use crate::core::record::Record;
use crate::core::shaping::{FieldSelector, Selection};
use crate::core::sorting::SortSpec;
use std::marker::PhantomData;

/// Everything decided about a listing before data is read
#[derive(Debug, Clone, PartialEq)]
pub struct ListingPlan {
    pub selection: Selection,
    pub sort: SortSpec,
    pub page: PageRequest,
}

/// Generic shape/sort/page engine for one resource type
pub struct ResourcePipeline<T> {
    selector: FieldSelector,
    default_sort: SortSpec,
    paginator: Paginator,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for ResourcePipeline<T> {
    fn clone(&self) -> Self {
        Self {
            selector: self.selector.clone(),
            default_sort: self.default_sort.clone(),
            paginator: self.paginator,
            _marker: PhantomData,
        }
    }
}

impl<T: Resource> ResourcePipeline<T> {
    /// Pipeline using the resource's default fields, sorted by identifier
    pub fn new(paginator: Paginator) -> Self {
        Self {
            selector: FieldSelector::for_resource::<T>(),
            default_sort: SortSpec::by(T::id_field()),
            paginator,
            _marker: PhantomData,
        }
    }

    /// Override the order used when no sort is requested
    pub fn with_default_sort(mut self, sort: SortSpec) -> Self {
        self.default_sort = sort;
        self
    }

    pub fn selector(&self) -> &FieldSelector {
        &self.selector
    }

    pub fn default_sort(&self) -> &SortSpec {
        &self.default_sort
    }

    /// Resolve selection, sort and page for a request
    pub fn plan(&self, params: &QueryParams) -> Result<ListingPlan, QueryError> {
        let known = T::accessors().names();
        let selection = self.selector.select(&known, params.fields());
        let sort = SortSpec::parse(params.sort(), &selection, &self.default_sort)?;
        let page = self.paginator.request(params.page_number, params.page_size);

        tracing::debug!(
            resource = T::resource_name(),
            fields = ?selection.fields(),
            sort = %sort,
            page = page.page_number(),
            page_size = page.page_size(),
            "planned listing"
        );

        Ok(ListingPlan {
            selection,
            sort,
            page,
        })
    }

    /// Run the post-materialization stages over candidates that already
    /// passed the simple clauses
    pub fn run(&self, plan: &ListingPlan, candidates: Vec<T>, filter: &FilterSet<T>) -> Page<Record> {
        let scanned = candidates.len();
        let matched = plan.sort.apply(filter.apply_aggregate(candidates));

        let shaped: Vec<Record> = matched
            .iter()
            .map(|entity| plan.selection.project(entity))
            .collect();
        let page = Paginator::slice(shaped, plan.page);

        tracing::debug!(
            resource = T::resource_name(),
            scanned,
            matched = page.metadata.total_count,
            returned = page.items.len(),
            "listing complete"
        );

        page
    }

    /// Plan and run a listing over unfiltered entities
    pub fn execute(
        &self,
        params: &QueryParams,
        entities: Vec<T>,
        filter: &FilterSet<T>,
    ) -> Result<Page<Record>, QueryError> {
        let plan = self.plan(params)?;
        let candidates = filter.apply_simple(entities);
        Ok(self.run(&plan, candidates, filter))
    }

    /// Shape one entity (single-item fetch and create responses)
    pub fn shape_one(&self, entity: &T, fields: Option<&str>) -> Record {
        let known = T::accessors().names();
        self.selector.select(&known, fields).project(entity)
    }

    /// Shape one entity with every field it exposes
    pub fn shape_full(&self, entity: &T) -> Record {
        let known = T::accessors().names();
        let all = known.join(",");
        self.selector.select(&known, Some(all.as_str())).project(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::field::FieldValue;
    use crate::core::filter::{RangeBound, equals, within};
    use crate::entities::geography::City;

    fn city(id: i64, name: &str, state_id: i64) -> City {
        City {
            id,
            name: name.to_string(),
            state_id,
        }
    }

    fn cities() -> Vec<City> {
        (1..=25)
            .map(|i| city(i, &format!("City {:02}", 26 - i), if i % 2 == 0 { 1 } else { 2 }))
            .collect()
    }

    fn params(fields: Option<&str>, sort: Option<&str>, page: Option<i64>, size: Option<i64>) -> QueryParams {
        QueryParams {
            fields: fields.map(str::to_string),
            sort: sort.map(str::to_string),
            page_number: page,
            page_size: size,
        }
    }

    fn ids(page: &Page<Record>) -> Vec<i64> {
        page.items
            .iter()
            .map(|r| r.get("id").and_then(FieldValue::as_integer).unwrap())
            .collect()
    }

    #[test]
    fn test_defaults() {
        let pipeline = ResourcePipeline::<City>::new(Paginator::default());
        let page = pipeline
            .execute(&QueryParams::default(), cities(), &FilterSet::new())
            .unwrap();

        assert_eq!(ids(&page), (1..=10).collect::<Vec<_>>());
        assert_eq!(page.metadata.total_count, 25);
        assert_eq!(page.metadata.total_pages, 3);
        assert_eq!(
            page.items[0].keys().collect::<Vec<_>>(),
            vec!["id", "name", "stateId"]
        );
    }

    #[test]
    fn test_shape_sort_page() {
        let pipeline = ResourcePipeline::<City>::new(Paginator::default());
        let page = pipeline
            .execute(
                &params(Some("name"), Some("name"), Some(1), Some(3)),
                cities(),
                &FilterSet::new(),
            )
            .unwrap();

        // names run backwards relative to ids
        assert_eq!(ids(&page), vec![25, 24, 23]);
        assert_eq!(page.items[0].keys().collect::<Vec<_>>(), vec!["id", "name"]);
    }

    #[test]
    fn test_sort_outside_selection_is_rejected() {
        let pipeline = ResourcePipeline::<City>::new(Paginator::default());
        let err = pipeline
            .execute(
                &params(Some("name"), Some("stateId"), None, None),
                cities(),
                &FilterSet::new(),
            )
            .unwrap_err();
        assert!(matches!(err, QueryError::InvalidSortExpression { .. }));
    }

    #[test]
    fn test_unknown_sort_field_is_rejected_before_filtering() {
        let pipeline = ResourcePipeline::<City>::new(Paginator::default());
        assert!(pipeline.plan(&params(None, Some("bogusField"), None, None)).is_err());
    }

    #[test]
    fn test_filters_apply_before_paging() {
        let pipeline = ResourcePipeline::<City>::new(Paginator::default());
        let filter = FilterSet::new()
            .clause("stateId", equals(|c: &City| c.state_id, 1))
            .aggregate(
                "idRange",
                within(|c: &City| c.id, RangeBound::from_options(Some(5), Some(20)).unwrap()),
            );

        let page = pipeline
            .execute(&params(None, Some("-id"), Some(2), Some(3)), cities(), &filter)
            .unwrap();

        // even ids 6..=20 descending: 20 18 16 | 14 12 10 | 8 6
        assert_eq!(ids(&page), vec![14, 12, 10]);
        assert_eq!(page.metadata.total_count, 8);
        assert_eq!(page.metadata.total_pages, 3);
        assert!(page.metadata.has_next);
        assert!(page.metadata.has_previous);
    }

    #[test]
    fn test_page_size_is_clamped() {
        let pipeline = ResourcePipeline::<City>::new(Paginator::new(10, 5));
        let page = pipeline
            .execute(&params(None, None, Some(0), Some(500)), cities(), &FilterSet::new())
            .unwrap();
        assert_eq!(page.metadata.page_size, 5);
        assert_eq!(page.metadata.current_page, 1);
    }

    #[test]
    fn test_shape_one_keeps_identifier() {
        let pipeline = ResourcePipeline::<City>::new(Paginator::default());
        let record = pipeline.shape_one(&city(4, "Odesa", 3), Some("stateId"));
        assert_eq!(record.keys().collect::<Vec<_>>(), vec!["id", "stateId"]);
    }

    #[test]
    fn test_shape_full_includes_computed_fields() {
        use crate::entities::routes::Route;

        let pipeline = ResourcePipeline::<Route>::new(Paginator::default());
        let route = Route {
            id: 3,
            route_type: "train".to_string(),
            is_active: true,
            route_addresses: Vec::new(),
        };
        let record = pipeline.shape_full(&route);
        assert_eq!(
            record.keys().collect::<Vec<_>>(),
            vec!["id", "type", "isActive", "stopCount"]
        );
    }

    #[test]
    fn test_default_sort_applies_to_unselected_field() {
        let pipeline = ResourcePipeline::<City>::new(Paginator::default())
            .with_default_sort(SortSpec::by("name"));
        let page = pipeline
            .execute(&params(Some("id,stateId"), None, None, Some(3)), cities(), &FilterSet::new())
            .unwrap();

        assert_eq!(ids(&page), vec![25, 24, 23]);
        assert_eq!(page.items[0].keys().collect::<Vec<_>>(), vec!["id", "stateId"]);
    }

    #[test]
    fn test_custom_default_sort() {
        let pipeline = ResourcePipeline::<City>::new(Paginator::default())
            .with_default_sort(SortSpec::by("name"));
        let page = pipeline
            .execute(&params(None, None, None, Some(2)), cities(), &FilterSet::new())
            .unwrap();
        assert_eq!(ids(&page), vec![25, 24]);
    }
}
