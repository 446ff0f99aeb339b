//! Routes and their ordered stops

use crate::core::field::duration_format;
use crate::core::filter::{FilterSet, contains_text, equals};
use crate::core::query::{FilterCriteria, RawQuery};
use crate::entities::enrollment::validate_leg_span;
use crate::impl_resource;
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// One stop of a route, with the leg to the next stop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RouteAddress {
    pub address_id: i64,

    /// Position of the stop along the route (starting at 1)
    #[validate(range(min = 1))]
    pub order: i32,

    #[serde(with = "duration_format")]
    #[validate(custom(function = "validate_leg_span"))]
    pub time_span_to_next_city: TimeDelta,

    #[serde(with = "duration_format")]
    #[validate(custom(function = "validate_leg_span"))]
    pub wait_time_span: TimeDelta,

    #[validate(range(min = 0.0))]
    pub cost_to_next_city: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    #[serde(default)]
    pub id: i64,

    /// Vehicle type the route is served by (e.g. "bus", "train")
    #[serde(rename = "type")]
    #[validate(length(min = 1, max = 32))]
    pub route_type: String,

    #[serde(default = "default_active")]
    pub is_active: bool,

    #[serde(default)]
    #[validate(nested)]
    pub route_addresses: Vec<RouteAddress>,
}

fn default_active() -> bool {
    true
}

impl Route {
    pub fn stop_count(&self) -> i64 {
        self.route_addresses.len() as i64
    }

    /// Stops in travel order
    pub fn ordered_stops(&self) -> Vec<&RouteAddress> {
        let mut stops: Vec<&RouteAddress> = self.route_addresses.iter().collect();
        stops.sort_by_key(|stop| stop.order);
        stops
    }
}

impl_resource!(
    Route,
    "route",
    "routes",
    "id,type,isActive",
    fields {
        "id" => id,
        "type" => route_type,
        "isActive" => is_active,
    }
    computed {
        "stopCount" => stop_count,
    }
);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteCriteria {
    pub route_type: Option<String>,
    pub is_active: Option<bool>,
    pub search: Option<String>,
}

impl FilterCriteria for RouteCriteria {
    type Target = Route;

    fn from_query(query: &RawQuery) -> Self {
        Self {
            route_type: query.str("type").map(str::to_string),
            is_active: query.bool("isActive"),
            search: query.str("search").map(str::to_string),
        }
    }

    fn into_filter(self) -> FilterSet<Route> {
        fn route_type(r: &Route) -> Option<&str> {
            Some(&r.route_type)
        }

        FilterSet::new()
            .clause_if("type", self.route_type, |value| {
                equals(|r: &Route| r.route_type.to_lowercase(), value.to_lowercase())
            })
            .clause_if("isActive", self.is_active, |active| {
                equals(|r: &Route| r.is_active, active)
            })
            .clause_if("search", self.search, |value| {
                contains_text(&[route_type], &value)
            })
    }
}
