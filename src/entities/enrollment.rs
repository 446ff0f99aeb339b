//! Vehicle enrollments: a vehicle scheduled to run a route at a given time
//!
//! An enrollment carries its own per-leg details (travel time, wait time
//! and cost for every stop of the route). The derived `cost` and `duration`
//! fields, and the cost/duration range filters, aggregate over those legs.

use crate::core::field::duration_format;
use crate::core::filter::{FilterSet, RangeBound, contains_text, equals, nested_sum_within, sum_nested, within};
use crate::core::query::{FilterCriteria, RawQuery};
use crate::impl_resource;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Per-enrollment timing and price of one leg
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RouteAddressDetails {
    /// Stop the leg starts from
    pub address_id: i64,

    #[serde(with = "duration_format")]
    #[validate(custom(function = "validate_leg_span"))]
    pub time_span_to_next_city: TimeDelta,

    #[serde(with = "duration_format")]
    #[validate(custom(function = "validate_leg_span"))]
    pub wait_time_span: TimeDelta,

    #[validate(range(min = 0.0))]
    pub cost_to_next_city: f64,
}

impl RouteAddressDetails {
    /// Wait at the stop plus travel to the next one
    pub fn total_time(&self) -> TimeDelta {
        self.wait_time_span
            .checked_add(&self.time_span_to_next_city)
            .unwrap_or(TimeDelta::MAX)
    }
}

/// Longest wait or travel time accepted for a single leg or route stop
pub const MAX_LEG_SPAN_DAYS: i64 = 31;

pub(crate) fn validate_leg_span(span: &TimeDelta) -> Result<(), ValidationError> {
    if *span < TimeDelta::zero() {
        return Err(ValidationError::new("negative_span").with_message("must not be negative".into()));
    }
    if *span > TimeDelta::days(MAX_LEG_SPAN_DAYS) {
        return Err(ValidationError::new("span_too_long")
            .with_message(format!("must not exceed {} days", MAX_LEG_SPAN_DAYS).into()));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VehicleEnrollment {
    #[serde(default)]
    pub id: i64,

    pub vehicle_id: i64,

    pub route_id: i64,

    pub departure_date_time_utc: DateTime<Utc>,

    /// Present when the trip is cancelled
    #[serde(default)]
    #[validate(length(max = 255))]
    pub cancellation_comment: Option<String>,

    #[serde(default)]
    #[validate(nested)]
    pub route_address_details: Vec<RouteAddressDetails>,
}

fn legs(e: &VehicleEnrollment) -> Option<&[RouteAddressDetails]> {
    Some(&e.route_address_details)
}

fn leg_cost(leg: &RouteAddressDetails) -> f64 {
    leg.cost_to_next_city
}

fn leg_time(leg: &RouteAddressDetails) -> TimeDelta {
    leg.total_time()
}

impl VehicleEnrollment {
    pub fn is_cancelled(&self) -> bool {
        self.cancellation_comment.is_some()
    }

    /// Sum of per-leg cost
    pub fn total_cost(&self) -> f64 {
        sum_nested(self, legs, leg_cost)
    }

    /// Sum of per-leg wait and travel time
    pub fn total_duration(&self) -> TimeDelta {
        sum_nested(self, legs, leg_time)
    }
}

impl_resource!(
    VehicleEnrollment,
    "vehicleEnrollment",
    "vehicleEnrollments",
    "id,vehicleId,routeId,departureDateTimeUtc,isCancelled,cancellationComment,cost,duration",
    fields {
        "id" => id,
        "vehicleId" => vehicle_id,
        "routeId" => route_id,
        "departureDateTimeUtc" => departure_date_time_utc,
        "cancellationComment" => cancellation_comment,
    }
    computed {
        "isCancelled" => is_cancelled,
        "cost" => total_cost,
        "duration" => total_duration,
    }
);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VehicleEnrollmentCriteria {
    pub vehicle_id: Option<i64>,
    pub route_id: Option<i64>,
    pub departure: Option<RangeBound<DateTime<Utc>>>,
    pub is_cancelled: Option<bool>,
    pub cost: Option<RangeBound<f64>>,
    pub total_trip_duration: Option<RangeBound<TimeDelta>>,
    pub search: Option<String>,
}

impl FilterCriteria for VehicleEnrollmentCriteria {
    type Target = VehicleEnrollment;

    fn from_query(query: &RawQuery) -> Self {
        Self {
            vehicle_id: query.i64("vehicleId"),
            route_id: query.i64("routeId"),
            departure: RangeBound::from_options(
                query.datetime("fromDepartureDateTime"),
                query.datetime("toDepartureDateTime"),
            ),
            is_cancelled: query.bool("isCancelled"),
            cost: RangeBound::from_options(query.f64("fromCost"), query.f64("toCost")),
            total_trip_duration: RangeBound::from_options(
                query.duration("fromTotalTripDuration"),
                query.duration("toTotalTripDuration"),
            ),
            search: query.str("search").map(str::to_string),
        }
    }

    fn into_filter(self) -> FilterSet<VehicleEnrollment> {
        fn comment(e: &VehicleEnrollment) -> Option<&str> {
            e.cancellation_comment.as_deref()
        }

        FilterSet::new()
            .clause_if("search", self.search, |value| contains_text(&[comment], &value))
            .clause_if("vehicleId", self.vehicle_id, |id| {
                equals(|e: &VehicleEnrollment| e.vehicle_id, id)
            })
            .clause_if("routeId", self.route_id, |id| {
                equals(|e: &VehicleEnrollment| e.route_id, id)
            })
            .clause_if("departureDateTime", self.departure, |range| {
                within(|e: &VehicleEnrollment| e.departure_date_time_utc, range)
            })
            .clause_if("isCancelled", self.is_cancelled, |cancelled| {
                equals(|e: &VehicleEnrollment| e.is_cancelled(), cancelled)
            })
            .aggregate_if("totalTripDuration", self.total_trip_duration, |range| {
                nested_sum_within(legs, leg_time, range)
            })
            .aggregate_if("cost", self.cost, |range| nested_sum_within(legs, leg_cost, range))
    }
}
