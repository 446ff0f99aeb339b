//! Ranking endpoints over ticket sales
//!
//! ```text
//! GET /statistics/routes?fromPurchaseDateTime=2024-05-01&pageSize=5
//! GET /statistics/companies
//! GET /statistics/stations?fields=id,ticketCount
//! GET /statistics/users?sort=-missedCount
//! ```
//!
//! A sale is a ticket that was not returned. The purchase window parameters
//! narrow which sales are counted. Rankings run through the same listing
//! pipeline as every resource, ordered by ticket count unless `sort` says
//! otherwise.

use crate::core::auth::AuthPolicy;
use crate::core::entity::Resource;
use crate::core::error::{StorageError, TransitResult};
use crate::core::filter::{FilterSet, RangeBound, equals, within};
use crate::core::pipeline::ResourcePipeline;
use crate::core::query::{FilterCriteria, QueryParams, RawQuery};
use crate::core::sorting::{SortKey, SortSpec};
use crate::entities::statistics::{CompanyStatistic, RouteStatistic, StationStatistic, UserStatistic};
use crate::entities::{Address, Company, Route, Ticket, Vehicle, VehicleEnrollment};
use crate::server::handlers::paged_response;
use crate::server::state::AppState;
use axum::{
    Router,
    extract::{Query, State},
    http::HeaderMap,
    response::Response,
    routing::get,
};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};
use uuid::Uuid;

/// Routes for every ranking
pub fn statistics_routes() -> Router<AppState> {
    Router::new()
        .route("/statistics/routes", get(popular_routes))
        .route("/statistics/companies", get(popular_companies))
        .route("/statistics/stations", get(popular_stations))
        .route("/statistics/users", get(engaged_users))
}

/// Purchase window applied to tickets before counting
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SalesWindow {
    pub purchase: Option<RangeBound<DateTime<Utc>>>,
}

impl FilterCriteria for SalesWindow {
    type Target = Ticket;

    fn from_query(query: &RawQuery) -> Self {
        Self {
            purchase: RangeBound::from_options(
                query.datetime("fromPurchaseDateTime"),
                query.datetime("toPurchaseDateTime"),
            ),
        }
    }

    fn into_filter(self) -> FilterSet<Ticket> {
        FilterSet::new()
            .clause("isReturned", equals(|t: &Ticket| t.is_returned, false))
            .clause_if("purchaseDateTime", self.purchase, |range| {
                within(|t: &Ticket| t.purchase_date_time_utc, range)
            })
    }
}

/// Everything the rankings are computed from
#[derive(Debug)]
pub struct Sales {
    tickets: Vec<Ticket>,
    enrollments: HashMap<i64, VehicleEnrollment>,
    routes: Vec<Route>,
    vehicles: Vec<Vehicle>,
    companies: Vec<Company>,
    addresses: Vec<Address>,
}

impl Sales {
    /// Read the counted tickets and the rows they point at
    pub async fn load(state: &AppState, window: &FilterSet<Ticket>) -> TransitResult<Self> {
        let wrap = |e| StorageError::wrap("statistics", e);

        let tickets = state
            .tickets
            .list_matching(&|ticket: &Ticket| window.matches(ticket))
            .await
            .map_err(wrap)?;
        let enrollments = state.vehicle_enrollments.list().await.map_err(wrap)?;

        Ok(Self {
            tickets,
            enrollments: enrollments.into_iter().map(|e| (e.id, e)).collect(),
            routes: state.routes.list().await.map_err(wrap)?,
            vehicles: state.vehicles.list().await.map_err(wrap)?,
            companies: state.companies.list().await.map_err(wrap)?,
            addresses: state.addresses.list().await.map_err(wrap)?,
        })
    }

    /// Enrollment of every counted ticket; tickets for unknown trips are skipped
    fn sold_trips(&self) -> impl Iterator<Item = &VehicleEnrollment> {
        self.tickets
            .iter()
            .filter_map(|ticket| self.enrollments.get(&ticket.vehicle_enrollment_id))
    }

    pub fn routes(&self) -> Vec<RouteStatistic> {
        let sold = tally(self.sold_trips().map(|trip| trip.route_id));

        self.routes
            .iter()
            .map(|route| RouteStatistic {
                id: route.id,
                route_type: route.route_type.clone(),
                enrollment_count: count(
                    self.enrollments
                        .values()
                        .filter(|e| e.route_id == route.id && !e.is_cancelled())
                        .count(),
                ),
                ticket_count: sold.get(&route.id).copied().unwrap_or(0),
            })
            .collect()
    }

    pub fn companies(&self) -> Vec<CompanyStatistic> {
        let owner: HashMap<i64, i64> = self.vehicles.iter().map(|v| (v.id, v.company_id)).collect();
        let sold = tally(self.sold_trips().filter_map(|trip| owner.get(&trip.vehicle_id).copied()));
        let fleet = tally(self.vehicles.iter().map(|v| v.company_id));

        self.companies
            .iter()
            .map(|company| CompanyStatistic {
                id: company.id,
                name: company.name.clone(),
                vehicle_count: fleet.get(&company.id).copied().unwrap_or(0),
                ticket_count: sold.get(&company.id).copied().unwrap_or(0),
            })
            .collect()
    }

    /// A ticket counts once for every distinct stop on its trip's route
    pub fn stations(&self) -> Vec<StationStatistic> {
        let stops: HashMap<i64, HashSet<i64>> = self
            .routes
            .iter()
            .map(|route| (route.id, route.route_addresses.iter().map(|s| s.address_id).collect()))
            .collect();
        let sold = tally(
            self.sold_trips()
                .filter_map(|trip| stops.get(&trip.route_id))
                .flat_map(|addresses| addresses.iter().copied()),
        );

        self.addresses
            .iter()
            .map(|address| StationStatistic {
                id: address.id,
                name: address.name.clone(),
                city_id: address.city_id,
                ticket_count: sold.get(&address.id).copied().unwrap_or(0),
            })
            .collect()
    }

    /// Buyers ranked by ticket count, ties in user id order
    pub fn users(&self) -> Vec<UserStatistic> {
        let mut buyers: BTreeMap<Uuid, (i64, i64)> = BTreeMap::new();
        for ticket in &self.tickets {
            let (bought, missed) = buyers.entry(ticket.user_id).or_default();
            *bought += 1;
            if ticket.is_missed {
                *missed += 1;
            }
        }

        let mut ranked: Vec<(Uuid, (i64, i64))> = buyers.into_iter().collect();
        ranked.sort_by(|a, b| b.1.0.cmp(&a.1.0));

        ranked
            .into_iter()
            .enumerate()
            .map(|(rank, (user_id, (ticket_count, missed_count)))| UserStatistic {
                id: count(rank + 1),
                user_id,
                ticket_count,
                missed_count,
            })
            .collect()
    }
}

fn tally(keys: impl Iterator<Item = i64>) -> HashMap<i64, i64> {
    let mut counts = HashMap::new();
    for key in keys {
        *counts.entry(key).or_insert(0) += 1;
    }
    counts
}

fn count(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// Most tickets first, then by identifier
fn by_ticket_count() -> SortSpec {
    SortSpec::new(vec![SortKey::descending("ticketCount"), SortKey::ascending("id")])
        .unwrap_or_else(|| SortSpec::by("id"))
}

async fn ranking<S: Resource>(
    state: &AppState,
    headers: &HeaderMap,
    pairs: Vec<(String, String)>,
    rank: fn(&Sales) -> Vec<S>,
) -> TransitResult<Response> {
    AuthPolicy::AdministratorAccess.enforce(headers)?;
    let query = RawQuery::from_pairs(pairs);
    let params = QueryParams::from_raw(&query);

    let pipeline = ResourcePipeline::<S>::new(state.paginator).with_default_sort(by_ticket_count());
    let plan = pipeline.plan(&params)?;

    let window = SalesWindow::from_query(&query);
    tracing::debug!(ranking = S::resource_name(), ?window, "computing statistics");
    let sales = Sales::load(state, &window.into_filter()).await?;

    paged_response(pipeline.run(&plan, rank(&sales), &FilterSet::new()))
}

/// GET /statistics/routes
pub async fn popular_routes(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(pairs): Query<Vec<(String, String)>>,
) -> TransitResult<Response> {
    ranking(&state, &headers, pairs, Sales::routes).await
}

/// GET /statistics/companies
pub async fn popular_companies(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(pairs): Query<Vec<(String, String)>>,
) -> TransitResult<Response> {
    ranking(&state, &headers, pairs, Sales::companies).await
}

/// GET /statistics/stations
pub async fn popular_stations(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(pairs): Query<Vec<(String, String)>>,
) -> TransitResult<Response> {
    ranking(&state, &headers, pairs, Sales::stations).await
}

/// GET /statistics/users
pub async fn engaged_users(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(pairs): Query<Vec<(String, String)>>,
) -> TransitResult<Response> {
    ranking(&state, &headers, pairs, Sales::users).await
}
