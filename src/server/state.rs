//! Shared application state handed to every handler

use crate::core::entity::Resource;
use crate::core::error::{StorageError, TransitResult};
use crate::core::paging::Paginator;
use crate::core::pipeline::ResourcePipeline;
use crate::core::service::DataService;
use crate::entities::{
    Address, City, Company, Country, Driver, Route, RouteAddress, RouteAddressDetails, State,
    Ticket, Vehicle, VehicleEnrollment,
};
use crate::server::resource::ExposedResource;
use crate::storage::InMemoryDataService;
use chrono::{TimeDelta, TimeZone, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// One data service per resource plus the paging limits
#[derive(Clone)]
pub struct AppState {
    pub countries: Arc<dyn DataService<Country>>,
    pub states: Arc<dyn DataService<State>>,
    pub cities: Arc<dyn DataService<City>>,
    pub addresses: Arc<dyn DataService<Address>>,
    pub routes: Arc<dyn DataService<Route>>,
    pub companies: Arc<dyn DataService<Company>>,
    pub vehicles: Arc<dyn DataService<Vehicle>>,
    pub drivers: Arc<dyn DataService<Driver>>,
    pub vehicle_enrollments: Arc<dyn DataService<VehicleEnrollment>>,
    pub tickets: Arc<dyn DataService<Ticket>>,
    pub paginator: Paginator,
}

impl AppState {
    /// State backed by empty in-memory tables
    pub fn in_memory(paginator: Paginator) -> Self {
        Self {
            countries: Arc::new(InMemoryDataService::new()),
            states: Arc::new(InMemoryDataService::new()),
            cities: Arc::new(InMemoryDataService::new()),
            addresses: Arc::new(InMemoryDataService::new()),
            routes: Arc::new(InMemoryDataService::new()),
            companies: Arc::new(InMemoryDataService::new()),
            vehicles: Arc::new(InMemoryDataService::new()),
            drivers: Arc::new(InMemoryDataService::new()),
            vehicle_enrollments: Arc::new(InMemoryDataService::new()),
            tickets: Arc::new(InMemoryDataService::new()),
            paginator,
        }
    }

    /// Listing pipeline for `R` with the configured paging limits
    pub fn pipeline<R: ExposedResource>(&self) -> ResourcePipeline<R> {
        ResourcePipeline::new(self.paginator).with_default_sort(R::default_sort())
    }

    /// Insert a small network: one country with two cities, a route
    /// between them, one company with a bus, a driver and two trips
    pub async fn seed_demo_data(&self) -> TransitResult<()> {
        let country = insert(&self.countries, Country {
            id: 0,
            code: "UA".to_string(),
            name: "Ukraine".to_string(),
        })
        .await?;
        let state = insert(&self.states, State {
            id: 0,
            name: "Lviv Oblast".to_string(),
            country_id: country.id,
        })
        .await?;

        let mut stops = Vec::new();
        for name in ["Lviv", "Stryi"] {
            let city = insert(&self.cities, City {
                id: 0,
                name: name.to_string(),
                state_id: state.id,
            })
            .await?;
            let address = insert(&self.addresses, Address {
                id: 0,
                name: format!("{} Bus Station", name),
                city_id: city.id,
            })
            .await?;
            stops.push(address.id);
        }

        let route = insert(&self.routes, Route {
            id: 0,
            route_type: "bus".to_string(),
            is_active: true,
            route_addresses: stops
                .iter()
                .enumerate()
                .map(|(index, address_id)| RouteAddress {
                    address_id: *address_id,
                    order: index as i32 + 1,
                    time_span_to_next_city: TimeDelta::minutes(90),
                    wait_time_span: TimeDelta::minutes(10),
                    cost_to_next_city: 120.0,
                })
                .collect(),
        })
        .await?;

        let company = insert(&self.companies, Company {
            id: 0,
            name: "Galician Lines".to_string(),
            owner_id: Uuid::new_v4(),
        })
        .await?;
        let vehicle = insert(&self.vehicles, Vehicle {
            id: 0,
            number: "BC1234AA".to_string(),
            vehicle_type: "bus".to_string(),
            capacity: 48,
            has_climate_control: true,
            has_wifi: true,
            has_wc: false,
            has_stewardess: false,
            has_tv: false,
            has_outlet: true,
            has_belts: true,
            company_id: company.id,
        })
        .await?;
        insert(&self.drivers, Driver {
            id: 0,
            first_name: "Taras".to_string(),
            last_name: "Melnyk".to_string(),
            email: "taras.melnyk@example.com".to_string(),
            company_id: company.id,
        })
        .await?;

        for (day, cancellation) in [(1, None), (2, Some("Road works".to_string()))] {
            insert(&self.vehicle_enrollments, VehicleEnrollment {
                id: 0,
                vehicle_id: vehicle.id,
                route_id: route.id,
                departure_date_time_utc: Utc
                    .with_ymd_and_hms(2024, 6, day, 8, 0, 0)
                    .single()
                    .unwrap_or_else(Utc::now),
                cancellation_comment: cancellation,
                route_address_details: route
                    .ordered_stops()
                    .iter()
                    .map(|stop| RouteAddressDetails {
                        address_id: stop.address_id,
                        time_span_to_next_city: stop.time_span_to_next_city,
                        wait_time_span: stop.wait_time_span,
                        cost_to_next_city: stop.cost_to_next_city,
                    })
                    .collect(),
            })
            .await?;
        }

        tracing::info!("Seeded demo data");
        Ok(())
    }
}

async fn insert<T: Resource>(service: &Arc<dyn DataService<T>>, entity: T) -> TransitResult<T> {
    service
        .create(entity)
        .await
        .map_err(|e| StorageError::wrap("seed", e).into())
}
