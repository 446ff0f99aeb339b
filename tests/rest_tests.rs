//! HTTP-level tests for the listing pipeline and CRUD routes
//!
//! Each test builds the full router over in-memory storage and drives it
//! through `axum-test`.

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::{TestRequest, TestServer};
use chrono::{TimeDelta, TimeZone, Utc};
use serde_json::{Value, json};
use transit::core::paging::Paginator;
use transit::entities::{
    City, Country, Route, RouteAddressDetails, State, Ticket, Vehicle, VehicleEnrollment,
};
use transit::server::{AppState, ServerBuilder};
use uuid::Uuid;

// =============================================================================
// Fixtures
// =============================================================================

fn as_role(request: TestRequest, role: &'static str, company: Option<&'static str>) -> TestRequest {
    let request = request.add_header(
        HeaderName::from_static("x-role"),
        HeaderValue::from_static(role),
    );
    match company {
        Some(company) => request.add_header(
            HeaderName::from_static("x-company-id"),
            HeaderValue::from_static(company),
        ),
        None => request,
    }
}

fn as_admin(request: TestRequest) -> TestRequest {
    as_role(request, "administrator", None)
}

fn make_server(state: AppState) -> TestServer {
    let app = ServerBuilder::new()
        .with_state(state)
        .register_transit_resources()
        .build()
        .unwrap();
    TestServer::try_new(app).unwrap()
}

fn vehicle(number: &str, capacity: i32, company_id: i64) -> Vehicle {
    Vehicle {
        id: 0,
        number: number.to_string(),
        vehicle_type: "bus".to_string(),
        capacity,
        has_climate_control: capacity > 30,
        has_wifi: false,
        has_wc: false,
        has_stewardess: false,
        has_tv: false,
        has_outlet: false,
        has_belts: true,
        company_id,
    }
}

fn leg(minutes: i64, cost: f64) -> RouteAddressDetails {
    RouteAddressDetails {
        address_id: 1,
        time_span_to_next_city: TimeDelta::minutes(minutes),
        wait_time_span: TimeDelta::zero(),
        cost_to_next_city: cost,
    }
}

fn enrollment(vehicle_id: i64, day: u32, legs: Vec<RouteAddressDetails>) -> VehicleEnrollment {
    VehicleEnrollment {
        id: 0,
        vehicle_id,
        route_id: 1,
        departure_date_time_utc: Utc.with_ymd_and_hms(2024, 5, day, 9, 0, 0).unwrap(),
        cancellation_comment: None,
        route_address_details: legs,
    }
}

/// Twelve cities spread over two states
async fn city_server() -> TestServer {
    let state = AppState::in_memory(Paginator::default());
    let country = state
        .countries
        .create(Country {
            id: 0,
            code: "PL".to_string(),
            name: "Poland".to_string(),
        })
        .await
        .unwrap();
    for name in ["Mazovia", "Lesser Poland"] {
        state
            .states
            .create(State {
                id: 0,
                name: name.to_string(),
                country_id: country.id,
            })
            .await
            .unwrap();
    }
    for (i, name) in [
        "Warsaw", "Krakow", "Radom", "Tarnow", "Plock", "Nowy Sacz", "Siedlce", "Oswiecim",
        "Ostroleka", "Zakopane", "Pruszkow", "Wieliczka",
    ]
    .iter()
    .enumerate()
    {
        state
            .cities
            .create(City {
                id: 0,
                name: name.to_string(),
                state_id: if i % 2 == 0 { 1 } else { 2 },
            })
            .await
            .unwrap();
    }
    make_server(state)
}

/// Two companies: company 1 owns vehicles 1 and 2, company 2 owns vehicle 3
async fn fleet_server() -> TestServer {
    let state = AppState::in_memory(Paginator::default());
    state.vehicles.create(vehicle("AA100", 50, 1)).await.unwrap();
    state.vehicles.create(vehicle("AA200", 20, 1)).await.unwrap();
    state.vehicles.create(vehicle("BB100", 35, 2)).await.unwrap();

    // trip durations: 45 minutes, 60 minutes, no legs
    state
        .vehicle_enrollments
        .create(enrollment(1, 1, vec![leg(20, 100.0), leg(25, 50.0)]))
        .await
        .unwrap();
    state
        .vehicle_enrollments
        .create(enrollment(2, 2, vec![leg(60, 300.0)]))
        .await
        .unwrap();
    state
        .vehicle_enrollments
        .create(enrollment(3, 3, Vec::new()))
        .await
        .unwrap();
    make_server(state)
}

/// Enrollments in insertion order, one leg each
async fn trips_server(trips: &[(u32, u32, f64)]) -> TestServer {
    let state = AppState::in_memory(Paginator::default());
    for &(day, hour, cost) in trips {
        let mut trip = enrollment(1, day, vec![leg(30, cost)]);
        trip.departure_date_time_utc = Utc.with_ymd_and_hms(2024, 5, day, hour, 0, 0).unwrap();
        state.vehicle_enrollments.create(trip).await.unwrap();
    }
    make_server(state)
}

/// Route 1 sells one ticket, route 2 sells three; one returned ticket is
/// not a sale
async fn sales_server() -> TestServer {
    let state = AppState::in_memory(Paginator::default());
    for route_type in ["bus", "train"] {
        state
            .routes
            .create(Route {
                id: 0,
                route_type: route_type.to_string(),
                is_active: true,
                route_addresses: Vec::new(),
            })
            .await
            .unwrap();
    }
    for route_id in [1, 2] {
        let mut trip = enrollment(1, 1, Vec::new());
        trip.route_id = route_id;
        state.vehicle_enrollments.create(trip).await.unwrap();
    }

    let buyer = |n: u128| Uuid::from_u128(n);
    for (user, trip, returned) in [(1, 1, false), (1, 1, true), (1, 2, false), (2, 2, false), (3, 2, false)] {
        state
            .tickets
            .create(Ticket {
                id: 0,
                user_id: buyer(user),
                vehicle_enrollment_id: trip,
                purchase_date_time_utc: Utc.with_ymd_and_hms(2024, 4, 20, 12, 0, 0).unwrap(),
                is_returned: returned,
                is_missed: false,
            })
            .await
            .unwrap();
    }
    make_server(state)
}

fn ids(body: &Value) -> Vec<i64> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_i64().unwrap())
        .collect()
}

fn pagination(response: &axum_test::TestResponse) -> Value {
    let header = response
        .headers()
        .get("x-pagination")
        .expect("missing X-Pagination header");
    serde_json::from_str(header.to_str().unwrap()).unwrap()
}

// =============================================================================
// Listing
// =============================================================================

#[tokio::test]
async fn test_health() {
    let server = make_server(AppState::in_memory(Paginator::default()));
    let response = server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "ok");
}

#[tokio::test]
async fn test_list_defaults() {
    let server = city_server().await;
    let response = as_admin(server.get("/cities")).await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(ids(&body), (1..=10).collect::<Vec<_>>());
    assert_eq!(
        body[0].as_object().unwrap().keys().collect::<Vec<_>>(),
        vec!["id", "name", "stateId"]
    );

    let metadata = pagination(&response);
    assert_eq!(metadata["totalCount"], 12);
    assert_eq!(metadata["pageSize"], 10);
    assert_eq!(metadata["currentPage"], 1);
    assert_eq!(metadata["totalPages"], 2);
    assert_eq!(metadata["hasNext"], true);
    assert_eq!(metadata["hasPrevious"], false);
}

#[tokio::test]
async fn test_list_fields_sort_and_page() {
    let server = city_server().await;
    let response = as_admin(server.get("/cities"))
        .add_query_param("fields", "name")
        .add_query_param("sort", "-name")
        .add_query_param("pageNumber", 2)
        .add_query_param("pageSize", 3)
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    // descending: Zakopane Wieliczka Warsaw | Tarnow Siedlce Radom
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Tarnow", "Siedlce", "Radom"]);
    assert_eq!(
        body[0].as_object().unwrap().keys().collect::<Vec<_>>(),
        vec!["id", "name"]
    );

    let metadata = pagination(&response);
    assert_eq!(metadata["currentPage"], 2);
    assert_eq!(metadata["totalPages"], 4);
}

#[tokio::test]
async fn test_list_filters_compose() {
    let server = city_server().await;
    let response = as_admin(server.get("/cities"))
        .add_query_param("stateId", 2)
        .add_query_param("search", "ow")
        .await;

    response.assert_status_ok();
    // state 2: Krakow Tarnow Nowy Sacz Oswiecim Zakopane Wieliczka
    assert_eq!(ids(&response.json::<Value>()), vec![2, 4, 6]);
    assert_eq!(pagination(&response)["totalCount"], 3);
}

#[tokio::test]
async fn test_page_size_is_clamped() {
    let server = city_server().await;
    let response = as_admin(server.get("/cities"))
        .add_query_param("pageSize", 500)
        .add_query_param("pageNumber", 0)
        .await;

    response.assert_status_ok();
    let metadata = pagination(&response);
    assert_eq!(metadata["pageSize"], 50);
    assert_eq!(metadata["currentPage"], 1);
    assert_eq!(ids(&response.json::<Value>()).len(), 12);
}

#[tokio::test]
async fn test_page_past_the_end_is_empty() {
    let server = city_server().await;
    let response = as_admin(server.get("/cities"))
        .add_query_param("pageNumber", 9)
        .await;

    response.assert_status_ok();
    assert!(response.json::<Value>().as_array().unwrap().is_empty());
    assert_eq!(pagination(&response)["hasNext"], false);
}

#[tokio::test]
async fn test_invalid_sort_is_rejected() {
    let server = city_server().await;
    let response = as_admin(server.get("/cities"))
        .add_query_param("sort", "population")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "InvalidSortExpression");
    assert_eq!(body["details"]["sort"], "population");
}

#[tokio::test]
async fn test_sort_outside_selected_fields_is_rejected() {
    let server = city_server().await;
    let response = as_admin(server.get("/cities"))
        .add_query_param("fields", "name")
        .add_query_param("sort", "stateId")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_fields_are_ignored() {
    let server = city_server().await;
    let response = as_admin(server.get("/cities"))
        .add_query_param("fields", "NAME,population")
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(
        body[0].as_object().unwrap().keys().collect::<Vec<_>>(),
        vec!["id", "name"]
    );
}

#[tokio::test]
async fn test_aggregate_filter_on_trip_duration() {
    let server = fleet_server().await;
    let response = as_admin(server.get("/vehicleEnrollments"))
        .add_query_param("toTotalTripDuration", "00:50:00")
        .await;

    response.assert_status_ok();
    // 45 minutes and the trip without legs (zero) pass, 60 minutes does not
    assert_eq!(ids(&response.json::<Value>()), vec![1, 3]);
}

#[tokio::test]
async fn test_aggregate_filter_on_cost_with_sort() {
    let server = fleet_server().await;
    let response = as_admin(server.get("/vehicleEnrollments"))
        .add_query_param("fromCost", 100)
        .add_query_param("sort", "-cost")
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(ids(&body), vec![2, 1]);
    assert_eq!(body[0]["cost"], 300.0);
    assert_eq!(body[1]["duration"], "00:45:00");
}

#[tokio::test]
async fn test_default_order_holds_when_its_field_is_not_selected() {
    let server = trips_server(&[(20, 9, 10.0), (5, 9, 20.0), (10, 9, 30.0)]).await;
    let response = as_admin(server.get("/vehicleEnrollments"))
        .add_query_param("fields", "id,cost")
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(ids(&body), vec![2, 3, 1]);
    assert_eq!(
        body[0].as_object().unwrap().keys().collect::<Vec<_>>(),
        vec!["id", "cost"]
    );
}

#[tokio::test]
async fn test_sort_by_departure_descending_then_cost() {
    let server = trips_server(&[(1, 9, 300.0), (1, 9, 100.0), (3, 7, 50.0)]).await;
    let response = as_admin(server.get("/vehicleEnrollments"))
        .add_query_param("sort", "-departureDateTimeUtc,cost")
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(ids(&body), vec![3, 2, 1]);
    assert_eq!(body[1]["cost"], 100.0);
    assert_eq!(body[2]["cost"], 300.0);
}

#[tokio::test]
async fn test_overflowing_page_size_is_clamped() {
    let server = city_server().await;
    let response = as_admin(server.get("/cities"))
        .add_query_param("pageSize", "99999999999999999999")
        .await;

    response.assert_status_ok();
    assert_eq!(pagination(&response)["pageSize"], 50);
    assert_eq!(ids(&response.json::<Value>()).len(), 12);
}

// =============================================================================
// Authorization and scoping
// =============================================================================

#[tokio::test]
async fn test_missing_role_is_unauthorized() {
    let server = city_server().await;
    let response = server.get("/cities").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_insufficient_role_is_forbidden() {
    let server = city_server().await;
    let response = as_role(server.get("/cities"), "driver", Some("1")).await;
    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_vehicles_are_scoped_to_company() {
    let server = fleet_server().await;
    let response = as_role(server.get("/vehicles"), "companyOwner", Some("1"))
        .add_query_param("sort", "capacity")
        .await;

    response.assert_status_ok();
    assert_eq!(ids(&response.json::<Value>()), vec![2, 1]);
    assert_eq!(pagination(&response)["totalCount"], 2);
}

#[tokio::test]
async fn test_driver_lists_company_enrollments() {
    let server = fleet_server().await;
    let response = as_role(server.get("/vehicleEnrollments"), "driver", Some("2")).await;

    response.assert_status_ok();
    assert_eq!(ids(&response.json::<Value>()), vec![3]);
}

#[tokio::test]
async fn test_other_company_vehicle_is_not_found() {
    let server = fleet_server().await;
    let response = as_role(server.get("/vehicles/3"), "companyOwner", Some("1")).await;
    response.assert_status(StatusCode::NOT_FOUND);
}

// =============================================================================
// Single item, create, delete
// =============================================================================

#[tokio::test]
async fn test_get_one_with_fields() {
    let server = city_server().await;
    let response = as_admin(server.get("/cities/2"))
        .add_query_param("fields", "name")
        .await;

    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>(),
        json!({ "id": 2, "name": "Krakow" })
    );
}

#[tokio::test]
async fn test_get_unknown_id_is_not_found() {
    let server = city_server().await;
    let response = as_admin(server.get("/cities/999")).await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["code"], "ENTITY_NOT_FOUND");
}

#[tokio::test]
async fn test_get_malformed_id_is_bad_request() {
    let server = city_server().await;
    let response = as_admin(server.get("/cities/abc")).await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_returns_location_and_full_shape() {
    let server = city_server().await;
    let response = as_admin(server.post("/countries"))
        .json(&json!({ "code": "CZ", "name": "Czechia" }))
        .await;

    response.assert_status(StatusCode::CREATED);
    assert_eq!(
        response.headers().get("location").unwrap().to_str().unwrap(),
        "/countries/2"
    );
    assert_eq!(
        response.json::<Value>(),
        json!({ "id": 2, "code": "CZ", "name": "Czechia" })
    );

    let fetched = as_admin(server.get("/countries/2")).await;
    fetched.assert_status_ok();
}

#[tokio::test]
async fn test_create_requires_administrator_for_reference_data() {
    let server = city_server().await;
    let response = as_role(server.post("/countries"), "companyOwner", Some("1"))
        .json(&json!({ "code": "CZ", "name": "Czechia" }))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_create_validates_payload() {
    let server = city_server().await;
    let response = as_admin(server.post("/countries"))
        .json(&json!({ "code": "", "name": "Nowhere" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["details"]["fields"][0]["field"], "code");
}

#[tokio::test]
async fn test_create_rejects_malformed_json() {
    let server = city_server().await;
    let response = as_admin(server.post("/countries"))
        .json(&json!({ "code": 12 }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_company_owner_cannot_create_for_other_company() {
    let server = fleet_server().await;
    let payload = json!({ "number": "CC300", "type": "van", "capacity": 8, "companyId": 2 });

    let response = as_role(server.post("/vehicles"), "companyOwner", Some("1"))
        .json(&payload)
        .await;
    response.assert_status(StatusCode::FORBIDDEN);

    let response = as_role(server.post("/vehicles"), "companyOwner", Some("2"))
        .json(&payload)
        .await;
    response.assert_status(StatusCode::CREATED);
}

#[tokio::test]
async fn test_delete() {
    let server = city_server().await;

    let response = as_admin(server.delete("/cities/3")).await;
    response.assert_status(StatusCode::NO_CONTENT);

    let response = as_admin(server.delete("/cities/3")).await;
    response.assert_status(StatusCode::NOT_FOUND);

    let listing = as_admin(server.get("/cities")).await;
    assert_eq!(pagination(&listing)["totalCount"], 11);
}

#[tokio::test]
async fn test_create_rejects_oversized_leg_spans() {
    let server = fleet_server().await;
    let response = as_admin(server.post("/vehicleEnrollments"))
        .json(&json!({
            "vehicleId": 1,
            "routeId": 1,
            "departureDateTimeUtc": "2024-05-04T09:00:00Z",
            "routeAddressDetails": [{
                "addressId": 1,
                "timeSpanToNextCity": "100000000000.00:00:00",
                "waitTimeSpan": "100000000000.00:00:00",
                "costToNextCity": 1.0
            }]
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["details"]["fields"][0]["field"].as_str().unwrap().contains("[0]."));

    let listing = as_admin(server.get("/vehicleEnrollments")).await;
    listing.assert_status_ok();
    assert_eq!(pagination(&listing)["totalCount"], 3);
}

// =============================================================================
// Update
// =============================================================================

#[tokio::test]
async fn test_update_replaces_and_keeps_id() {
    let server = city_server().await;
    let response = as_admin(server.put("/cities/2"))
        .json(&json!({ "id": 77, "name": "Cracow", "stateId": 2 }))
        .await;

    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>(),
        json!({ "id": 2, "name": "Cracow", "stateId": 2 })
    );

    let fetched = as_admin(server.get("/cities/2")).await;
    assert_eq!(fetched.json::<Value>()["name"], "Cracow");
    assert_eq!(pagination(&as_admin(server.get("/cities")).await)["totalCount"], 12);
}

#[tokio::test]
async fn test_update_unknown_id_is_not_found() {
    let server = city_server().await;
    let response = as_admin(server.put("/cities/999"))
        .json(&json!({ "name": "Atlantis", "stateId": 1 }))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_validates_and_authorizes() {
    let server = city_server().await;

    let response = as_admin(server.put("/cities/1"))
        .json(&json!({ "name": "", "stateId": 1 }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = as_role(server.put("/cities/1"), "companyOwner", Some("1"))
        .json(&json!({ "name": "Warszawa", "stateId": 1 }))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);

    let fetched = as_admin(server.get("/cities/1")).await;
    assert_eq!(fetched.json::<Value>()["name"], "Warsaw");
}

#[tokio::test]
async fn test_company_owner_updates_only_own_vehicles() {
    let server = fleet_server().await;

    let response = as_role(server.put("/vehicles/1"), "companyOwner", Some("1"))
        .json(&json!({ "number": "AA101", "type": "bus", "capacity": 52, "companyId": 1 }))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["capacity"], 52);

    // moving a vehicle to another company
    let response = as_role(server.put("/vehicles/2"), "companyOwner", Some("1"))
        .json(&json!({ "number": "AA200", "type": "bus", "capacity": 20, "companyId": 2 }))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);

    let response = as_role(server.put("/vehicles/3"), "companyOwner", Some("1"))
        .json(&json!({ "number": "BB100", "type": "bus", "capacity": 35, "companyId": 1 }))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

// =============================================================================
// Statistics
// =============================================================================

#[tokio::test]
async fn test_popular_routes_ranked_by_sales() {
    let server = sales_server().await;
    let response = as_admin(server.get("/statistics/routes")).await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(ids(&body), vec![2, 1]);
    assert_eq!(body[0]["ticketCount"], 3);
    assert_eq!(body[1]["ticketCount"], 1);
    assert_eq!(body[0]["type"], "train");
    assert_eq!(pagination(&response)["totalCount"], 2);
}

#[tokio::test]
async fn test_statistics_use_the_listing_pipeline() {
    let server = sales_server().await;
    let response = as_admin(server.get("/statistics/users"))
        .add_query_param("fields", "ticketCount")
        .add_query_param("sort", "ticketCount")
        .add_query_param("pageSize", 2)
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    // rank 1 is the buyer with two sales; the other two bought one each
    assert_eq!(ids(&body), vec![2, 3]);
    assert_eq!(
        body[0].as_object().unwrap().keys().collect::<Vec<_>>(),
        vec!["id", "ticketCount"]
    );
    assert_eq!(pagination(&response)["totalPages"], 2);

    let response = as_admin(server.get("/statistics/users"))
        .add_query_param("fields", "ticketCount")
        .add_query_param("sort", "userId")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_statistics_purchase_window() {
    let server = sales_server().await;
    let response = as_admin(server.get("/statistics/routes"))
        .add_query_param("fromPurchaseDateTime", "2024-04-21")
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body[0]["ticketCount"], 0);
    assert_eq!(body[1]["ticketCount"], 0);
}

#[tokio::test]
async fn test_statistics_require_administrator() {
    let server = sales_server().await;
    let response = as_role(server.get("/statistics/companies"), "companyOwner", Some("1")).await;
    response.assert_status(StatusCode::FORBIDDEN);
}
