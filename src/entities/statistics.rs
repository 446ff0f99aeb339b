//! Ranking rows computed from ticket sales
//!
//! Rows are derived on every request and never stored. Each one carries the
//! identifier of what it ranks (route, company, station) so the listing
//! pipeline can shape, sort and page it like any stored resource. Users have
//! no integer identifier, so their rows are numbered by rank instead.

use crate::impl_resource;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteStatistic {
    /// Route identifier
    pub id: i64,

    #[serde(rename = "type")]
    pub route_type: String,

    pub enrollment_count: i64,

    pub ticket_count: i64,
}

impl_resource!(
    RouteStatistic,
    "popularRoute",
    "popularRoutes",
    "id,type,enrollmentCount,ticketCount",
    fields {
        "id" => id,
        "type" => route_type,
        "enrollmentCount" => enrollment_count,
        "ticketCount" => ticket_count,
    }
);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyStatistic {
    /// Company identifier
    pub id: i64,

    pub name: String,

    pub vehicle_count: i64,

    pub ticket_count: i64,
}

impl_resource!(
    CompanyStatistic,
    "popularCompany",
    "popularCompanies",
    "id,name,vehicleCount,ticketCount",
    fields {
        "id" => id,
        "name" => name,
        "vehicleCount" => vehicle_count,
        "ticketCount" => ticket_count,
    }
);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationStatistic {
    /// Address identifier
    pub id: i64,

    pub name: String,

    pub city_id: i64,

    pub ticket_count: i64,
}

impl_resource!(
    StationStatistic,
    "popularStation",
    "popularStations",
    "id,name,cityId,ticketCount",
    fields {
        "id" => id,
        "name" => name,
        "cityId" => city_id,
        "ticketCount" => ticket_count,
    }
);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatistic {
    /// Rank by ticket count, starting at 1
    pub id: i64,

    pub user_id: Uuid,

    pub ticket_count: i64,

    pub missed_count: i64,
}

impl_resource!(
    UserStatistic,
    "engagedUser",
    "engagedUsers",
    "id,userId,ticketCount",
    fields {
        "id" => id,
        "userId" => user_id,
        "ticketCount" => ticket_count,
        "missedCount" => missed_count,
    }
);
