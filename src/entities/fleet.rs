//! Companies, their vehicles and drivers

use crate::core::filter::{FilterSet, RangeBound, contains_text, equals, within};
use crate::core::query::{FilterCriteria, RawQuery};
use crate::impl_resource;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    #[serde(default)]
    pub id: i64,

    #[validate(length(min = 1, max = 64))]
    pub name: String,

    /// User who owns the company
    pub owner_id: Uuid,
}

impl_resource!(
    Company,
    "company",
    "companies",
    "id,name,ownerId",
    fields {
        "id" => id,
        "name" => name,
        "ownerId" => owner_id,
    }
);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    #[serde(default)]
    pub id: i64,

    /// Registration plate or fleet number
    #[validate(length(min = 1, max = 16))]
    pub number: String,

    #[serde(rename = "type")]
    #[validate(length(min = 1, max = 32))]
    pub vehicle_type: String,

    #[validate(range(min = 1))]
    pub capacity: i32,

    #[serde(default)]
    pub has_climate_control: bool,
    #[serde(default, rename = "hasWiFi")]
    pub has_wifi: bool,
    #[serde(default, rename = "hasWC")]
    pub has_wc: bool,
    #[serde(default)]
    pub has_stewardess: bool,
    #[serde(default, rename = "hasTV")]
    pub has_tv: bool,
    #[serde(default)]
    pub has_outlet: bool,
    #[serde(default)]
    pub has_belts: bool,

    pub company_id: i64,
}

impl_resource!(
    Vehicle,
    "vehicle",
    "vehicles",
    "id,number,type,capacity,companyId",
    fields {
        "id" => id,
        "number" => number,
        "type" => vehicle_type,
        "capacity" => capacity,
        "hasClimateControl" => has_climate_control,
        "hasWiFi" => has_wifi,
        "hasWC" => has_wc,
        "hasStewardess" => has_stewardess,
        "hasTV" => has_tv,
        "hasOutlet" => has_outlet,
        "hasBelts" => has_belts,
        "companyId" => company_id,
    }
);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    #[serde(default)]
    pub id: i64,

    #[validate(length(min = 1, max = 32))]
    pub first_name: String,

    #[validate(length(min = 1, max = 32))]
    pub last_name: String,

    #[validate(email)]
    pub email: String,

    pub company_id: i64,
}

impl Driver {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl_resource!(
    Driver,
    "driver",
    "drivers",
    "id,firstName,lastName,email,companyId",
    fields {
        "id" => id,
        "firstName" => first_name,
        "lastName" => last_name,
        "email" => email,
        "companyId" => company_id,
    }
    computed {
        "fullName" => full_name,
    }
);

// =============================================================================
// Filter criteria
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompanyCriteria {
    pub name: Option<String>,
    pub owner_id: Option<Uuid>,
    pub search: Option<String>,
}

impl FilterCriteria for CompanyCriteria {
    type Target = Company;

    fn from_query(query: &RawQuery) -> Self {
        Self {
            name: query.str("name").map(str::to_string),
            owner_id: query.uuid("ownerId"),
            search: query.str("search").map(str::to_string),
        }
    }

    fn into_filter(self) -> FilterSet<Company> {
        fn name(c: &Company) -> Option<&str> {
            Some(&c.name)
        }

        FilterSet::new()
            .clause_if("name", self.name, |value| contains_text(&[name], &value))
            .clause_if("ownerId", self.owner_id, |owner| {
                equals(|c: &Company| c.owner_id, owner)
            })
            .clause_if("search", self.search, |value| contains_text(&[name], &value))
    }
}

/// Equipment flags a vehicle listing can be narrowed by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EquipmentFlags {
    pub has_climate_control: Option<bool>,
    pub has_wifi: Option<bool>,
    pub has_wc: Option<bool>,
    pub has_stewardess: Option<bool>,
    pub has_tv: Option<bool>,
    pub has_outlet: Option<bool>,
    pub has_belts: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VehicleCriteria {
    pub number: Option<String>,
    pub vehicle_type: Option<String>,
    pub company_id: Option<i64>,
    pub capacity: Option<RangeBound<i32>>,
    pub equipment: EquipmentFlags,
    pub search: Option<String>,
}

fn capacity_param(query: &RawQuery, name: &str) -> Option<i32> {
    query.i64(name).map(|v| v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32)
}

impl FilterCriteria for VehicleCriteria {
    type Target = Vehicle;

    fn from_query(query: &RawQuery) -> Self {
        Self {
            number: query.str("number").map(str::to_string),
            vehicle_type: query.str("type").map(str::to_string),
            company_id: query.i64("companyId"),
            capacity: RangeBound::from_options(
                capacity_param(query, "fromCapacity"),
                capacity_param(query, "toCapacity"),
            ),
            equipment: EquipmentFlags {
                has_climate_control: query.bool("hasClimateControl"),
                has_wifi: query.bool("hasWiFi"),
                has_wc: query.bool("hasWC"),
                has_stewardess: query.bool("hasStewardess"),
                has_tv: query.bool("hasTV"),
                has_outlet: query.bool("hasOutlet"),
                has_belts: query.bool("hasBelts"),
            },
            search: query.str("search").map(str::to_string),
        }
    }

    fn into_filter(self) -> FilterSet<Vehicle> {
        fn number(v: &Vehicle) -> Option<&str> {
            Some(&v.number)
        }
        fn vehicle_type(v: &Vehicle) -> Option<&str> {
            Some(&v.vehicle_type)
        }

        let flags = self.equipment;
        FilterSet::new()
            .clause_if("number", self.number, |value| contains_text(&[number], &value))
            .clause_if("type", self.vehicle_type, |value| {
                equals(|v: &Vehicle| v.vehicle_type.to_lowercase(), value.to_lowercase())
            })
            .clause_if("companyId", self.company_id, |id| {
                equals(|v: &Vehicle| v.company_id, id)
            })
            .clause_if("capacity", self.capacity, |range| {
                within(|v: &Vehicle| v.capacity, range)
            })
            .clause_if("hasClimateControl", flags.has_climate_control, |flag| {
                equals(|v: &Vehicle| v.has_climate_control, flag)
            })
            .clause_if("hasWiFi", flags.has_wifi, |flag| {
                equals(|v: &Vehicle| v.has_wifi, flag)
            })
            .clause_if("hasWC", flags.has_wc, |flag| equals(|v: &Vehicle| v.has_wc, flag))
            .clause_if("hasStewardess", flags.has_stewardess, |flag| {
                equals(|v: &Vehicle| v.has_stewardess, flag)
            })
            .clause_if("hasTV", flags.has_tv, |flag| equals(|v: &Vehicle| v.has_tv, flag))
            .clause_if("hasOutlet", flags.has_outlet, |flag| {
                equals(|v: &Vehicle| v.has_outlet, flag)
            })
            .clause_if("hasBelts", flags.has_belts, |flag| {
                equals(|v: &Vehicle| v.has_belts, flag)
            })
            .clause_if("search", self.search, |value| {
                contains_text(&[number, vehicle_type], &value)
            })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DriverCriteria {
    pub company_id: Option<i64>,
    pub search: Option<String>,
}

impl FilterCriteria for DriverCriteria {
    type Target = Driver;

    fn from_query(query: &RawQuery) -> Self {
        Self {
            company_id: query.i64("companyId"),
            search: query.str("search").map(str::to_string),
        }
    }

    fn into_filter(self) -> FilterSet<Driver> {
        fn first_name(d: &Driver) -> Option<&str> {
            Some(&d.first_name)
        }
        fn last_name(d: &Driver) -> Option<&str> {
            Some(&d.last_name)
        }
        fn email(d: &Driver) -> Option<&str> {
            Some(&d.email)
        }

        FilterSet::new()
            .clause_if("companyId", self.company_id, |id| {
                equals(|d: &Driver| d.company_id, id)
            })
            .clause_if("search", self.search, |value| {
                contains_text(&[first_name, last_name, email], &value)
            })
    }
}
