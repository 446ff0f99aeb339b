//! Countries, states, cities and addresses

use crate::core::filter::{FilterSet, contains_text, equals};
use crate::core::query::{FilterCriteria, RawQuery};
use crate::impl_resource;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Country {
    #[serde(default)]
    pub id: i64,

    /// ISO-style country code
    #[validate(length(min = 1, max = 8))]
    pub code: String,

    #[validate(length(min = 1, max = 64))]
    pub name: String,
}

impl_resource!(
    Country,
    "country",
    "countries",
    "id,code,name",
    fields {
        "id" => id,
        "code" => code,
        "name" => name,
    }
);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct State {
    #[serde(default)]
    pub id: i64,

    #[validate(length(min = 1, max = 64))]
    pub name: String,

    pub country_id: i64,
}

impl_resource!(
    State,
    "state",
    "states",
    "id,name,countryId",
    fields {
        "id" => id,
        "name" => name,
        "countryId" => country_id,
    }
);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct City {
    #[serde(default)]
    pub id: i64,

    #[validate(length(min = 1, max = 64))]
    pub name: String,

    pub state_id: i64,
}

impl_resource!(
    City,
    "city",
    "cities",
    "id,name,stateId",
    fields {
        "id" => id,
        "name" => name,
        "stateId" => state_id,
    }
);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default)]
    pub id: i64,

    /// Street address or stop name
    #[validate(length(min = 1, max = 128))]
    pub name: String,

    pub city_id: i64,
}

impl_resource!(
    Address,
    "address",
    "addresses",
    "id,name,cityId",
    fields {
        "id" => id,
        "name" => name,
        "cityId" => city_id,
    }
);

// =============================================================================
// Filter criteria
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CountryCriteria {
    pub code: Option<String>,
    pub name: Option<String>,
    pub search: Option<String>,
}

impl FilterCriteria for CountryCriteria {
    type Target = Country;

    fn from_query(query: &RawQuery) -> Self {
        Self {
            code: query.str("code").map(str::to_string),
            name: query.str("name").map(str::to_string),
            search: query.str("search").map(str::to_string),
        }
    }

    fn into_filter(self) -> FilterSet<Country> {
        fn code(c: &Country) -> Option<&str> {
            Some(&c.code)
        }
        fn name(c: &Country) -> Option<&str> {
            Some(&c.name)
        }

        FilterSet::new()
            .clause_if("code", self.code, |value| {
                equals(|c: &Country| c.code.to_lowercase(), value.to_lowercase())
            })
            .clause_if("name", self.name, |value| contains_text(&[name], &value))
            .clause_if("search", self.search, |value| contains_text(&[code, name], &value))
    }
}

/// Criteria shared by states, cities and addresses: a name, a parent id and
/// free-text search over the name
macro_rules! named_child_criteria {
    ($criteria:ident, $target:ident, $parent_param:literal, $parent_field:ident) => {
        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct $criteria {
            pub name: Option<String>,
            pub parent_id: Option<i64>,
            pub search: Option<String>,
        }

        impl FilterCriteria for $criteria {
            type Target = $target;

            fn from_query(query: &RawQuery) -> Self {
                Self {
                    name: query.str("name").map(str::to_string),
                    parent_id: query.i64($parent_param),
                    search: query.str("search").map(str::to_string),
                }
            }

            fn into_filter(self) -> FilterSet<$target> {
                fn name(e: &$target) -> Option<&str> {
                    Some(&e.name)
                }

                FilterSet::new()
                    .clause_if("name", self.name, |value| contains_text(&[name], &value))
                    .clause_if($parent_param, self.parent_id, |id| {
                        equals(|e: &$target| e.$parent_field, id)
                    })
                    .clause_if("search", self.search, |value| contains_text(&[name], &value))
            }
        }
    };
}

named_child_criteria!(StateCriteria, State, "countryId", country_id);
named_child_criteria!(CityCriteria, City, "stateId", state_id);
named_child_criteria!(AddressCriteria, Address, "cityId", city_id);
