//! Per-resource exposure: which service backs it, who may read and write
//! it, and which rows a caller may see

use crate::core::auth::{AuthContext, AuthPolicy};
use crate::core::entity::Resource;
use crate::core::error::{RequestError, StorageError, TransitError, TransitResult};
use crate::core::filter::{FilterSet, equals};
use crate::core::query::FilterCriteria;
use crate::core::service::DataService;
use crate::core::sorting::SortSpec;
use crate::entities::{
    Address, AddressCriteria, City, CityCriteria, Company, CompanyCriteria, Country,
    CountryCriteria, Driver, DriverCriteria, Route, RouteCriteria, State, StateCriteria, Ticket,
    TicketCriteria, Vehicle, VehicleCriteria, VehicleEnrollment, VehicleEnrollmentCriteria,
};
use crate::server::state::AppState;
use async_trait::async_trait;
use std::collections::HashSet;
use std::fmt::Debug;
use std::sync::Arc;
use validator::Validate;

/// A resource served over REST
#[async_trait]
pub trait ExposedResource: Resource + Validate {
    /// Filter criteria parsed from the listing query
    type Criteria: FilterCriteria<Target = Self> + Debug;

    /// Data service backing this resource
    fn service(state: &AppState) -> Arc<dyn DataService<Self>>;

    /// Policy for single-item reads
    fn read_policy() -> AuthPolicy {
        AuthPolicy::CompanyAccess
    }

    /// Policy for listings
    fn list_policy() -> AuthPolicy {
        Self::read_policy()
    }

    /// Policy for create and delete
    fn write_policy() -> AuthPolicy {
        AuthPolicy::AdministratorAccess
    }

    /// Order used when the caller gives no sort
    fn default_sort() -> SortSpec {
        SortSpec::by(Self::id_field())
    }

    /// Rows visible to the caller, as simple clauses
    async fn scope(_state: &AppState, _context: &AuthContext) -> TransitResult<FilterSet<Self>> {
        Ok(FilterSet::new())
    }

    /// Check that the caller may create or delete `entity`
    async fn authorize_write(
        _state: &AppState,
        _context: &AuthContext,
        _entity: &Self,
    ) -> TransitResult<()> {
        Ok(())
    }
}

/// Company a non-administrator is confined to; `None` for administrators
fn company_scope(context: &AuthContext) -> Result<Option<i64>, RequestError> {
    if context.is_admin() {
        return Ok(None);
    }
    context
        .company_id
        .map(Some)
        .ok_or_else(|| RequestError::Forbidden {
            message: format!(
                "role '{}' requires an X-Company-Id header",
                context.role.as_str()
            ),
        })
}

fn ensure_same_company(context: &AuthContext, company_id: i64) -> Result<(), RequestError> {
    match company_scope(context)? {
        Some(own) if own != company_id => Err(RequestError::Forbidden {
            message: format!("company {} is outside the caller's company", company_id),
        }),
        _ => Ok(()),
    }
}

/// Identifiers of the vehicles owned by `company_id`
async fn company_vehicle_ids(state: &AppState, company_id: i64) -> TransitResult<HashSet<i64>> {
    let vehicles = state
        .vehicles
        .list_matching(&|vehicle: &Vehicle| vehicle.company_id == company_id)
        .await
        .map_err(|e| StorageError::wrap("list vehicles", e))?;
    Ok(vehicles.into_iter().map(|vehicle| vehicle.id).collect())
}

macro_rules! expose_reference_data {
    ($($type:ty => $criteria:ty, $field:ident;)+) => {
        $(
            #[async_trait]
            impl ExposedResource for $type {
                type Criteria = $criteria;

                fn service(state: &AppState) -> Arc<dyn DataService<Self>> {
                    Arc::clone(&state.$field)
                }
            }
        )+
    };
}

expose_reference_data! {
    Country => CountryCriteria, countries;
    State => StateCriteria, states;
    City => CityCriteria, cities;
    Address => AddressCriteria, addresses;
    Route => RouteCriteria, routes;
}

#[async_trait]
impl ExposedResource for Company {
    type Criteria = CompanyCriteria;

    fn service(state: &AppState) -> Arc<dyn DataService<Self>> {
        Arc::clone(&state.companies)
    }

    async fn scope(_state: &AppState, context: &AuthContext) -> TransitResult<FilterSet<Self>> {
        Ok(match company_scope(context)? {
            Some(company_id) => {
                FilterSet::new().clause("company", equals(|c: &Company| c.id, company_id))
            }
            None => FilterSet::new(),
        })
    }
}

#[async_trait]
impl ExposedResource for Vehicle {
    type Criteria = VehicleCriteria;

    fn service(state: &AppState) -> Arc<dyn DataService<Self>> {
        Arc::clone(&state.vehicles)
    }

    fn write_policy() -> AuthPolicy {
        AuthPolicy::CompanyAccess
    }

    async fn scope(_state: &AppState, context: &AuthContext) -> TransitResult<FilterSet<Self>> {
        Ok(match company_scope(context)? {
            Some(company_id) => {
                FilterSet::new().clause("company", equals(|v: &Vehicle| v.company_id, company_id))
            }
            None => FilterSet::new(),
        })
    }

    async fn authorize_write(
        _state: &AppState,
        context: &AuthContext,
        entity: &Self,
    ) -> TransitResult<()> {
        Ok(ensure_same_company(context, entity.company_id)?)
    }
}

#[async_trait]
impl ExposedResource for Driver {
    type Criteria = DriverCriteria;

    fn service(state: &AppState) -> Arc<dyn DataService<Self>> {
        Arc::clone(&state.drivers)
    }

    fn write_policy() -> AuthPolicy {
        AuthPolicy::CompanyAccess
    }

    async fn scope(_state: &AppState, context: &AuthContext) -> TransitResult<FilterSet<Self>> {
        Ok(match company_scope(context)? {
            Some(company_id) => {
                FilterSet::new().clause("company", equals(|d: &Driver| d.company_id, company_id))
            }
            None => FilterSet::new(),
        })
    }

    async fn authorize_write(
        _state: &AppState,
        context: &AuthContext,
        entity: &Self,
    ) -> TransitResult<()> {
        Ok(ensure_same_company(context, entity.company_id)?)
    }
}

#[async_trait]
impl ExposedResource for VehicleEnrollment {
    type Criteria = VehicleEnrollmentCriteria;

    fn service(state: &AppState) -> Arc<dyn DataService<Self>> {
        Arc::clone(&state.vehicle_enrollments)
    }

    fn list_policy() -> AuthPolicy {
        AuthPolicy::DriverAccess
    }

    fn write_policy() -> AuthPolicy {
        AuthPolicy::CompanyAccess
    }

    fn default_sort() -> SortSpec {
        SortSpec::by("departureDateTimeUtc")
    }

    /// Enrollments are reached through the vehicle relation
    async fn scope(state: &AppState, context: &AuthContext) -> TransitResult<FilterSet<Self>> {
        let Some(company_id) = company_scope(context)? else {
            return Ok(FilterSet::new());
        };
        let vehicle_ids = company_vehicle_ids(state, company_id).await?;
        Ok(FilterSet::new().clause("company", move |e: &VehicleEnrollment| {
            vehicle_ids.contains(&e.vehicle_id)
        }))
    }

    async fn authorize_write(
        state: &AppState,
        context: &AuthContext,
        entity: &Self,
    ) -> TransitResult<()> {
        let Some(company_id) = company_scope(context)? else {
            return Ok(());
        };
        if company_vehicle_ids(state, company_id)
            .await?
            .contains(&entity.vehicle_id)
        {
            Ok(())
        } else {
            Err(TransitError::from(RequestError::Forbidden {
                message: format!(
                    "vehicle {} does not belong to company {}",
                    entity.vehicle_id, company_id
                ),
            }))
        }
    }
}

#[async_trait]
impl ExposedResource for Ticket {
    type Criteria = TicketCriteria;

    fn service(state: &AppState) -> Arc<dyn DataService<Self>> {
        Arc::clone(&state.tickets)
    }

    fn write_policy() -> AuthPolicy {
        AuthPolicy::Authenticated
    }

    fn default_sort() -> SortSpec {
        SortSpec::by("purchaseDateTimeUtc")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::auth::Role;
    use crate::core::paging::Paginator;

    fn vehicle(number: &str, company_id: i64) -> Vehicle {
        Vehicle {
            id: 0,
            number: number.to_string(),
            vehicle_type: "bus".to_string(),
            capacity: 40,
            has_climate_control: false,
            has_wifi: false,
            has_wc: false,
            has_stewardess: false,
            has_tv: false,
            has_outlet: false,
            has_belts: false,
            company_id,
        }
    }

    #[tokio::test]
    async fn test_vehicle_scope_follows_company() {
        let state = AppState::in_memory(Paginator::default());
        state.vehicles.create(vehicle("A1", 1)).await.unwrap();
        state.vehicles.create(vehicle("B1", 2)).await.unwrap();

        let owner = AuthContext::company_member(Role::CompanyOwner, 2);
        let scope = Vehicle::scope(&state, &owner).await.unwrap();
        let visible = scope.apply_simple(state.vehicles.list().await.unwrap());
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].number, "B1");

        let admin_scope = Vehicle::scope(&state, &AuthContext::administrator()).await.unwrap();
        assert!(admin_scope.is_empty());
    }

    #[tokio::test]
    async fn test_missing_company_is_forbidden() {
        let state = AppState::in_memory(Paginator::default());
        let driver = AuthContext {
            role: Role::Driver,
            company_id: None,
        };
        let err = VehicleEnrollment::scope(&state, &driver).await.err().unwrap();
        assert_eq!(err.status_code(), axum::http::StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_vehicle_write_checks_ownership() {
        let state = AppState::in_memory(Paginator::default());
        let owner = AuthContext::company_member(Role::CompanyOwner, 1);

        assert!(Vehicle::authorize_write(&state, &owner, &vehicle("A1", 1)).await.is_ok());
        assert!(Vehicle::authorize_write(&state, &owner, &vehicle("A2", 2)).await.is_err());
    }

    #[test]
    fn test_policies() {
        assert_eq!(Country::write_policy(), AuthPolicy::AdministratorAccess);
        assert_eq!(VehicleEnrollment::list_policy(), AuthPolicy::DriverAccess);
        assert_eq!(VehicleEnrollment::read_policy(), AuthPolicy::CompanyAccess);
        assert_eq!(Ticket::write_policy(), AuthPolicy::Authenticated);
    }
}
