//! The transportation domain: every resource exposed by the service

pub mod enrollment;
pub mod fleet;
pub mod geography;
pub mod macros;
pub mod routes;
pub mod statistics;
pub mod ticket;

pub use enrollment::{RouteAddressDetails, VehicleEnrollment, VehicleEnrollmentCriteria};
pub use fleet::{Company, CompanyCriteria, Driver, DriverCriteria, Vehicle, VehicleCriteria};
pub use geography::{
    Address, AddressCriteria, City, CityCriteria, Country, CountryCriteria, State, StateCriteria,
};
pub use routes::{Route, RouteAddress, RouteCriteria};
pub use statistics::{CompanyStatistic, RouteStatistic, StationStatistic, UserStatistic};
pub use ticket::{Ticket, TicketCriteria};
