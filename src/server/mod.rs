//! Server module for exposing transit resources over HTTP
//!
//! This module provides a `ServerBuilder` that registers:
//! - CRUD and listing routes for every exposed resource
//! - Ticket sales rankings under `/statistics`
//! - Health check routes

pub mod builder;
pub mod entity_registry;
pub mod handlers;
pub mod resource;
pub mod router;
pub mod state;
pub mod statistics;

pub use builder::ServerBuilder;
pub use entity_registry::{EntityDescriptor, EntityRegistry, ResourceDescriptor};
pub use handlers::PAGINATION_HEADER;
pub use resource::ExposedResource;
pub use state::AppState;
