//! Entity registry for managing resource descriptors and generating CRUD routes

use crate::server::handlers;
use crate::server::resource::ExposedResource;
use crate::server::state::AppState;
use axum::{Router, routing::get};
use std::collections::BTreeMap;
use std::marker::PhantomData;

/// Trait that describes how to build routes for an entity
pub trait EntityDescriptor: Send + Sync {
    /// The entity type name (singular, e.g., "vehicle")
    fn entity_type(&self) -> &str;

    /// The plural form, also the path segment (e.g., "vehicles")
    fn plural(&self) -> &str;

    /// Build the CRUD routes for this entity:
    /// - GET/POST /{plural}
    /// - GET/PUT/DELETE /{plural}/{id}
    fn build_routes(&self) -> Router<AppState>;
}

/// Descriptor for any [`ExposedResource`]
pub struct ResourceDescriptor<R> {
    _marker: PhantomData<fn() -> R>,
}

impl<R> ResourceDescriptor<R> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<R> Default for ResourceDescriptor<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: ExposedResource> EntityDescriptor for ResourceDescriptor<R> {
    fn entity_type(&self) -> &str {
        R::resource_name_singular()
    }

    fn plural(&self) -> &str {
        R::resource_name()
    }

    fn build_routes(&self) -> Router<AppState> {
        let plural = R::resource_name();
        Router::new()
            .route(
                &format!("/{}", plural),
                get(handlers::list::<R>).post(handlers::create::<R>),
            )
            .route(
                &format!("/{}/{{id}}", plural),
                get(handlers::get_one::<R>)
                    .put(handlers::update::<R>)
                    .delete(handlers::delete_one::<R>),
            )
    }
}

/// Registry for all resources exposed by the server
#[derive(Default)]
pub struct EntityRegistry {
    descriptors: BTreeMap<String, Box<dyn EntityDescriptor>>,
}

impl EntityRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            descriptors: BTreeMap::new(),
        }
    }

    /// Register an entity descriptor
    ///
    /// The entity type name is the key; registering it twice replaces the
    /// earlier descriptor.
    pub fn register(&mut self, descriptor: Box<dyn EntityDescriptor>) {
        let entity_type = descriptor.entity_type().to_string();
        self.descriptors.insert(entity_type, descriptor);
    }

    /// Register a resource type
    pub fn register_resource<R: ExposedResource>(&mut self) {
        self.register(Box::new(ResourceDescriptor::<R>::new()));
    }

    /// Build a router with all registered entity routes
    pub fn build_routes(&self) -> Router<AppState> {
        let mut router = Router::new();

        for descriptor in self.descriptors.values() {
            router = router.merge(descriptor.build_routes());
        }

        router
    }

    /// Get all registered entity types
    pub fn entity_types(&self) -> Vec<&str> {
        self.descriptors.keys().map(|s| s.as_str()).collect()
    }

    /// Path segments of all registered entities
    pub fn plurals(&self) -> Vec<&str> {
        self.descriptors.values().map(|d| d.plural()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{City, Country, Vehicle, VehicleEnrollment};

    #[test]
    fn test_new_registry_is_empty() {
        let registry = EntityRegistry::new();
        assert!(registry.entity_types().is_empty());
    }

    #[test]
    fn test_register_resources() {
        let mut registry = EntityRegistry::new();
        registry.register_resource::<Country>();
        registry.register_resource::<City>();
        registry.register_resource::<VehicleEnrollment>();

        assert_eq!(
            registry.entity_types(),
            vec!["city", "country", "vehicleEnrollment"]
        );
        assert_eq!(
            registry.plurals(),
            vec!["cities", "countries", "vehicleEnrollments"]
        );
    }

    #[test]
    fn test_register_duplicate_replaces() {
        let mut registry = EntityRegistry::new();
        registry.register_resource::<Vehicle>();
        registry.register_resource::<Vehicle>();
        assert_eq!(registry.entity_types().len(), 1);
    }

    #[test]
    fn test_build_routes_with_entities() {
        let mut registry = EntityRegistry::new();
        registry.register_resource::<Country>();
        registry.register_resource::<Vehicle>();
        let _router = registry.build_routes();
    }
}
