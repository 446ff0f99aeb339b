//! ServerBuilder for fluent API to build HTTP servers

use super::entity_registry::EntityRegistry;
use super::resource::ExposedResource;
use super::router::build_router;
use super::state::AppState;
use super::statistics::statistics_routes;
use crate::config::TransitConfig;
use crate::entities::{
    Address, City, Company, Country, Driver, Route, State, Ticket, Vehicle, VehicleEnrollment,
};
use anyhow::Result;
use axum::Router;
use tokio::net::TcpListener;

/// Builder for creating HTTP servers with registered resource routes
///
/// # Example
///
/// ```ignore
/// let app = ServerBuilder::new()
///     .with_state(AppState::in_memory(Paginator::default()))
///     .register_transit_resources()
///     .build()?;
/// ```
pub struct ServerBuilder {
    state: Option<AppState>,
    entity_registry: EntityRegistry,
    custom_routes: Vec<Router<AppState>>,
}

impl ServerBuilder {
    /// Create a new ServerBuilder
    pub fn new() -> Self {
        Self {
            state: None,
            entity_registry: EntityRegistry::new(),
            custom_routes: Vec::new(),
        }
    }

    /// Set the application state (required)
    pub fn with_state(mut self, state: AppState) -> Self {
        self.state = Some(state);
        self
    }

    /// In-memory state with the paging limits from `config`
    pub fn with_config(self, config: &TransitConfig) -> Self {
        self.with_state(AppState::in_memory(config.paging.paginator()))
    }

    /// Add routes that don't fit the CRUD pattern
    pub fn with_custom_routes(mut self, routes: Router<AppState>) -> Self {
        self.custom_routes.push(routes);
        self
    }

    /// Register one resource
    pub fn register<R: ExposedResource>(mut self) -> Self {
        self.entity_registry.register_resource::<R>();
        self
    }

    /// Mount the ticket sales rankings
    pub fn with_statistics(self) -> Self {
        self.with_custom_routes(statistics_routes())
    }

    /// Register every resource of the transportation domain, plus the
    /// rankings
    pub fn register_transit_resources(self) -> Self {
        self.with_statistics()
            .register::<Country>()
            .register::<State>()
            .register::<City>()
            .register::<Address>()
            .register::<Route>()
            .register::<Company>()
            .register::<Vehicle>()
            .register::<Driver>()
            .register::<VehicleEnrollment>()
            .register::<Ticket>()
    }

    /// Registered entity types
    pub fn entity_types(&self) -> Vec<&str> {
        self.entity_registry.entity_types()
    }

    /// Build the final REST router
    pub fn build(self) -> Result<Router> {
        let state = self
            .state
            .ok_or_else(|| anyhow::anyhow!("AppState is required. Call .with_state()"))?;

        tracing::debug!(
            resources = ?self.entity_registry.plurals(),
            "building router"
        );

        Ok(build_router(&self.entity_registry, state, self.custom_routes))
    }

    /// Serve the application with graceful shutdown
    ///
    /// This will:
    /// - Bind to the provided address
    /// - Start serving requests
    /// - Handle SIGTERM and SIGINT (Ctrl+C) for graceful shutdown
    pub async fn serve(self, addr: &str) -> Result<()> {
        let app = self.build()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait for a shutdown signal (SIGTERM or Ctrl+C)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}
