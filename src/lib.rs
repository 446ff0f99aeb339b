//! # Transit
//!
//! REST backend for a transportation network (countries, cities, routes,
//! companies, vehicles, trips and tickets) built around one generic
//! listing pipeline.
//!
//! ## Features
//!
//! - **Field selection**: `?fields=id,name` projects each entity onto the
//!   requested fields; the identifier is always kept
//! - **Sorting**: `?sort=-capacity,number` with strict validation against
//!   the returned fields
//! - **Paging**: `?pageNumber=2&pageSize=20`, clamped to configured
//!   limits, metadata in the `X-Pagination` header
//! - **Filtering**: per-resource criteria, including aggregates over
//!   nested collections (total trip cost and duration)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use transit::prelude::*;
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! #[serde(rename_all = "camelCase")]
//! struct Stop {
//!     id: i64,
//!     name: String,
//! }
//!
//! impl_resource!(Stop, "stop", "stops", "id,name", fields {
//!     "id" => id,
//!     "name" => name,
//! });
//!
//! let pipeline = ResourcePipeline::<Stop>::new(Paginator::default());
//! let page = pipeline.execute(&params, stops, &FilterSet::new())?;
//! ```

pub mod config;
pub mod core;
pub mod entities;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Pipeline ===
    pub use crate::core::{
        DataService, FieldSelector, FieldSource, FieldValue, FilterCriteria, FilterSet, Page,
        Paginator, PagingMetadata, QueryParams, RangeBound, RawQuery, Record, Resource,
        ResourcePipeline, Selection, SortSpec, ToFieldValue,
    };

    // === Errors ===
    pub use crate::core::error::{QueryError, TransitError, TransitResult};

    // === Auth ===
    pub use crate::core::auth::{AuthContext, AuthPolicy, Role};

    // === Macros ===
    pub use crate::impl_resource;

    // === Server ===
    pub use crate::config::TransitConfig;
    pub use crate::server::{AppState, ExposedResource, ServerBuilder};
    pub use crate::storage::InMemoryDataService;

    // === Third-party re-exports ===
    pub use async_trait::async_trait;
    pub use serde::{Deserialize, Serialize};
}
