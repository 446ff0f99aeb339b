//! Core module: the resource-shaping pipeline and its building blocks

pub mod auth;
pub mod entity;
pub mod error;
pub mod field;
pub mod filter;
pub mod paging;
pub mod pipeline;
pub mod query;
pub mod record;
pub mod service;
pub mod shaping;
pub mod sorting;

pub use auth::{AuthContext, AuthPolicy, Role};
pub use entity::{FieldAccessors, FieldGetter, Resource};
pub use error::{QueryError, TransitError, TransitResult};
pub use field::{FieldValue, ToFieldValue};
pub use filter::{FilterSet, RangeBound};
pub use paging::{Page, PageRequest, Paginator, PagingMetadata};
pub use pipeline::{ListingPlan, ResourcePipeline};
pub use query::{FilterCriteria, QueryParams, RawQuery};
pub use record::{FieldSource, Record};
pub use service::DataService;
pub use shaping::{FieldSelector, Selection};
pub use sorting::{SortKey, SortSpec};
