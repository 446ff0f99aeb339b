//! Generic REST handlers shared by every exposed resource

use crate::core::auth::AuthContext;
use crate::core::error::{
    EntityError, RequestError, StorageError, TransitError, TransitResult, ValidationError,
};
use crate::core::paging::Page;
use crate::core::query::{FilterCriteria, QueryParams, RawQuery};
use crate::core::record::Record;
use crate::server::resource::ExposedResource;
use crate::server::state::AppState;
use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};

/// Response header carrying the paging metadata of a listing
pub const PAGINATION_HEADER: &str = "x-pagination";

/// List resources
///
/// GET /{plural}?fields=&sort=&pageNumber=&pageSize=&search=&...
pub async fn list<R: ExposedResource>(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(pairs): Query<Vec<(String, String)>>,
) -> TransitResult<Response> {
    let context = R::list_policy().enforce(&headers)?;
    let query = RawQuery::from_pairs(pairs);
    let params = QueryParams::from_raw(&query);

    let pipeline = state.pipeline::<R>();
    let plan = pipeline.plan(&params)?;

    let criteria = R::Criteria::from_query(&query);
    tracing::debug!(resource = R::resource_name(), ?criteria, "listing");
    let filter = criteria.into_filter().and(R::scope(&state, &context).await?);

    let candidates = R::service(&state)
        .list_matching(&|entity: &R| filter.matches_simple(entity))
        .await
        .map_err(|e| StorageError::wrap("list", e))?;

    paged_response(pipeline.run(&plan, candidates, &filter))
}

/// Page items as the body, paging metadata in the header
pub(crate) fn paged_response(page: Page<Record>) -> TransitResult<Response> {
    let metadata = page
        .metadata
        .to_header_value()
        .map_err(|e| TransitError::Internal(e.to_string()))?;

    Ok(([(PAGINATION_HEADER, metadata)], Json(page.items)).into_response())
}

/// Get a single resource
///
/// GET /{plural}/{id}?fields=
pub async fn get_one<R: ExposedResource>(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> TransitResult<Json<Record>> {
    let context = R::read_policy().enforce(&headers)?;
    let id = parse_id(&id)?;
    let entity = find_visible::<R>(&state, &context, id).await?;

    let params = QueryParams::from_raw(&RawQuery::from_pairs(pairs));
    Ok(Json(state.pipeline::<R>().shape_one(&entity, params.fields())))
}

/// Create a resource
///
/// POST /{plural}, answering 201 with a Location header
pub async fn create<R: ExposedResource>(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<R>, JsonRejection>,
) -> TransitResult<Response> {
    let context = R::write_policy().enforce(&headers)?;
    let Json(entity) = payload.map_err(|rejection| ValidationError::InvalidJson {
        message: rejection.body_text(),
    })?;

    entity.validate()?;
    R::authorize_write(&state, &context, &entity).await?;

    let created = R::service(&state)
        .create(entity)
        .await
        .map_err(|e| StorageError::wrap("create", e))?;

    tracing::info!(resource = R::resource_name(), id = created.id(), "created");

    let location = format!("/{}/{}", R::resource_name(), created.id());
    let body = state.pipeline::<R>().shape_full(&created);

    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(body)).into_response())
}

/// Replace a resource
///
/// PUT /{plural}/{id}, answering with the full public shape
pub async fn update<R: ExposedResource>(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    payload: Result<Json<R>, JsonRejection>,
) -> TransitResult<Json<Record>> {
    let context = R::write_policy().enforce(&headers)?;
    let id = parse_id(&id)?;
    let Json(mut entity) = payload.map_err(|rejection| ValidationError::InvalidJson {
        message: rejection.body_text(),
    })?;
    entity.set_id(id);

    let existing = find_visible::<R>(&state, &context, id).await?;
    entity.validate()?;
    R::authorize_write(&state, &context, &existing).await?;
    R::authorize_write(&state, &context, &entity).await?;

    let updated = R::service(&state)
        .update(id, entity)
        .await
        .map_err(|e| StorageError::wrap("update", e))?
        .ok_or_else(|| not_found::<R>(id))?;

    tracing::info!(resource = R::resource_name(), id, "updated");
    Ok(Json(state.pipeline::<R>().shape_full(&updated)))
}

/// Delete a resource
///
/// DELETE /{plural}/{id}
pub async fn delete_one<R: ExposedResource>(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> TransitResult<StatusCode> {
    let context = R::write_policy().enforce(&headers)?;
    let id = parse_id(&id)?;
    let existing = find_visible::<R>(&state, &context, id).await?;
    R::authorize_write(&state, &context, &existing).await?;

    let deleted = R::service(&state)
        .delete(id)
        .await
        .map_err(|e| StorageError::wrap("delete", e))?;
    if !deleted {
        return Err(not_found::<R>(id).into());
    }

    tracing::info!(resource = R::resource_name(), id, "deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn parse_id(raw: &str) -> Result<i64, RequestError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| RequestError::InvalidEntityId { id: raw.to_string() })
}

fn not_found<R: ExposedResource>(id: i64) -> EntityError {
    EntityError::NotFound {
        entity_type: R::resource_name_singular().to_string(),
        id,
    }
}

/// Fetch an entity the caller is allowed to see; out-of-scope rows are
/// reported as missing
async fn find_visible<R: ExposedResource>(
    state: &AppState,
    context: &AuthContext,
    id: i64,
) -> TransitResult<R> {
    let scope = R::scope(state, context).await?;
    let entity = R::service(state)
        .get(id)
        .await
        .map_err(|e| StorageError::wrap("get", e))?;

    match entity {
        Some(entity) if scope.matches(&entity) => Ok(entity),
        _ => Err(not_found::<R>(id).into()),
    }
}
