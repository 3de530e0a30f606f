//! Location HTTP API.

use axum::{extract::Query, Extension, Json};
use common::pagination::Envelope;
use service::{
    query,
    read::{
        location::{Group, GroupBy},
        property::list::RawParams,
    },
    Query as _,
};
use tracing as log;

use crate::{AsError as _, Error, Service};

/// Lists cities with the number of properties located in each, most
/// populated first.
///
/// # Errors
///
/// Possible error codes:
/// - `QUERY_EXECUTION_FAILED` - the database failed to execute the query.
pub async fn cities(
    service: Extension<Service>,
    params: Query<Vec<(String, String)>>,
) -> Result<Json<Envelope<Group>>, Error> {
    list(GroupBy::City, service, params).await
}

/// Lists states with the number of properties located in each, in
/// alphabetical order.
///
/// # Errors
///
/// Possible error codes:
/// - `QUERY_EXECUTION_FAILED` - the database failed to execute the query.
pub async fn states(
    service: Extension<Service>,
    params: Query<Vec<(String, String)>>,
) -> Result<Json<Envelope<Group>>, Error> {
    list(GroupBy::State, service, params).await
}

/// Lists locations grouped by the provided [`GroupBy`].
#[tracing::instrument(skip_all, fields(group_by = %group_by))]
async fn list(
    group_by: GroupBy,
    Extension(service): Extension<Service>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<Envelope<Group>>, Error> {
    // Only pagination and sorting apply to locations.
    let RawParams {
        sort, page, limit, ..
    } = RawParams::from_pairs(params);
    let locations = query::Locations::new(
        &service,
        group_by,
        sort.as_deref(),
        page.as_deref(),
        limit.as_deref(),
    );

    service
        .execute(locations)
        .await
        .map_err(|e| {
            log::error!("failed to list locations by {group_by}: {e}");
            e.into_error()
        })
        .map(|page| Json(page.into()))
}
