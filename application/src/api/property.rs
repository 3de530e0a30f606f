//! [`Property`] HTTP API.

use axum::{
    extract::{Path, Query},
    Extension, Json,
};
use common::pagination::Envelope;
use service::{
    domain::property,
    query,
    read::property::{list, Record},
    Query as _,
};
use tracing as log;
use uuid::Uuid;

#[cfg(doc)]
use service::domain::Property;

use crate::{api::Single, define_error, AsError as _, Error, Service};

/// Lists [`Property`] records matching the query string.
///
/// Malformed parameters never fail the request, but fall back to defaults.
///
/// # Errors
///
/// Possible error codes:
/// - `QUERY_EXECUTION_FAILED` - the database failed to execute the query.
#[tracing::instrument(skip_all)]
pub async fn list(
    Extension(service): Extension<Service>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<Envelope<Record>>, Error> {
    let search =
        query::Search::new(&service, list::RawParams::from_pairs(params));
    service
        .execute(search)
        .await
        .map_err(|e| {
            log::error!("failed to list properties: {e}");
            e.into_error()
        })
        .map(|page| Json(page.into()))
}

/// Returns the [`Property`] with the specified ID.
///
/// # Errors
///
/// Possible error codes:
/// - `PROPERTY_NOT_EXISTS` - the [`Property`] with the specified ID does not
///                           exist;
/// - `QUERY_EXECUTION_FAILED` - the database failed to execute the query.
#[tracing::instrument(skip_all, fields(id = %id))]
pub async fn by_id(
    Extension(service): Extension<Service>,
    Path(id): Path<String>,
) -> Result<Json<Single<Record>>, Error> {
    let id = parse_id(&id)?;

    service
        .execute(query::property::ById::by(id))
        .await
        .map_err(|e| {
            log::error!("failed to select property `{id}`: {e}");
            e.into_error()
        })?
        .ok_or_else(|| PropertyError::NotExists.into())
        .map(|property| {
            Json(
                Record {
                    property,
                    projection: None,
                }
                .into(),
            )
        })
}

/// Parses the [`property::Id`] from a path segment.
///
/// A malformed ID cannot identify any [`Property`], so is reported as
/// `PROPERTY_NOT_EXISTS`.
fn parse_id(id: &str) -> Result<property::Id, Error> {
    Uuid::parse_str(id)
        .map(property::Id::from)
        .map_err(|_| PropertyError::NotExists.into())
}

define_error! {
    enum PropertyError {
        #[code = "PROPERTY_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Property` with the specified ID does not exist"]
        NotExists,
    }
}
