//! HTTP API definitions.

pub mod location;
pub mod property;

use axum::{routing::get, Extension, Json, Router};
use serde::Serialize;

use crate::Service;

/// Creates a [`Router`] serving the HTTP API with the provided [`Service`].
pub fn router(service: Service) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/properties", get(property::list))
        .route("/properties/:id", get(property::by_id))
        .route("/locations/cities", get(location::cities))
        .route("/locations/states", get(location::states))
        .layer(Extension(service))
}

/// Response of a successful single item request.
#[derive(Clone, Debug, Serialize)]
pub struct Single<T> {
    /// Always `true`, as failures are rendered differently.
    pub success: bool,

    /// Requested item.
    pub data: T,
}

impl<T> From<T> for Single<T> {
    fn from(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Status of this application.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Health {
    /// Always `true` while the application serves requests.
    pub success: bool,
}

/// Reports this application being up.
#[expect(
    clippy::unused_async,
    reason = "`async` is required to match signature"
)]
pub async fn health() -> Json<Health> {
    Json(Health { success: true })
}
