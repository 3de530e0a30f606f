//! HTTP server layers wrapping the [`api::router()`].

use std::time;

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::{self, Next},
    response::{IntoResponse as _, Response},
    Router,
};
use axum_client_ip::InsecureClientIp;
use http::header::HeaderValue;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing as log;

use crate::{api, config, error::QueryError, Error, Service};

/// Origin allowing requests from anywhere.
const ANY_ORIGIN: &str = "*";

/// Creates the application [`Router`] serving the [`api::router()`] behind
/// CORS, request deadline and tracing layers.
///
/// # Errors
///
/// If any of the configured CORS origins is not a valid header value.
pub fn app(service: Service, server: &config::Server) -> Result<Router, ()> {
    layered(api::router(service), server)
}

/// Wraps the provided [`Router`] into the application layers.
fn layered(router: Router, server: &config::Server) -> Result<Router, ()> {
    Ok(router
        .layer(cors(&server.cors)?)
        .layer(middleware::from_fn_with_state(
            server.request_timeout,
            deadline,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|r: &http::Request<_>| {
                    log::info_span!(
                        "HTTP request",
                        http.client_ip = InsecureClientIp::from(
                            r.headers(),
                            r.extensions()
                        )
                            .map(|ip| ip.0.to_string())
                            .ok(),
                        http.method = r.method().as_str(),
                        http.route = r
                            .extensions()
                            .get::<MatchedPath>()
                            .map(MatchedPath::as_str),
                        http.target = r
                            .uri()
                            .path_and_query()
                            .map(http::uri::PathAndQuery::as_str),
                        http.user_agent = r
                            .headers()
                            .get(http::header::USER_AGENT)
                            .and_then(|h| h.to_str().ok()),
                        http.status_code = log::field::Empty,
                    )
                })
                .on_response(
                    |r: &http::Response<_>,
                     dur: time::Duration,
                     span: &log::Span| {
                        _ = span.record(
                            "http.status_code",
                            log::field::display(r.status().as_u16()),
                        );

                        let duration = format!("{}ms", dur.as_millis());
                        if r.status().is_server_error() {
                            log::error!(%duration);
                        } else if r.status().is_client_error() {
                            log::warn!(%duration);
                        } else {
                            log::info!(%duration);
                        }
                    },
                ),
        ))
}

/// Aborts a request not answered within the configured timeout, reporting it
/// as a retryable `QUERY_EXECUTION_FAILED`.
async fn deadline(
    State(timeout): State<time::Duration>,
    request: Request,
    next: Next,
) -> Response {
    tokio::time::timeout(timeout, next.run(request))
        .await
        .unwrap_or_else(|_| {
            log::error!("request not answered within {timeout:?}");
            Error::from(QueryError::ExecutionFailed).into_response()
        })
}

/// Creates a read-only [`CorsLayer`] allowing the configured origins.
fn cors(config: &config::Cors) -> Result<CorsLayer, ()> {
    let origins = if config.origins.iter().any(|o| o == ANY_ORIGIN) {
        AllowOrigin::any()
    } else {
        config
            .origins
            .iter()
            .map(|origin| {
                origin.parse::<HeaderValue>().map_err(|e| {
                    log::error!("`{origin}` is not a valid CORS origin: {e}");
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(AllowOrigin::list)?
    };

    Ok(CorsLayer::new()
        .allow_methods([http::Method::GET, http::Method::OPTIONS])
        .allow_headers([http::header::CONTENT_TYPE])
        .allow_origin(origins))
}

#[cfg(test)]
mod spec {
    use std::time;

    use axum::{body::Body, routing::get, Router};
    use http::{header, Request, StatusCode};
    use tower::ServiceExt as _;

    use crate::{config, error::spec::render_response};

    use super::layered;

    fn server(
        origins: &[&str],
        request_timeout: time::Duration,
    ) -> config::Server {
        config::Server {
            cors: config::Cors {
                origins: origins.iter().map(|&o| o.to_owned()).collect(),
            },
            request_timeout,
            ..config::Server::default()
        }
    }

    fn router() -> Router {
        Router::new()
            .route("/ok", get(|| async { "ok" }))
            .route(
                "/stuck",
                get(|| async {
                    tokio::time::sleep(time::Duration::from_secs(60)).await;
                    "late"
                }),
            )
    }

    async fn allowed_origin(origins: &[&str], origin: &str) -> Option<String> {
        let app =
            layered(router(), &server(origins, time::Duration::from_secs(5)))
                .unwrap();
        let resp = app
            .oneshot(
                Request::get("/ok")
                    .header(header::ORIGIN, origin)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        resp.headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .map(|v| v.to_str().unwrap().to_owned())
    }

    #[tokio::test]
    async fn unanswered_request_is_retryable_failure() {
        let app = layered(
            router(),
            &server(&["*"], time::Duration::from_millis(20)),
        )
        .unwrap();

        let resp = app
            .oneshot(Request::get("/stuck").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let (status, body) = render_response(resp).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "QUERY_EXECUTION_FAILED");
        assert_eq!(body["error"]["retryable"], true);
    }

    #[tokio::test]
    async fn answered_request_passes_through() {
        let app = layered(
            router(),
            &server(&["*"], time::Duration::from_secs(5)),
        )
        .unwrap();

        let resp = app
            .oneshot(Request::get("/ok").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn allows_every_configured_origin() {
        let origins = ["https://a.example", "https://b.example"];

        assert_eq!(
            allowed_origin(&origins, "https://a.example").await.as_deref(),
            Some("https://a.example"),
        );
        assert_eq!(
            allowed_origin(&origins, "https://b.example").await.as_deref(),
            Some("https://b.example"),
        );
        assert_eq!(allowed_origin(&origins, "https://c.example").await, None);
    }

    #[tokio::test]
    async fn wildcard_allows_any_origin() {
        assert_eq!(
            allowed_origin(&["https://a.example", "*"], "https://z.example")
                .await
                .as_deref(),
            Some("*"),
        );
    }

    #[test]
    fn rejects_invalid_origin() {
        assert!(layered(
            router(),
            &server(&["bad\norigin"], time::Duration::from_secs(5)),
        )
        .is_err());
    }
}
