//! [`Error`]-related definitions.

use std::fmt;

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use derive_more::Error as StdError;
use itertools::Itertools as _;
use serde::Serialize;
use service::infra::database;
use tracerr::{Trace, Traced};

/// Defines a new error type.
#[expect(clippy::module_name_repetitions, reason = "more readable")]
#[macro_export]
macro_rules! define_error {
    (
        enum $name:ident {
            $(
                #[code = $code:literal]
                #[status = $status_code:ident]
                #[message = $message:literal]
                $variant:ident
            ),* $(,)?
        }
    ) => {
        /// Error type.
        #[derive(
            Clone,
            Copy,
            Debug,
            ::derive_more::Display,
            ::derive_more::Error
        )]
        #[repr(u16)]
        pub enum $name {
            $(
                #[display($message)]
                #[doc = $message]
                $variant,
            )*
        }

        impl From<$name> for $crate::Error {
            fn from(err: $name) -> Self {
                match err {
                    $(
                        $name::$variant => Self {
                            code: $code,
                            status_code: ::http::StatusCode::$status_code,
                            message: $message.to_string(),
                            backtrace: None,
                        },
                    )*
                }
            }
        }
    };
}

/// HTTP API [`Error`].
#[derive(Clone, Debug, StdError)]
pub struct Error {
    /// [`Error`] code.
    pub code: Code,

    /// [`http::StatusCode`] of this [`Error`].
    pub status_code: http::StatusCode,

    /// Backtrace of this [`Error`].
    #[error(not(backtrace))]
    pub backtrace: Option<Trace>,

    /// [`Error`] message.
    pub message: String,
}

impl Error {
    /// Create a new [`Error`] representing an internal server error.
    #[must_use]
    pub fn internal(msg: &impl ToString) -> Self {
        Self {
            code: "INTERNAL_SERVER_ERROR",
            status_code: http::StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.to_string(),
            backtrace: None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            code,
            status_code: _,
            backtrace,
            message,
        } = self;

        write!(
            f,
            "[{code}]: {message}{}",
            backtrace
                .iter()
                .format_with("\n", |trace, f| f(&format_args!("{trace}"))),
        )
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let Self {
            code,
            status_code,
            backtrace: _,
            message,
        } = self;

        let body = Body {
            success: false,
            error: Details {
                code,
                message,
                retryable: status_code == http::StatusCode::SERVICE_UNAVAILABLE,
            },
        };
        (status_code, Json(body)).into_response()
    }
}

/// JSON body of an [`Error`] response.
#[derive(Debug, Serialize)]
struct Body {
    /// Always `false`.
    success: bool,

    /// [`Details`] of the [`Error`].
    error: Details,
}

/// [`Error`] details exposed to clients.
#[derive(Debug, Serialize)]
struct Details {
    /// [`Error`] code.
    code: Code,

    /// Human-readable [`Error`] message.
    message: String,

    /// Indicator whether the request may succeed if repeated later.
    retryable: bool,
}

/// [`Error`] code.
pub type Code = &'static str;

/// Helper trait for converting types into [`Error`]s.
pub trait AsError {
    /// Tries to convert the type into an [`Error`].
    ///
    /// [`None`] is returned if the type cannot be converted into an [`Error`].
    fn try_as_error(&self) -> Option<Error>;

    /// Converts the type into an [`Error`].
    fn as_error(&self) -> Error
    where
        Self: fmt::Display,
    {
        self.try_as_error()
            .unwrap_or_else(|| Error::internal(&self))
    }

    /// Converts the type into an [`Error`] by consuming it.
    fn into_error(self) -> Error
    where
        Self: fmt::Display + Sized,
    {
        self.as_error()
    }
}

impl<E: AsError> AsError for Traced<E> {
    fn try_as_error(&self) -> Option<Error> {
        let mut error = self.as_ref().try_as_error()?;
        error.backtrace = Some(self.trace().clone());
        Some(error)
    }
}

impl AsError for database::Error {
    fn try_as_error(&self) -> Option<Error> {
        Some(QueryError::ExecutionFailed.into())
    }
}

define_error! {
    enum QueryError {
        #[code = "QUERY_EXECUTION_FAILED"]
        #[status = SERVICE_UNAVAILABLE]
        #[message = "Failed to execute the query, try again later"]
        ExecutionFailed,
    }
}

#[cfg(test)]
pub(crate) mod spec {
    use axum::{
        body,
        response::{IntoResponse as _, Response},
    };
    use serde_json::json;
    use service::infra::database::{self, memory};

    use super::{AsError as _, Error};

    pub(crate) async fn render_response(
        resp: Response,
    ) -> (http::StatusCode, serde_json::Value) {
        let status = resp.status();
        let bytes = body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    pub(crate) async fn render(
        err: Error,
    ) -> (http::StatusCode, serde_json::Value) {
        render_response(err.into_response()).await
    }

    #[tokio::test]
    async fn database_errors_are_retryable() {
        let err = database::Error::from(memory::Error::Unavailable);
        let traced = tracerr::new!(err);

        let err = traced.as_error();
        assert_eq!(err.code, "QUERY_EXECUTION_FAILED");
        assert!(err.backtrace.is_some());

        let (status, body) = render(err).await;
        assert_eq!(status, http::StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            body,
            json!({
                "success": false,
                "error": {
                    "code": "QUERY_EXECUTION_FAILED",
                    "message": "Failed to execute the query, try again later",
                    "retryable": true,
                },
            }),
        );
    }

    #[tokio::test]
    async fn internal_errors() {
        let (status, body) = render(Error::internal(&"boom")).await;
        assert_eq!(status, http::StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "INTERNAL_SERVER_ERROR");
        assert_eq!(body["error"]["retryable"], false);
    }
}
