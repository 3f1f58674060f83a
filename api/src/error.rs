use std::collections::HashMap;

use axum::{http::StatusCode, response::IntoResponse, Json};
use diesel_async::pooled_connection::deadpool::PoolError;
use serde::Serialize;
use serde_json::Value;

use crate::{guestbook::comment::validator::ParentResolutionError, identity::AuthenticationError};

/// Errors caused by the request itself, each knowing its own status code.
pub trait ApiRequestError: std::error::Error {
    fn status_code(&self) -> StatusCode;
}

#[derive(Debug)]
pub enum ServerError {
    DatabaseError(diesel::result::Error),
    PoolError(PoolError),
}

impl Serialize for ServerError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        use serde::ser::SerializeMap;
        let message = match self {
            ServerError::DatabaseError(e) => e.to_string(),
            ServerError::PoolError(e) => e.to_string(),
        };
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("message", &message)?;
        map.end()
    }
}

#[derive(Debug)]
pub enum AppError {
    ServerError {
        error: ServerError,

        #[cfg(debug_assertions)]
        backtrace: Option<backtrace::Backtrace>,
    },
    RequestError {
        msg: String,
        status: StatusCode,
    },
    Unhandled(String),
}

impl AppError {
    fn server(error: ServerError) -> Self {
        AppError::ServerError {
            error,

            #[cfg(debug_assertions)]
            backtrace: Some(backtrace::Backtrace::new()),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ServerError { .. } | AppError::Unhandled(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::RequestError { status, .. } => *status,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    success: bool,

    code: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    msg: Option<String>,

    #[cfg(debug_assertions)]
    #[serde(skip_serializing_if = "Option::is_none")]
    debug_info: Option<HashMap<&'static str, Value>>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status_code = self.status_code();

        let error_response = match self {
            AppError::ServerError {
                error,
                #[cfg(debug_assertions)]
                backtrace,
            } => {
                tracing::error!(?error, "Server error while handling request");

                #[cfg(debug_assertions)]
                let response = {
                    let frames_info = backtrace
                        .as_ref()
                        .map(filter_backtrace)
                        .unwrap_or_default();
                    ErrorResponse {
                        success: false,
                        code: "DATABASE_ERR".into(),
                        msg: Some("Database error".into()),
                        debug_info: Some(HashMap::from([
                            (
                                "backtrace",
                                serde_json::to_value(&frames_info).unwrap_or_default(),
                            ),
                            ("error", serde_json::to_value(&error).unwrap_or_default()),
                        ])),
                    }
                };

                #[cfg(not(debug_assertions))]
                let response = ErrorResponse {
                    success: false,
                    code: "SERVER_ERR".into(),
                    msg: Some("Internal server error".into()),
                };

                response
            }
            AppError::RequestError { msg, .. } => ErrorResponse {
                success: false,
                code: "REQUEST_ERR".into(),
                msg: Some(msg),
                #[cfg(debug_assertions)]
                debug_info: None,
            },
            AppError::Unhandled(e) => {
                tracing::error!(error = %e, "Unhandled error while handling request");
                ErrorResponse {
                    success: false,
                    code: "ERR".into(),
                    msg: Some(e),
                    #[cfg(debug_assertions)]
                    debug_info: None,
                }
            }
        };

        (status_code, Json(error_response)).into_response()
    }
}

impl From<diesel::result::Error> for AppError {
    fn from(e: diesel::result::Error) -> Self {
        AppError::server(ServerError::DatabaseError(e))
    }
}

impl From<PoolError> for AppError {
    fn from(e: PoolError) -> Self {
        AppError::server(ServerError::PoolError(e))
    }
}

impl From<&'static str> for AppError {
    fn from(e: &'static str) -> Self {
        AppError::Unhandled(e.into())
    }
}

impl<T: Into<String>> From<(T, StatusCode)> for AppError {
    fn from((msg, status): (T, StatusCode)) -> Self {
        AppError::RequestError {
            msg: msg.into(),
            status,
        }
    }
}

fn from_request_error<E: ApiRequestError>(e: E) -> AppError {
    AppError::RequestError {
        msg: e.to_string(),
        status: e.status_code(),
    }
}

impl From<AuthenticationError> for AppError {
    fn from(e: AuthenticationError) -> Self {
        from_request_error(e)
    }
}

impl From<ParentResolutionError> for AppError {
    fn from(e: ParentResolutionError) -> Self {
        from_request_error(e)
    }
}

#[derive(Serialize, Debug)]
struct FrameInfo {
    name: String,
    loc: String,
}

#[cfg_attr(not(debug_assertions), allow(dead_code))]
fn filter_backtrace(backtrace: &backtrace::Backtrace) -> Vec<FrameInfo> {
    const MODULE_PREFIX: &str = concat!(env!("CARGO_CRATE_NAME"), "::");
    let mut frames_info: Vec<FrameInfo> = Vec::new();

    for frame in backtrace.frames() {
        for symbol in frame.symbols() {
            if let (Some(name), Some(filename), Some(lineno)) = (
                symbol.name().map(|n| n.to_string()),
                symbol.filename().map(|f| f.to_owned()),
                symbol.lineno(),
            ) {
                if name.contains(MODULE_PREFIX) {
                    frames_info.push(FrameInfo {
                        name,
                        loc: format!("{}:{}", filename.display(), lineno),
                    });
                }
            }
        }
    }

    frames_info
}
