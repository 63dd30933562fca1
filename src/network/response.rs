//! Response definitions
//!
//! JSON bodies returned to HTTP clients.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::FlatKvError;

/// Content type of every JSON response
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Serializes `T` as a JSON response with an explicit charset
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

impl<T: Serialize> IntoResponse for JsonBody<T> {
    fn into_response(self) -> Response {
        ([(header::CONTENT_TYPE, JSON_CONTENT_TYPE)], Json(self.0)).into_response()
    }
}

/// Body of `GET /`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hello {
    pub hello: String,
}

impl Hello {
    pub fn world() -> Self {
        Self {
            hello: "world".to_string(),
        }
    }
}

/// Body of a successful mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusBody {
    pub status: String,
}

impl StatusBody {
    pub fn success() -> Self {
        Self {
            status: "success".to_string(),
        }
    }
}

/// Body of any failed request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// An error on its way to the client
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    /// Create a 500 response with the given message
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }

    /// Create a 400 response with the given message
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<FlatKvError> for ApiError {
    fn from(err: FlatKvError) -> Self {
        Self::internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.message,
        };
        (self.status, JsonBody(body)).into_response()
    }
}
