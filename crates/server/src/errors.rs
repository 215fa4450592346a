use std::collections::BTreeMap;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use models::errors::ModelError;
use service::auth::errors::AuthError;
use service::errors::ServiceError;

const GENERIC_FAILURE: &str = "An unexpected error occurred";

/// Error returned by every handler; rendered as the JSON error body.
#[derive(Debug, Clone)]
pub struct JsonApiError {
    pub status: StatusCode,
    pub error: &'static str,
    pub message: String,
    pub errors: Option<BTreeMap<String, String>>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    status: u16,
    error: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<&'a str>,
    timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<&'a BTreeMap<String, String>>,
}

impl JsonApiError {
    pub fn new(status: StatusCode, error: &'static str, message: Option<String>) -> Self {
        let message = message.unwrap_or_else(|| error.to_string());
        Self { status, error, message, errors: None }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "Bad Request", Some(message.into()))
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized", Some(message.into()))
    }

    /// 400 with a per-field message map.
    pub fn validation(errors: BTreeMap<String, String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: "Validation Failed",
            message: "Input validation failed".into(),
            errors: Some(errors),
        }
    }

    pub fn field(field: &str, message: impl Into<String>) -> Self {
        Self::validation(BTreeMap::from([(field.to_string(), message.into())]))
    }

    fn body(&self, path: Option<&str>) -> Json<serde_json::Value> {
        let body = ErrorBody {
            status: self.status.as_u16(),
            error: self.error,
            message: &self.message,
            path,
            timestamp: Utc::now().to_rfc3339(),
            errors: self.errors.as_ref(),
        };
        Json(serde_json::to_value(body).unwrap_or_default())
    }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        let mut resp = (self.status, self.body(None)).into_response();
        // picked up by `attach_error_path` to add the request path
        resp.extensions_mut().insert(self);
        resp
    }
}

/// Re-render handler errors so the body carries the request path.
pub async fn attach_error_path(req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();
    let mut resp = next.run(req).await;
    match resp.extensions_mut().remove::<JsonApiError>() {
        Some(err) => (err.status, err.body(Some(&path))).into_response(),
        None => resp,
    }
}

impl From<ServiceError> for JsonApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::NotFound(m) => Self::new(StatusCode::NOT_FOUND, "Not Found", Some(m)),
            ServiceError::Conflict(m) => Self::new(StatusCode::CONFLICT, "Conflict", Some(m)),
            ServiceError::InvalidArgument(m) => Self::bad_request(m),
            ServiceError::Db(m) => {
                error!(code = 2100, error = %m, "service_failure");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error", Some(GENERIC_FAILURE.into()))
            }
        }
    }
}

impl From<ModelError> for JsonApiError {
    fn from(e: ModelError) -> Self {
        let errors = e
            .into_field_errors()
            .iter()
            .map(|(field, message)| (field.to_string(), message.to_string()))
            .collect();
        Self::validation(errors)
    }
}

impl From<AuthError> for JsonApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Validation(m) => Self::bad_request(m),
            AuthError::Unauthorized => Self::unauthorized("Invalid username or password"),
            AuthError::InvalidToken => Self::unauthorized("Invalid or expired token"),
            other => {
                error!(code = other.code(), error = %other, "auth_failure");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error", Some(GENERIC_FAILURE.into()))
            }
        }
    }
}

impl From<JsonRejection> for JsonApiError {
    fn from(rej: JsonRejection) -> Self {
        warn!(error = %rej.body_text(), "json_rejected");
        Self::bad_request(format!("Malformed request body: {}", rej.body_text()))
    }
}

impl From<QueryRejection> for JsonApiError {
    fn from(rej: QueryRejection) -> Self {
        Self::bad_request(format!("Invalid query parameters: {}", rej.body_text()))
    }
}

impl From<PathRejection> for JsonApiError {
    fn from(rej: PathRejection) -> Self {
        Self::bad_request(format!("Invalid path parameter: {}", rej.body_text()))
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("database unavailable: {0}")]
    Database(String),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}
