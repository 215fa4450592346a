use axum::{
    extract::{Request, State},
    http::{header, Method},
    middleware::Next,
    response::Response,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use utoipa::ToSchema;

use service::auth::domain::{Claims, DevCredential, LoginInput, LoginSession};

use crate::errors::JsonApiError;
use crate::extract::ApiJson;
use crate::state::ServerState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserInfo {
    pub username: String,
    pub role: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: UserInfo,
    /// milliseconds
    pub expires_in: u64,
}

impl From<LoginSession> for LoginResponse {
    fn from(s: LoginSession) -> Self {
        Self {
            access_token: s.access_token,
            token_type: s.token_type,
            user: UserInfo { username: s.user.username, role: s.user.role },
            expires_in: s.expires_in,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CredentialInfo {
    pub username: String,
    pub password: String,
    pub role: String,
    pub description: String,
}

impl From<DevCredential> for CredentialInfo {
    fn from(c: DevCredential) -> Self {
        Self { username: c.username, password: c.password, role: c.role, description: c.description }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CredentialsResponse {
    pub message: String,
    pub users: Vec<CredentialInfo>,
}

#[utoipa::path(
    post, path = "/v1/auth/login", tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged In", body = LoginResponse),
        (status = 400, description = "Bad Request"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn login(State(state): State<ServerState>, ApiJson(req): ApiJson<LoginRequest>) -> Result<Json<LoginResponse>, JsonApiError> {
    let input = LoginInput { username: req.username.unwrap_or_default(), password: req.password.unwrap_or_default() };
    let session = state.auth.login(input).await?;
    Ok(Json(session.into()))
}

#[utoipa::path(
    get, path = "/v1/credentials", tag = "auth",
    responses(
        (status = 200, description = "Development accounts", body = CredentialsResponse),
        (status = 404, description = "Disabled")
    )
)]
pub async fn credentials(State(state): State<ServerState>) -> Result<Json<CredentialsResponse>, JsonApiError> {
    if !state.expose_dev_credentials {
        return Err(JsonApiError::new(axum::http::StatusCode::NOT_FOUND, "Not Found", None));
    }
    Ok(Json(CredentialsResponse {
        message: "Test credentials for development use only".into(),
        users: state.auth.dev_credentials().into_iter().map(Into::into).collect(),
    }))
}

fn is_public(method: &Method, path: &str) -> bool {
    method == Method::OPTIONS
        || path == "/health"
        || path == "/v1/auth/login"
        || path == "/v1/credentials"
        || path.starts_with("/api-docs")
}

/// Global middleware: everything except the public endpoints and CORS
/// preflight needs `Authorization: Bearer <token>`; verified claims are
/// stored in request extensions.
pub async fn require_bearer_token(State(state): State<ServerState>, mut req: Request, next: Next) -> Result<Response, JsonApiError> {
    if is_public(req.method(), req.uri().path()) {
        return Ok(next.run(req).await);
    }
    let path = req.uri().path().to_string();

    let token = match req.headers().get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(h) => match h.strip_prefix("Bearer ") {
            Some(t) if !t.trim().is_empty() => t.trim().to_string(),
            _ => {
                warn!(%path, "invalid Authorization format (expect Bearer)");
                return Err(JsonApiError::unauthorized("Invalid Authorization header"));
            }
        },
        None => {
            warn!(%path, "missing Authorization header");
            return Err(JsonApiError::unauthorized("Authentication required"));
        }
    };

    let claims: Claims = state.auth.verify(&token).map_err(|e| {
        warn!(%path, error = %e, "token validation failed");
        JsonApiError::from(e)
    })?;
    debug!(sub = %claims.sub, "request authenticated");
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
