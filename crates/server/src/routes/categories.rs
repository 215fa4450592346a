use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use models::category;
use service::catalog::domain::CategoryInput;

use crate::errors::JsonApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::state::ServerState;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl CategoryRequest {
    /// Shape-check every field and produce the service input.
    fn into_input(self) -> Result<CategoryInput, JsonApiError> {
        let name = self.name.unwrap_or_default();
        let description = self.description.unwrap_or_default();
        category::validate(&name, &description)?;
        Ok(CategoryInput { name, description })
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

impl From<category::Model> for CategoryResponse {
    fn from(m: category::Model) -> Self {
        Self { id: m.id, name: m.name, description: m.description, created_at: m.created_at, updated_at: m.updated_at }
    }
}

#[utoipa::path(
    get, path = "/v1/categories", tag = "categories",
    responses((status = 200, description = "All categories", body = [CategoryResponse]))
)]
pub async fn list(State(state): State<ServerState>) -> Result<Json<Vec<CategoryResponse>>, JsonApiError> {
    let all = state.categories.list_all().await?;
    Ok(Json(all.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get, path = "/v1/categories/{id}", tag = "categories",
    params(("id" = Uuid, Path, description = "Category id")),
    responses(
        (status = 200, description = "Found", body = CategoryResponse),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get(State(state): State<ServerState>, ApiPath(id): ApiPath<Uuid>) -> Result<Json<CategoryResponse>, JsonApiError> {
    Ok(Json(state.categories.get_by_id(id).await?.into()))
}

#[utoipa::path(
    post, path = "/v1/categories", tag = "categories",
    request_body = CategoryRequest,
    responses(
        (status = 201, description = "Created", body = CategoryResponse),
        (status = 400, description = "Validation Failed"),
        (status = 409, description = "Name already taken")
    )
)]
pub async fn create(
    State(state): State<ServerState>,
    ApiJson(req): ApiJson<CategoryRequest>,
) -> Result<(StatusCode, Json<CategoryResponse>), JsonApiError> {
    let input = req.into_input()?;
    info!(name = %input.name, "category_create_request");
    let created = state.categories.create(input).await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

#[utoipa::path(
    put, path = "/v1/categories/{id}", tag = "categories",
    params(("id" = Uuid, Path, description = "Category id")),
    request_body = CategoryRequest,
    responses(
        (status = 200, description = "Updated", body = CategoryResponse),
        (status = 400, description = "Validation Failed"),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Name already taken")
    )
)]
pub async fn update(
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<CategoryRequest>,
) -> Result<Json<CategoryResponse>, JsonApiError> {
    let updated = state.categories.update(id, req.into_input()?).await?;
    Ok(Json(updated.into()))
}

#[utoipa::path(
    delete, path = "/v1/categories/{id}", tag = "categories",
    params(("id" = Uuid, Path, description = "Category id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Category still has products")
    )
)]
pub async fn delete(State(state): State<ServerState>, ApiPath(id): ApiPath<Uuid>) -> Result<StatusCode, JsonApiError> {
    state.categories.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
