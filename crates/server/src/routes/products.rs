use std::collections::{BTreeMap, HashMap};

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use models::{errors::FieldErrors, product};
use service::catalog::domain::{NewProduct, ProductSort, ProductSortField, ProductUpdate, SortDirection};
use service::pagination::{Page, PageRequest, DEFAULT_PAGE_SIZE};

use crate::errors::JsonApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::state::ServerState;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default, with = "rust_decimal::serde::arbitrary_precision_option")]
    #[schema(value_type = Option<f64>)]
    pub price: Option<Decimal>,
    pub stock_quantity: Option<i32>,
    pub category_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

impl CreateProductRequest {
    fn into_new_product(self) -> Result<NewProduct, JsonApiError> {
        let name = self.name.unwrap_or_default();
        let description = self.description.unwrap_or_default();
        let stock_quantity = self.stock_quantity.unwrap_or(0);

        let mut errs = FieldErrors::default();
        errs.check(product::validate_name(&name));
        errs.check(product::validate_description(&description));
        match &self.price {
            Some(p) => errs.check(product::validate_price(p)),
            None => errs.insert("price", "Price is required"),
        }
        errs.check(product::validate_stock_quantity(stock_quantity));
        if self.category_id.is_none() {
            errs.insert("categoryId", "Category ID is required");
        }
        errs.into_result()?;

        match (self.price, self.category_id) {
            (Some(price), Some(category_id)) => Ok(NewProduct {
                name,
                description,
                price,
                stock_quantity,
                category_id,
                is_active: self.is_active.unwrap_or(true),
            }),
            _ => Err(JsonApiError::bad_request("Input validation failed")),
        }
    }
}

/// Partial update; omitted fields keep their stored value.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default, with = "rust_decimal::serde::arbitrary_precision_option")]
    #[schema(value_type = Option<f64>)]
    pub price: Option<Decimal>,
    pub stock_quantity: Option<i32>,
    pub category_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

impl UpdateProductRequest {
    fn into_update(self) -> Result<ProductUpdate, JsonApiError> {
        let mut errs = FieldErrors::default();
        if let Some(v) = &self.name { errs.check(product::validate_name(v)); }
        if let Some(v) = &self.description { errs.check(product::validate_description(v)); }
        if let Some(v) = &self.price { errs.check(product::validate_price(v)); }
        if let Some(v) = self.stock_quantity { errs.check(product::validate_stock_quantity(v)); }
        errs.into_result()?;
        Ok(ProductUpdate {
            name: self.name,
            description: self.description,
            price: self.price,
            stock_quantity: self.stock_quantity,
            category_id: self.category_id,
            is_active: self.is_active,
        })
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    #[schema(value_type = f64)]
    pub price: Decimal,
    pub stock_quantity: i32,
    pub category_id: Uuid,
    /// resolved when the response is built
    pub category_name: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

impl ProductResponse {
    fn named(m: product::Model, names: &HashMap<Uuid, String>) -> Self {
        Self {
            id: m.id,
            name: m.name,
            description: m.description,
            price: m.price.normalize(),
            stock_quantity: m.stock_quantity,
            category_id: m.category_id,
            category_name: names.get(&m.category_id).cloned(),
            is_active: m.is_active,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductPage {
    pub items: Vec<ProductResponse>,
    pub total_count: u64,
    pub page: u64,
    pub size: u64,
    pub total_pages: u64,
}

impl ProductPage {
    fn named(p: Page<product::Model>, names: &HashMap<Uuid, String>) -> Self {
        let total_pages = p.total_pages();
        let p = p.map(|m| ProductResponse::named(m, names));
        Self { items: p.items, total_count: p.total_count, page: p.page, size: p.size, total_pages }
    }
}

async fn respond_one(state: &ServerState, m: product::Model) -> Result<ProductResponse, JsonApiError> {
    let names = state.products.category_names(std::slice::from_ref(&m)).await?;
    Ok(ProductResponse::named(m, &names))
}

async fn respond_page(state: &ServerState, page: Page<product::Model>) -> Result<ProductPage, JsonApiError> {
    let names = state.products.category_names(&page.items).await?;
    Ok(ProductPage::named(page, &names))
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// zero-based page index (default 0)
    pub page: Option<u64>,
    /// page size, 1..=100 (default 10)
    pub size: Option<u64>,
    /// name | price | stockQuantity | createdAt | updatedAt
    pub sort_by: Option<String>,
    /// ASC | DESC
    pub direction: Option<String>,
}

fn page_request(page: Option<u64>, size: Option<u64>) -> PageRequest {
    PageRequest::new(page.unwrap_or(0), size.unwrap_or(DEFAULT_PAGE_SIZE))
}

impl ListQuery {
    fn sort(&self) -> Result<ProductSort, JsonApiError> {
        let mut errors = BTreeMap::new();
        let field = match self.sort_by.as_deref() {
            None => ProductSortField::default(),
            Some(s) => ProductSortField::parse(s).unwrap_or_else(|| {
                errors.insert("sortBy".to_string(), format!("Unsupported sort field: {s}"));
                ProductSortField::default()
            }),
        };
        let direction = match self.direction.as_deref() {
            None => SortDirection::default(),
            Some(s) => SortDirection::parse(s).unwrap_or_else(|| {
                errors.insert("direction".to_string(), "Direction must be ASC or DESC".to_string());
                SortDirection::default()
            }),
        };
        if !errors.is_empty() {
            return Err(JsonApiError::validation(errors));
        }
        Ok(ProductSort { field, direction })
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    pub keyword: Option<String>,
    pub page: Option<u64>,
    pub size: Option<u64>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PriceQuery {
    #[param(value_type = Option<f64>)]
    pub min_price: Option<Decimal>,
    #[param(value_type = Option<f64>)]
    pub max_price: Option<Decimal>,
    pub page: Option<u64>,
    pub size: Option<u64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StockRequest {
    pub quantity: Option<i32>,
}

impl StockRequest {
    fn quantity(&self) -> Result<i32, JsonApiError> {
        match self.quantity {
            None => Err(JsonApiError::field("quantity", "Quantity is required")),
            Some(q) if q < 0 => Err(JsonApiError::field("quantity", "Quantity cannot be negative")),
            Some(q) => Ok(q),
        }
    }
}

#[utoipa::path(
    get, path = "/v1/products", tag = "products",
    params(ListQuery),
    responses(
        (status = 200, description = "Active products", body = ProductPage),
        (status = 400, description = "Unsupported sort")
    )
)]
pub async fn list(State(state): State<ServerState>, ApiQuery(q): ApiQuery<ListQuery>) -> Result<Json<ProductPage>, JsonApiError> {
    let sort = q.sort()?;
    let page = state.products.list_active(page_request(q.page, q.size), sort).await?;
    Ok(Json(respond_page(&state, page).await?))
}

#[utoipa::path(
    get, path = "/v1/products/{id}", tag = "products",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Found", body = ProductResponse),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get(State(state): State<ServerState>, ApiPath(id): ApiPath<Uuid>) -> Result<Json<ProductResponse>, JsonApiError> {
    let found = state.products.get_by_id(id).await?;
    Ok(Json(respond_one(&state, found).await?))
}

#[utoipa::path(
    post, path = "/v1/products", tag = "products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Created", body = ProductResponse),
        (status = 400, description = "Validation Failed"),
        (status = 404, description = "Category not found")
    )
)]
pub async fn create(
    State(state): State<ServerState>,
    ApiJson(req): ApiJson<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), JsonApiError> {
    let input = req.into_new_product()?;
    info!(name = %input.name, category_id = %input.category_id, "product_create_request");
    let created = state.products.create(input).await?;
    Ok((StatusCode::CREATED, Json(respond_one(&state, created).await?)))
}

#[utoipa::path(
    put, path = "/v1/products/{id}", tag = "products",
    params(("id" = Uuid, Path, description = "Product id")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Updated", body = ProductResponse),
        (status = 400, description = "Validation Failed"),
        (status = 404, description = "Product or category not found")
    )
)]
pub async fn update(
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateProductRequest>,
) -> Result<Json<ProductResponse>, JsonApiError> {
    let updated = state.products.update(id, req.into_update()?).await?;
    Ok(Json(respond_one(&state, updated).await?))
}

#[utoipa::path(
    delete, path = "/v1/products/{id}", tag = "products",
    params(("id" = Uuid, Path, description = "Product id")),
    responses((status = 204, description = "Deleted"), (status = 404, description = "Not Found"))
)]
pub async fn delete(State(state): State<ServerState>, ApiPath(id): ApiPath<Uuid>) -> Result<StatusCode, JsonApiError> {
    state.products.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get, path = "/v1/products/search", tag = "products",
    params(SearchQuery),
    responses((status = 200, description = "Matches", body = ProductPage), (status = 400, description = "Missing keyword"))
)]
pub async fn search(State(state): State<ServerState>, ApiQuery(q): ApiQuery<SearchQuery>) -> Result<Json<ProductPage>, JsonApiError> {
    let keyword = q.keyword.ok_or_else(|| JsonApiError::field("keyword", "Keyword is required"))?;
    let page = state.products.search(&keyword, page_request(q.page, q.size)).await?;
    Ok(Json(respond_page(&state, page).await?))
}

#[utoipa::path(
    get, path = "/v1/products/filter/price", tag = "products",
    params(PriceQuery),
    responses((status = 200, description = "Matches", body = ProductPage), (status = 400, description = "Invalid range"))
)]
pub async fn filter_by_price(State(state): State<ServerState>, ApiQuery(q): ApiQuery<PriceQuery>) -> Result<Json<ProductPage>, JsonApiError> {
    let (min, max) = match (q.min_price, q.max_price) {
        (Some(min), Some(max)) => (min, max),
        (min, _) => {
            let field = if min.is_none() { "minPrice" } else { "maxPrice" };
            return Err(JsonApiError::field(field, format!("{field} is required")));
        }
    };
    let page = state.products.filter_by_price(min, max, page_request(q.page, q.size)).await?;
    Ok(Json(respond_page(&state, page).await?))
}

#[utoipa::path(
    get, path = "/v1/products/category/{categoryId}", tag = "products",
    params(("categoryId" = Uuid, Path, description = "Category id")),
    responses((status = 200, description = "Active products of the category", body = [ProductResponse]), (status = 404, description = "Category not found"))
)]
pub async fn by_category(State(state): State<ServerState>, ApiPath(category_id): ApiPath<Uuid>) -> Result<Json<Vec<ProductResponse>>, JsonApiError> {
    let items = state.products.list_by_category(category_id).await?;
    let names = state.products.category_names(&items).await?;
    Ok(Json(items.into_iter().map(|m| ProductResponse::named(m, &names)).collect()))
}

#[utoipa::path(
    post, path = "/v1/products/{id}/stock/decrease", tag = "products",
    params(("id" = Uuid, Path, description = "Product id")),
    request_body = StockRequest,
    responses((status = 204, description = "Stock decreased"), (status = 400, description = "Insufficient stock"), (status = 404, description = "Not Found"))
)]
pub async fn decrease_stock(
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<StockRequest>,
) -> Result<StatusCode, JsonApiError> {
    state.products.decrease_stock(id, req.quantity()?).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post, path = "/v1/products/{id}/stock/increase", tag = "products",
    params(("id" = Uuid, Path, description = "Product id")),
    request_body = StockRequest,
    responses((status = 204, description = "Stock increased"), (status = 400, description = "Invalid quantity"), (status = 404, description = "Not Found"))
)]
pub async fn increase_stock(
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<StockRequest>,
) -> Result<StatusCode, JsonApiError> {
    state.products.increase_stock(id, req.quantity()?).await?;
    Ok(StatusCode::NO_CONTENT)
}
