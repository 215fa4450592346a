use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use common::types::Health;

use crate::errors::attach_error_path;
use crate::openapi;
use crate::state::ServerState;

pub mod auth;
pub mod categories;
pub mod products;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK")))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Build the full application router: public, catalog and docs routes
/// behind the bearer-token check.
pub fn build_router(state: ServerState, cors: CorsLayer) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/api-docs/openapi.json", get(openapi::openapi_json))
        .route("/v1/auth/login", post(auth::login))
        .route("/v1/credentials", get(auth::credentials));

    let categories = Router::new()
        .route("/v1/categories", get(categories::list).post(categories::create))
        .route(
            "/v1/categories/:id",
            get(categories::get).put(categories::update).delete(categories::delete),
        );

    let products = Router::new()
        .route("/v1/products", get(products::list).post(products::create))
        .route("/v1/products/search", get(products::search))
        .route("/v1/products/filter/price", get(products::filter_by_price))
        .route("/v1/products/category/:category_id", get(products::by_category))
        .route(
            "/v1/products/:id",
            get(products::get).put(products::update).delete(products::delete),
        )
        .route("/v1/products/:id/stock/decrease", post(products::decrease_stock))
        .route("/v1/products/:id/stock/increase", post(products::increase_stock));

    public
        .merge(categories)
        .merge(products)
        .layer(middleware::from_fn_with_state(state.clone(), auth::require_bearer_token))
        .layer(middleware::from_fn(attach_error_path))
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                // 每次请求创建 span，包含方法和路径等，日志级别为 INFO
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                // 响应返回时打点，包含状态码与耗时
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                // 失败（5xx 等）时以 ERROR 记录
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
