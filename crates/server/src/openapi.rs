use axum::Json;
use utoipa::OpenApi;

use crate::routes::{auth, categories, products};

#[derive(OpenApi)]
#[openapi(
    info(title = "Catalog API", description = "Product and category management"),
    paths(
        crate::routes::health,
        auth::login,
        auth::credentials,
        categories::list,
        categories::get,
        categories::create,
        categories::update,
        categories::delete,
        products::list,
        products::get,
        products::create,
        products::update,
        products::delete,
        products::search,
        products::filter_by_price,
        products::by_category,
        products::decrease_stock,
        products::increase_stock,
    ),
    components(
        schemas(
            auth::LoginRequest,
            auth::LoginResponse,
            auth::UserInfo,
            auth::CredentialInfo,
            auth::CredentialsResponse,
            categories::CategoryRequest,
            categories::CategoryResponse,
            products::CreateProductRequest,
            products::UpdateProductRequest,
            products::ProductResponse,
            products::ProductPage,
            products::StockRequest,
        )
    ),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "categories"),
        (name = "products")
    )
)]
pub struct ApiDoc;

/// Serve the generated document as JSON.
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
