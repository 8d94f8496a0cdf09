use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use validator::Validate;

use super::common::{
    created_response, default_limit, default_true, map_service_error, no_content_response,
    success_response, validate_input, Page,
};
use crate::{
    errors::ApiError,
    handlers::AppState,
    services::suppliers::{CreateSupplier, SupplierSearch, UpdateSupplier},
    tenant::TenantId,
};

// Request DTOs

#[derive(Debug, Deserialize, Validate)]
pub struct SupplierRequest {
    #[validate(length(min = 1, max = 191))]
    pub name: String,
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub address: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
}

#[derive(Debug, Deserialize)]
pub struct ListSuppliersQuery {
    pub active: Option<bool>,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AdvancedSuppliersQuery {
    pub q: Option<String>,
    pub active: Option<bool>,
    #[serde(default = "default_order_by")]
    pub order_by: String,
    #[serde(default = "super::common::default_asc")]
    pub order_dir: String,
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 200))]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

fn default_order_by() -> String {
    "name".to_string()
}

#[derive(Debug, Deserialize, Validate)]
pub struct SelectSuppliersQuery {
    pub q: Option<String>,
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 200))]
    pub limit: u64,
}

// Handler functions

/// Create a new supplier
async fn create_supplier(
    State(state): State<AppState>,
    tenant: TenantId,
    Json(payload): Json<SupplierRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let supplier = state
        .services
        .suppliers
        .create(
            &tenant,
            CreateSupplier {
                name: payload.name,
                phone: payload.phone,
                email: payload.email,
                address: payload.address,
                active: payload.active,
            },
        )
        .await
        .map_err(map_service_error)?;

    info!("Supplier created: {}", supplier.id);
    Ok(created_response(supplier))
}

/// List suppliers
async fn list_suppliers(
    State(state): State<AppState>,
    tenant: TenantId,
    Query(query): Query<ListSuppliersQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let suppliers = state
        .services
        .suppliers
        .list(&tenant, query.active, query.name)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(suppliers))
}

/// Filter, sort and paginate suppliers
async fn list_suppliers_advanced(
    State(state): State<AppState>,
    tenant: TenantId,
    Query(query): Query<AdvancedSuppliersQuery>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&query)?;

    let (limit, offset) = (query.limit, query.offset);
    let (items, total) = state
        .services
        .suppliers
        .search(
            &tenant,
            SupplierSearch {
                q: query.q,
                active: query.active,
                order_by: query.order_by,
                order_dir: query.order_dir,
                limit,
                offset,
            },
        )
        .await
        .map_err(map_service_error)?;

    Ok(success_response(Page::new(total, limit, offset, items)))
}

/// Active suppliers for picker widgets
async fn select_suppliers(
    State(state): State<AppState>,
    tenant: TenantId,
    Query(query): Query<SelectSuppliersQuery>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&query)?;

    let suppliers = state
        .services
        .suppliers
        .select(&tenant, query.q, query.limit)
        .await
        .map_err(map_service_error)?;

    let options: Vec<_> = suppliers
        .into_iter()
        .map(|s| json!({ "id": s.id, "label": s.name }))
        .collect();

    Ok(success_response(options))
}

/// Get a supplier by ID
async fn get_supplier(
    State(state): State<AppState>,
    tenant: TenantId,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let supplier = state
        .services
        .suppliers
        .get(&tenant, id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(supplier))
}

/// Replace a supplier's editable fields
async fn update_supplier(
    State(state): State<AppState>,
    tenant: TenantId,
    Path(id): Path<i64>,
    Json(payload): Json<SupplierRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let supplier = state
        .services
        .suppliers
        .update(
            &tenant,
            id,
            UpdateSupplier {
                name: payload.name,
                phone: payload.phone,
                email: payload.email,
                address: payload.address,
                active: payload.active,
            },
        )
        .await
        .map_err(map_service_error)?;

    info!("Supplier updated: {}", id);
    Ok(success_response(supplier))
}

/// Deactivate a supplier (never a hard delete)
async fn deactivate_supplier(
    State(state): State<AppState>,
    tenant: TenantId,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .suppliers
        .deactivate(&tenant, id)
        .await
        .map_err(map_service_error)?;

    info!("Supplier deactivated: {}", id);
    Ok(no_content_response())
}

/// Creates the router for supplier endpoints
pub fn supplier_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_supplier))
        .route("/", get(list_suppliers))
        .route("/advanced", get(list_suppliers_advanced))
        .route("/select", get(select_suppliers))
        .route("/:id", get(get_supplier))
        .route("/:id", put(update_supplier))
        .route("/:id", delete(deactivate_supplier))
}
