use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Router,
};
use rust_decimal::Decimal;
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
    services::supplies::{CreateSupply, SupplyListFilter, SupplyPatch, SupplySearch},
    tenant::TenantId,
};

// Request DTOs

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSupplyRequest {
    #[validate(length(min = 1))]
    pub description: String,
    pub kind: Option<String>,
    pub supplier_id: Option<i64>,
    pub supplier_code: Option<String>,
    pub internal_code: Option<String>,
    pub cost_price: Option<Decimal>,
    pub suggested_price: Option<Decimal>,
    #[validate(range(min = 0))]
    pub min_stock: Option<i32>,
    #[validate(range(min = 0))]
    pub current_stock: Option<i32>,
    #[serde(default = "default_true")]
    pub active: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PatchSupplyRequest {
    #[validate(length(min = 1))]
    pub description: Option<String>,
    pub kind: Option<String>,
    pub supplier_id: Option<i64>,
    pub supplier_code: Option<String>,
    pub internal_code: Option<String>,
    pub cost_price: Option<Decimal>,
    pub suggested_price: Option<Decimal>,
    #[validate(range(min = 0))]
    pub min_stock: Option<i32>,
    #[validate(range(min = 0))]
    pub current_stock: Option<i32>,
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ListSuppliesQuery {
    pub supplier_id: Option<i64>,
    pub active: Option<bool>,
    pub search: Option<String>,
    #[serde(default)]
    pub low_stock: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AdvancedSuppliesQuery {
    pub q: Option<String>,
    pub active: Option<bool>,
    pub supplier_id: Option<i64>,
    pub kind: Option<String>,
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
    "description".to_string()
}

#[derive(Debug, Deserialize, Validate)]
pub struct SelectSuppliesQuery {
    pub supplier_id: Option<i64>,
    pub q: Option<String>,
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 200))]
    pub limit: u64,
}

// Handler functions

/// Create a new supply
async fn create_supply(
    State(state): State<AppState>,
    tenant: TenantId,
    Json(payload): Json<CreateSupplyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let supply = state
        .services
        .supplies
        .create(
            &tenant,
            CreateSupply {
                description: payload.description,
                kind: payload.kind,
                supplier_id: payload.supplier_id,
                supplier_code: payload.supplier_code,
                internal_code: payload.internal_code,
                cost_price: payload.cost_price,
                suggested_price: payload.suggested_price,
                min_stock: payload.min_stock,
                current_stock: payload.current_stock,
                active: payload.active,
            },
        )
        .await
        .map_err(map_service_error)?;

    info!("Supply created: {}", supply.id);
    Ok(created_response(supply))
}

/// List supplies with simple filters (including the low-stock predicate)
async fn list_supplies(
    State(state): State<AppState>,
    tenant: TenantId,
    Query(query): Query<ListSuppliesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let supplies = state
        .services
        .supplies
        .list(
            &tenant,
            SupplyListFilter {
                supplier_id: query.supplier_id,
                active: query.active,
                search: query.search,
                low_stock: query.low_stock,
            },
        )
        .await
        .map_err(map_service_error)?;

    Ok(success_response(supplies))
}

/// Filter, sort and paginate supplies
async fn list_supplies_advanced(
    State(state): State<AppState>,
    tenant: TenantId,
    Query(query): Query<AdvancedSuppliesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&query)?;

    let (limit, offset) = (query.limit, query.offset);
    let (items, total) = state
        .services
        .supplies
        .search(
            &tenant,
            SupplySearch {
                q: query.q,
                active: query.active,
                supplier_id: query.supplier_id,
                kind: query.kind,
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

/// Active supplies for picker widgets
async fn select_supplies(
    State(state): State<AppState>,
    tenant: TenantId,
    Query(query): Query<SelectSuppliesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&query)?;

    let supplies = state
        .services
        .supplies
        .select(&tenant, query.supplier_id, query.q, query.limit)
        .await
        .map_err(map_service_error)?;

    let options: Vec<_> = supplies
        .into_iter()
        .map(|s| {
            json!({
                "id": s.id,
                "label": format!(
                    "{} ({})",
                    s.description,
                    s.internal_code.as_deref().unwrap_or("-")
                ),
                "current_stock": s.current_stock,
                "cost_price": s.cost_price,
                "low_stock": s.is_low_stock(),
            })
        })
        .collect();

    Ok(success_response(options))
}

/// Get a supply by ID
async fn get_supply(
    State(state): State<AppState>,
    tenant: TenantId,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let supply = state
        .services
        .supplies
        .get(&tenant, id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(supply))
}

/// Update a supply's editable fields
async fn update_supply(
    State(state): State<AppState>,
    tenant: TenantId,
    Path(id): Path<i64>,
    Json(payload): Json<PatchSupplyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let supply = state
        .services
        .supplies
        .patch(
            &tenant,
            id,
            SupplyPatch {
                description: payload.description,
                kind: payload.kind,
                supplier_id: payload.supplier_id,
                supplier_code: payload.supplier_code,
                internal_code: payload.internal_code,
                cost_price: payload.cost_price,
                suggested_price: payload.suggested_price,
                min_stock: payload.min_stock,
                current_stock: payload.current_stock,
                active: payload.active,
            },
        )
        .await
        .map_err(map_service_error)?;

    info!("Supply updated: {}", id);
    Ok(success_response(supply))
}

/// Deactivate a supply (never a hard delete)
async fn deactivate_supply(
    State(state): State<AppState>,
    tenant: TenantId,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .supplies
        .deactivate(&tenant, id)
        .await
        .map_err(map_service_error)?;

    info!("Supply deactivated: {}", id);
    Ok(no_content_response())
}

/// Creates the router for supply endpoints
pub fn supply_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_supply))
        .route("/", get(list_supplies))
        .route("/advanced", get(list_supplies_advanced))
        .route("/select", get(select_supplies))
        .route("/:id", get(get_supply))
        .route("/:id", put(update_supply))
        .route("/:id", delete(deactivate_supply))
}
