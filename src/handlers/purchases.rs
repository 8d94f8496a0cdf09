use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, patch, post},
    Router,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use validator::Validate;

use super::common::{
    created_response, default_limit, default_true, map_service_error, success_response,
    validate_input, Page,
};
use crate::{
    entities::purchases,
    errors::ApiError,
    handlers::AppState,
    services::purchases::{
        CreatePurchase, PurchaseHeaderPatch, PurchaseLineInput, PurchaseSearch,
    },
    tenant::TenantId,
};

// Request and response DTOs

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct PurchaseLineRequest {
    #[validate(range(min = 1))]
    pub supply_id: i64,
    #[validate(range(min = 1))]
    pub quantity: i32,
    pub unit_price: Decimal,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePurchaseRequest {
    #[validate(range(min = 1))]
    pub supplier_id: i64,
    pub purchase_date: NaiveDate,
    pub voucher_kind: Option<String>,
    pub voucher_number: Option<String>,
    pub notes: Option<String>,
    #[validate(length(min = 1))]
    pub lines: Vec<PurchaseLineRequest>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PatchPurchaseRequest {
    pub purchase_date: Option<NaiveDate>,
    pub voucher_kind: Option<String>,
    pub voucher_number: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VoidPurchaseRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListPurchasesQuery {
    #[serde(default = "default_true")]
    pub include_voided: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AdvancedPurchasesQuery {
    pub q: Option<String>,
    pub supplier_id: Option<i64>,
    pub voided: Option<bool>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    #[serde(default = "default_order_by")]
    pub order_by: String,
    #[serde(default = "super::common::default_desc")]
    pub order_dir: String,
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 200))]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

fn default_order_by() -> String {
    "purchase_date".to_string()
}

#[derive(Debug, Serialize)]
pub struct PurchaseLineResponse {
    pub id: i64,
    pub supply_id: i64,
    pub supply_description: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

#[derive(Debug, Serialize)]
pub struct PurchaseDetailResponse {
    #[serde(flatten)]
    pub purchase: purchases::Model,
    pub lines: Vec<PurchaseLineResponse>,
}

// Handler functions

/// Create a purchase (header + lines); stock increases atomically
async fn create_purchase(
    State(state): State<AppState>,
    tenant: TenantId,
    Json(payload): Json<CreatePurchaseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let created = state
        .services
        .purchases
        .create(
            &tenant,
            CreatePurchase {
                supplier_id: payload.supplier_id,
                purchase_date: payload.purchase_date,
                voucher_kind: payload.voucher_kind,
                voucher_number: payload.voucher_number,
                notes: payload.notes,
                lines: payload
                    .lines
                    .into_iter()
                    .map(|line| PurchaseLineInput {
                        supply_id: line.supply_id,
                        quantity: line.quantity,
                        unit_price: line.unit_price,
                    })
                    .collect(),
            },
        )
        .await
        .map_err(map_service_error)?;

    info!("Purchase created: {}", created.id);
    Ok(created_response(json!({
        "id": created.id,
        "total_amount": created.total_amount,
        "line_count": created.line_count,
    })))
}

/// List purchases, newest first
async fn list_purchases(
    State(state): State<AppState>,
    tenant: TenantId,
    Query(query): Query<ListPurchasesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let purchases = state
        .services
        .purchases
        .list(&tenant, query.include_voided)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(purchases))
}

/// Filter, sort and paginate purchases
async fn list_purchases_advanced(
    State(state): State<AppState>,
    tenant: TenantId,
    Query(query): Query<AdvancedPurchasesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&query)?;

    let (limit, offset) = (query.limit, query.offset);
    let (items, total) = state
        .services
        .purchases
        .search(
            &tenant,
            PurchaseSearch {
                q: query.q,
                supplier_id: query.supplier_id,
                voided: query.voided,
                date_from: query.date_from,
                date_to: query.date_to,
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

/// Get a purchase with its lines
async fn get_purchase(
    State(state): State<AppState>,
    tenant: TenantId,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = state
        .services
        .purchases
        .get_with_lines(&tenant, id)
        .await
        .map_err(map_service_error)?;

    let lines = detail
        .lines
        .into_iter()
        .map(|line| PurchaseLineResponse {
            id: line.line.id,
            supply_id: line.line.supply_id,
            supply_description: line.supply_description,
            quantity: line.line.quantity,
            unit_price: line.line.unit_price,
            subtotal: line.line.subtotal,
        })
        .collect();

    Ok(success_response(PurchaseDetailResponse {
        purchase: detail.purchase,
        lines,
    }))
}

/// Patch header fields of a non-voided purchase
async fn patch_purchase(
    State(state): State<AppState>,
    tenant: TenantId,
    Path(id): Path<i64>,
    Json(payload): Json<PatchPurchaseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let purchase = state
        .services
        .purchases
        .patch_header(
            &tenant,
            id,
            PurchaseHeaderPatch {
                purchase_date: payload.purchase_date,
                voucher_kind: payload.voucher_kind,
                voucher_number: payload.voucher_number,
                notes: payload.notes,
            },
        )
        .await
        .map_err(map_service_error)?;

    Ok(success_response(purchase))
}

/// Void a purchase, reversing its stock effect
async fn void_purchase(
    State(state): State<AppState>,
    tenant: TenantId,
    Path(id): Path<i64>,
    Json(payload): Json<VoidPurchaseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let purchase = state
        .services
        .purchases
        .void(&tenant, id, payload.reason)
        .await
        .map_err(map_service_error)?;

    info!("Purchase voided: {}", id);
    Ok(success_response(json!({
        "id": purchase.id,
        "voided": purchase.voided,
        "message": "Purchase voided successfully"
    })))
}

/// Creates the router for purchase endpoints
pub fn purchase_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_purchase))
        .route("/", get(list_purchases))
        .route("/advanced", get(list_purchases_advanced))
        .route("/:id", get(get_purchase))
        .route("/:id", patch(patch_purchase))
        .route("/:id/void", patch(void_purchase))
}
