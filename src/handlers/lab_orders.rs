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
    entities::lab_orders,
    errors::ApiError,
    handlers::AppState,
    services::lab_orders::{
        CreateLabOrder, LabOrderLineInput, LabOrderPatch, LabOrderSearch, ReceiveLabOrder,
    },
    tenant::TenantId,
};

// Request and response DTOs

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct LabOrderLineRequest {
    #[validate(range(min = 1))]
    pub supply_id: i64,
    #[validate(range(min = 1))]
    pub quantity: i32,
    pub unit_price: Decimal,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateLabOrderRequest {
    #[validate(range(min = 1))]
    pub prescription_id: i64,
    #[validate(range(min = 1))]
    pub supplier_id: i64,
    pub sent_on: Option<NaiveDate>,
    pub expected_on: Option<NaiveDate>,
    pub received_on: Option<NaiveDate>,
    pub status: Option<String>,
    pub lab_order_number: Option<String>,
    pub notes: Option<String>,
    #[validate(length(min = 1))]
    pub lines: Vec<LabOrderLineRequest>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PatchLabOrderRequest {
    pub status: Option<String>,
    pub lab_order_number: Option<String>,
    pub expected_on: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LabOrderStatusRequest {
    #[validate(length(min = 1))]
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct ReceiveLabOrderRequest {
    pub received_on: Option<NaiveDate>,
    pub status: Option<String>,
    pub lab_order_number: Option<String>,
    pub notes: Option<String>,
    #[serde(default = "default_true")]
    pub deduct_stock: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AdvancedLabOrdersQuery {
    pub q: Option<String>,
    pub supplier_id: Option<i64>,
    pub prescription_id: Option<i64>,
    pub status: Option<String>,
    pub sent_from: Option<NaiveDate>,
    pub sent_to: Option<NaiveDate>,
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
    "sent_on".to_string()
}

#[derive(Debug, Serialize)]
pub struct LabOrderSummaryResponse {
    #[serde(flatten)]
    pub order: lab_orders::Model,
    pub line_count: usize,
}

#[derive(Debug, Serialize)]
pub struct LabOrderLineResponse {
    pub id: i64,
    pub supply_id: i64,
    pub supply_description: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LabOrderDetailResponse {
    #[serde(flatten)]
    pub order: lab_orders::Model,
    pub supplier: Option<serde_json::Value>,
    pub prescription: Option<serde_json::Value>,
    pub lines: Vec<LabOrderLineResponse>,
}

// Handler functions

/// Create a lab order (header + lines); no stock moves until receipt
async fn create_lab_order(
    State(state): State<AppState>,
    tenant: TenantId,
    Json(payload): Json<CreateLabOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let created = state
        .services
        .lab_orders
        .create(
            &tenant,
            CreateLabOrder {
                prescription_id: payload.prescription_id,
                supplier_id: payload.supplier_id,
                sent_on: payload.sent_on,
                expected_on: payload.expected_on,
                received_on: payload.received_on,
                status: payload.status,
                lab_order_number: payload.lab_order_number,
                notes: payload.notes,
                lines: payload
                    .lines
                    .into_iter()
                    .map(|line| LabOrderLineInput {
                        supply_id: line.supply_id,
                        quantity: line.quantity,
                        unit_price: line.unit_price,
                        notes: line.notes,
                    })
                    .collect(),
            },
        )
        .await
        .map_err(map_service_error)?;

    info!("Lab order created: {}", created.id);
    Ok(created_response(json!({
        "id": created.id,
        "prescription_id": created.prescription_id,
        "supplier_id": created.supplier_id,
        "status": created.status,
        "line_count": created.line_count,
    })))
}

/// List lab orders with line counts, newest first
async fn list_lab_orders(
    State(state): State<AppState>,
    tenant: TenantId,
) -> Result<impl IntoResponse, ApiError> {
    let orders = state
        .services
        .lab_orders
        .list(&tenant)
        .await
        .map_err(map_service_error)?;

    let items: Vec<_> = orders
        .into_iter()
        .map(|(order, lines)| LabOrderSummaryResponse {
            order,
            line_count: lines.len(),
        })
        .collect();

    Ok(success_response(items))
}

/// Filter, sort and paginate lab orders
async fn list_lab_orders_advanced(
    State(state): State<AppState>,
    tenant: TenantId,
    Query(query): Query<AdvancedLabOrdersQuery>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&query)?;

    let (limit, offset) = (query.limit, query.offset);
    let (items, total) = state
        .services
        .lab_orders
        .search(
            &tenant,
            LabOrderSearch {
                q: query.q,
                supplier_id: query.supplier_id,
                prescription_id: query.prescription_id,
                status: query.status,
                sent_from: query.sent_from,
                sent_to: query.sent_to,
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

/// Get a lab order with supplier/prescription summaries and its lines
async fn get_lab_order(
    State(state): State<AppState>,
    tenant: TenantId,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = state
        .services
        .lab_orders
        .get_with_lines(&tenant, id)
        .await
        .map_err(map_service_error)?;

    let supplier = detail
        .supplier
        .map(|s| json!({ "id": s.id, "name": s.name }));
    let prescription = detail
        .prescription
        .map(|p| json!({ "id": p.id, "client_id": p.client_id }));

    let lines = detail
        .lines
        .into_iter()
        .map(|line| LabOrderLineResponse {
            id: line.line.id,
            supply_id: line.line.supply_id,
            supply_description: line.supply_description,
            quantity: line.line.quantity,
            unit_price: line.line.unit_price,
            notes: line.line.notes,
        })
        .collect();

    Ok(success_response(LabOrderDetailResponse {
        order: detail.order,
        supplier,
        prescription,
        lines,
    }))
}

/// Patch header fields; embedded status changes honor the terminal guard
async fn patch_lab_order(
    State(state): State<AppState>,
    tenant: TenantId,
    Path(id): Path<i64>,
    Json(payload): Json<PatchLabOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let order = state
        .services
        .lab_orders
        .patch(
            &tenant,
            id,
            LabOrderPatch {
                status: payload.status,
                lab_order_number: payload.lab_order_number,
                expected_on: payload.expected_on,
                notes: payload.notes,
            },
        )
        .await
        .map_err(map_service_error)?;

    Ok(success_response(order))
}

/// Update a lab order's status (RECEIVED is terminal)
async fn update_lab_order_status(
    State(state): State<AppState>,
    tenant: TenantId,
    Path(id): Path<i64>,
    Json(payload): Json<LabOrderStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let order = state
        .services
        .lab_orders
        .update_status(&tenant, id, &payload.status)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(json!({
        "id": order.id,
        "status": order.status,
    })))
}

/// Receive a lab order exactly once, deducting stock unless told otherwise
async fn receive_lab_order(
    State(state): State<AppState>,
    tenant: TenantId,
    Path(id): Path<i64>,
    Json(payload): Json<ReceiveLabOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let receipt = state
        .services
        .lab_orders
        .receive(
            &tenant,
            id,
            ReceiveLabOrder {
                received_on: payload.received_on,
                status: payload.status,
                lab_order_number: payload.lab_order_number,
                notes: payload.notes,
                deduct_stock: payload.deduct_stock,
            },
        )
        .await
        .map_err(map_service_error)?;

    info!("Lab order received: {}", id);
    Ok(success_response(json!({
        "id": receipt.id,
        "received_on": receipt.received_on,
        "status": receipt.status,
        "stock_deducted": receipt.stock_deducted,
        "message": "Lab order received successfully"
    })))
}

/// Creates the router for lab order endpoints
pub fn lab_order_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_lab_order))
        .route("/", get(list_lab_orders))
        .route("/advanced", get(list_lab_orders_advanced))
        .route("/:id", get(get_lab_order))
        .route("/:id", patch(patch_lab_order))
        .route("/:id/status", patch(update_lab_order_status))
        .route("/:id/receive", patch(receive_lab_order))
}
