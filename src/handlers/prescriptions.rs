use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, patch, post},
    Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use validator::Validate;

use super::common::{
    created_response, default_limit, map_service_error, success_response, validate_input, Page,
};
use crate::{
    errors::ApiError,
    handlers::AppState,
    services::prescriptions::{CreatePrescription, PrescriptionPatch, PrescriptionSearch},
    tenant::TenantId,
};

// Request DTOs

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePrescriptionRequest {
    #[validate(range(min = 1))]
    pub client_id: i64,
    pub issued_on: NaiveDate,
    pub professional: Option<String>,
    pub lens_type: Option<String>,
    pub od_sphere: Option<f64>,
    pub od_cylinder: Option<f64>,
    pub od_axis: Option<i32>,
    pub os_sphere: Option<f64>,
    pub os_cylinder: Option<f64>,
    pub os_axis: Option<i32>,
    pub addition: Option<f64>,
    pub pupillary_distance: Option<f64>,
    pub notes: Option<String>,
    pub status: Option<String>,
    pub recorded_on: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PatchPrescriptionRequest {
    #[validate(range(min = 1))]
    pub client_id: Option<i64>,
    pub professional: Option<String>,
    pub lens_type: Option<String>,
    pub od_sphere: Option<f64>,
    pub od_cylinder: Option<f64>,
    pub od_axis: Option<i32>,
    pub os_sphere: Option<f64>,
    pub os_cylinder: Option<f64>,
    pub os_axis: Option<i32>,
    pub addition: Option<f64>,
    pub pupillary_distance: Option<f64>,
    pub notes: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PrescriptionStatusRequest {
    #[validate(length(min = 1))]
    pub status: String,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AdvancedPrescriptionsQuery {
    pub q: Option<String>,
    pub client_id: Option<i64>,
    pub national_id: Option<i64>,
    pub client_active: Option<bool>,
    pub status: Option<String>,
    pub lens_type: Option<String>,
    pub professional: Option<String>,
    pub issued_from: Option<NaiveDate>,
    pub issued_to: Option<NaiveDate>,
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
    "issued_on".to_string()
}

// Handler functions

/// Create a new prescription
async fn create_prescription(
    State(state): State<AppState>,
    tenant: TenantId,
    Json(payload): Json<CreatePrescriptionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let prescription = state
        .services
        .prescriptions
        .create(
            &tenant,
            CreatePrescription {
                client_id: payload.client_id,
                issued_on: payload.issued_on,
                professional: payload.professional,
                lens_type: payload.lens_type,
                od_sphere: payload.od_sphere,
                od_cylinder: payload.od_cylinder,
                od_axis: payload.od_axis,
                os_sphere: payload.os_sphere,
                os_cylinder: payload.os_cylinder,
                os_axis: payload.os_axis,
                addition: payload.addition,
                pupillary_distance: payload.pupillary_distance,
                notes: payload.notes,
                status: payload.status,
                recorded_on: payload.recorded_on,
            },
        )
        .await
        .map_err(map_service_error)?;

    info!("Prescription created: {}", prescription.id);
    Ok(created_response(json!({
        "id": prescription.id,
        "message": "Prescription created successfully"
    })))
}

/// List the tenant's prescriptions, newest first
async fn list_prescriptions(
    State(state): State<AppState>,
    tenant: TenantId,
) -> Result<impl IntoResponse, ApiError> {
    let prescriptions = state
        .services
        .prescriptions
        .list(&tenant)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(prescriptions))
}

/// Filter, sort and paginate prescriptions (joined to their clients)
async fn list_prescriptions_advanced(
    State(state): State<AppState>,
    tenant: TenantId,
    Query(query): Query<AdvancedPrescriptionsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&query)?;

    let (limit, offset) = (query.limit, query.offset);
    let (items, total) = state
        .services
        .prescriptions
        .search(
            &tenant,
            PrescriptionSearch {
                q: query.q,
                client_id: query.client_id,
                national_id: query.national_id,
                client_active: query.client_active,
                status: query.status,
                lens_type: query.lens_type,
                professional: query.professional,
                issued_from: query.issued_from,
                issued_to: query.issued_to,
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

/// Get a prescription by ID
async fn get_prescription(
    State(state): State<AppState>,
    tenant: TenantId,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let prescription = state
        .services
        .prescriptions
        .get(&tenant, id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(prescription))
}

/// Partially update a prescription
async fn patch_prescription(
    State(state): State<AppState>,
    tenant: TenantId,
    Path(id): Path<i64>,
    Json(payload): Json<PatchPrescriptionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let prescription = state
        .services
        .prescriptions
        .patch(
            &tenant,
            id,
            PrescriptionPatch {
                client_id: payload.client_id,
                professional: payload.professional,
                lens_type: payload.lens_type,
                od_sphere: payload.od_sphere,
                od_cylinder: payload.od_cylinder,
                od_axis: payload.od_axis,
                os_sphere: payload.os_sphere,
                os_cylinder: payload.os_cylinder,
                os_axis: payload.os_axis,
                addition: payload.addition,
                pupillary_distance: payload.pupillary_distance,
                notes: payload.notes,
                status: payload.status,
            },
        )
        .await
        .map_err(map_service_error)?;

    Ok(success_response(prescription))
}

/// Update a prescription's status
async fn update_prescription_status(
    State(state): State<AppState>,
    tenant: TenantId,
    Path(id): Path<i64>,
    Json(payload): Json<PrescriptionStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let prescription = state
        .services
        .prescriptions
        .update_status(&tenant, id, &payload.status, payload.notes)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(json!({
        "id": prescription.id,
        "status": prescription.status,
        "notes": prescription.notes,
        "message": "Prescription status updated successfully"
    })))
}

/// Creates the router for prescription endpoints
pub fn prescription_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_prescription))
        .route("/", get(list_prescriptions))
        .route("/advanced", get(list_prescriptions_advanced))
        .route("/:id", get(get_prescription))
        .route("/:id", patch(patch_prescription))
        .route("/:id/status", patch(update_prescription_status))
}
