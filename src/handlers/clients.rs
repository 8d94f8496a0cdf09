use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{delete, get, patch, post},
    Router,
};
use chrono::NaiveDate;
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
    services::clients::{ClientListFilter, ClientPatch, ClientSearch, CreateClient},
    tenant::TenantId,
};

// Request DTOs

#[derive(Debug, Deserialize, Validate)]
pub struct CreateClientRequest {
    #[validate(length(min = 1))]
    pub first_name: String,
    #[validate(length(min = 1))]
    pub last_name: String,
    #[validate(range(min = 1))]
    pub national_id: i64,
    pub birth_date: Option<NaiveDate>,
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PatchClientRequest {
    #[validate(length(min = 1))]
    pub first_name: Option<String>,
    #[validate(length(min = 1))]
    pub last_name: Option<String>,
    #[validate(range(min = 1))]
    pub national_id: Option<i64>,
    pub birth_date: Option<NaiveDate>,
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ListClientsQuery {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub national_id: Option<i64>,
    pub active: Option<bool>,
    pub registered_from: Option<NaiveDate>,
    pub registered_to: Option<NaiveDate>,
    #[serde(default)]
    pub offset: u64,
    #[serde(default = "default_list_limit")]
    #[validate(range(min = 1, max = 500))]
    pub limit: u64,
}

fn default_list_limit() -> u64 {
    100
}

#[derive(Debug, Deserialize, Validate)]
pub struct AdvancedClientsQuery {
    pub q: Option<String>,
    pub national_id: Option<i64>,
    pub active: Option<bool>,
    pub registered_from: Option<NaiveDate>,
    pub registered_to: Option<NaiveDate>,
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
    "last_name".to_string()
}

#[derive(Debug, Deserialize, Validate)]
pub struct SelectClientsQuery {
    pub q: Option<String>,
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 200))]
    pub limit: u64,
}

// Handler functions

/// Create a new client
async fn create_client(
    State(state): State<AppState>,
    tenant: TenantId,
    Json(payload): Json<CreateClientRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let client = state
        .services
        .clients
        .create(
            &tenant,
            CreateClient {
                first_name: payload.first_name,
                last_name: payload.last_name,
                national_id: payload.national_id,
                birth_date: payload.birth_date,
                phone: payload.phone,
                email: payload.email,
                address: payload.address,
                notes: payload.notes,
                active: payload.active,
            },
        )
        .await
        .map_err(map_service_error)?;

    info!("Client created: {}", client.id);
    Ok(created_response(client))
}

/// List clients with simple filters
async fn list_clients(
    State(state): State<AppState>,
    tenant: TenantId,
    Query(query): Query<ListClientsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&query)?;

    let clients = state
        .services
        .clients
        .list(
            &tenant,
            ClientListFilter {
                first_name: query.first_name,
                last_name: query.last_name,
                national_id: query.national_id,
                active: query.active,
                registered_from: query.registered_from,
                registered_to: query.registered_to,
                offset: query.offset,
                limit: query.limit,
            },
        )
        .await
        .map_err(map_service_error)?;

    Ok(success_response(clients))
}

/// Filter, sort and paginate clients
async fn list_clients_advanced(
    State(state): State<AppState>,
    tenant: TenantId,
    Query(query): Query<AdvancedClientsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&query)?;

    let (limit, offset) = (query.limit, query.offset);
    let (items, total) = state
        .services
        .clients
        .search(
            &tenant,
            ClientSearch {
                q: query.q,
                national_id: query.national_id,
                active: query.active,
                registered_from: query.registered_from,
                registered_to: query.registered_to,
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

/// Active clients for picker widgets
async fn select_clients(
    State(state): State<AppState>,
    tenant: TenantId,
    Query(query): Query<SelectClientsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&query)?;

    let clients = state
        .services
        .clients
        .select(&tenant, query.q, query.limit)
        .await
        .map_err(map_service_error)?;

    let options: Vec<_> = clients
        .into_iter()
        .map(|c| {
            json!({
                "id": c.id,
                "label": format!("{}, {} (ID {})", c.last_name, c.first_name, c.national_id),
                "national_id": c.national_id,
            })
        })
        .collect();

    Ok(success_response(options))
}

/// Get a client by ID
async fn get_client(
    State(state): State<AppState>,
    tenant: TenantId,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let client = state
        .services
        .clients
        .get(&tenant, id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(client))
}

/// Partially update a client
async fn patch_client(
    State(state): State<AppState>,
    tenant: TenantId,
    Path(id): Path<i64>,
    Json(payload): Json<PatchClientRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let client = state
        .services
        .clients
        .patch(
            &tenant,
            id,
            ClientPatch {
                first_name: payload.first_name,
                last_name: payload.last_name,
                national_id: payload.national_id,
                birth_date: payload.birth_date,
                phone: payload.phone,
                email: payload.email,
                address: payload.address,
                notes: payload.notes,
                active: payload.active,
            },
        )
        .await
        .map_err(map_service_error)?;

    Ok(success_response(client))
}

/// Deactivate a client (never a hard delete)
async fn deactivate_client(
    State(state): State<AppState>,
    tenant: TenantId,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .clients
        .deactivate(&tenant, id)
        .await
        .map_err(map_service_error)?;

    info!("Client deactivated: {}", id);
    Ok(no_content_response())
}

/// Creates the router for client endpoints
pub fn client_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_client))
        .route("/", get(list_clients))
        .route("/advanced", get(list_clients_advanced))
        .route("/select", get(select_clients))
        .route("/:id", get(get_client))
        .route("/:id", patch(patch_client))
        .route("/:id", delete(deactivate_client))
}
