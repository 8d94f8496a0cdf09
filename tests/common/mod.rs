//! Shared harness for integration tests: an in-memory SQLite store with all
//! migrations applied, plus seed helpers for the entities most tests need.
#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;
use optica_api::{
    db,
    handlers::AppServices,
    services::{
        clients::CreateClient,
        prescriptions::CreatePrescription,
        suppliers::CreateSupplier,
        supplies::CreateSupply,
    },
    tenant::TenantId,
};

/// Fresh services over a fresh in-memory database.
pub async fn test_services() -> AppServices {
    let pool = db::establish_connection("sqlite::memory:")
        .await
        .expect("db connect");
    db::run_migrations(&pool).await.expect("migrations");
    AppServices::new(Arc::new(pool))
}

pub fn tenant(id: &str) -> TenantId {
    TenantId::new(id)
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub async fn seed_supplier(services: &AppServices, tenant: &TenantId, name: &str) -> i64 {
    services
        .suppliers
        .create(
            tenant,
            CreateSupplier {
                name: name.to_string(),
                phone: None,
                email: None,
                address: None,
                active: true,
            },
        )
        .await
        .expect("seed supplier")
        .id
}

pub async fn seed_supply(
    services: &AppServices,
    tenant: &TenantId,
    description: &str,
    current_stock: Option<i32>,
) -> i64 {
    services
        .supplies
        .create(
            tenant,
            CreateSupply {
                description: description.to_string(),
                kind: None,
                supplier_id: None,
                supplier_code: None,
                internal_code: None,
                cost_price: None,
                suggested_price: None,
                min_stock: None,
                current_stock,
                active: true,
            },
        )
        .await
        .expect("seed supply")
        .id
}

pub async fn seed_client(
    services: &AppServices,
    tenant: &TenantId,
    last_name: &str,
    national_id: i64,
) -> i64 {
    services
        .clients
        .create(
            tenant,
            CreateClient {
                first_name: "Ana".to_string(),
                last_name: last_name.to_string(),
                national_id,
                birth_date: None,
                phone: None,
                email: None,
                address: None,
                notes: None,
                active: true,
            },
        )
        .await
        .expect("seed client")
        .id
}

pub async fn seed_prescription(
    services: &AppServices,
    tenant: &TenantId,
    client_id: i64,
) -> i64 {
    services
        .prescriptions
        .create(
            tenant,
            CreatePrescription {
                client_id,
                issued_on: date(2024, 3, 1),
                professional: None,
                lens_type: None,
                od_sphere: Some(-1.25),
                od_cylinder: None,
                od_axis: None,
                os_sphere: Some(-1.5),
                os_cylinder: None,
                os_axis: None,
                addition: None,
                pupillary_distance: None,
                notes: None,
                status: None,
                recorded_on: None,
            },
        )
        .await
        .expect("seed prescription")
        .id
}
