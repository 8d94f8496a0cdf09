mod common;

use common::*;
use optica_api::{
    errors::ServiceError,
    services::clients::{ClientPatch, CreateClient},
    services::prescriptions::PrescriptionPatch,
    services::suppliers::CreateSupplier,
    services::supplies::{SupplyListFilter, SupplyPatch},
};

#[tokio::test]
async fn national_id_is_unique_per_tenant_only() {
    let services = test_services().await;
    let a = tenant("optica-a");
    let b = tenant("optica-b");

    seed_client(&services, &a, "Perez", 11222333).await;

    // Same tenant: conflict.
    let err = services
        .clients
        .create(
            &a,
            CreateClient {
                first_name: "Otro".to_string(),
                last_name: "Perez".to_string(),
                national_id: 11222333,
                birth_date: None,
                phone: None,
                email: None,
                address: None,
                notes: None,
                active: true,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));

    // Another tenant: same national id is fine.
    seed_client(&services, &b, "Perez", 11222333).await;
}

#[tokio::test]
async fn changing_national_id_checks_uniqueness() {
    let services = test_services().await;
    let t = tenant("optica-a");

    let first = seed_client(&services, &t, "Perez", 11111111).await;
    seed_client(&services, &t, "Gomez", 22222222).await;

    let err = services
        .clients
        .patch(
            &t,
            first,
            ClientPatch {
                national_id: Some(22222222),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));

    // Re-submitting the client's own national id is not a conflict.
    services
        .clients
        .patch(
            &t,
            first,
            ClientPatch {
                national_id: Some(11111111),
                phone: Some("555-0101".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn client_deletion_is_a_soft_deactivation() {
    let services = test_services().await;
    let t = tenant("optica-a");

    let client_id = seed_client(&services, &t, "Perez", 11222333).await;
    let prescription_id = seed_prescription(&services, &t, client_id).await;

    services.clients.deactivate(&t, client_id).await.unwrap();

    // Still readable, just inactive; the prescription keeps its reference.
    let client = services.clients.get(&t, client_id).await.unwrap();
    assert!(!client.active);
    let prescription = services.prescriptions.get(&t, prescription_id).await.unwrap();
    assert_eq!(prescription.client_id, client_id);

    // Registration date was stamped server-side at creation.
    assert!(client.registered_on.is_some());
}

#[tokio::test]
async fn supplier_name_uniqueness_maps_to_conflict() {
    let services = test_services().await;
    let t = tenant("optica-a");

    seed_supplier(&services, &t, "Laboratorio Sur").await;

    let err = services
        .suppliers
        .create(
            &t,
            CreateSupplier {
                name: "Laboratorio Sur".to_string(),
                phone: None,
                email: None,
                address: None,
                active: true,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)), "got {err:?}");

    // Same name under another tenant is allowed.
    seed_supplier(&services, &tenant("optica-b"), "Laboratorio Sur").await;
}

#[tokio::test]
async fn low_stock_filter_requires_both_thresholds() {
    let services = test_services().await;
    let t = tenant("optica-a");

    let low = seed_supply(&services, &t, "Low item", Some(2)).await;
    let fine = seed_supply(&services, &t, "Fine item", Some(9)).await;
    let untracked = seed_supply(&services, &t, "Untracked item", None).await;

    for (id, min_stock) in [(low, 5), (fine, 5)] {
        services
            .supplies
            .patch(
                &t,
                id,
                SupplyPatch {
                    min_stock: Some(min_stock),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
    }

    let listed = services
        .supplies
        .list(
            &t,
            SupplyListFilter {
                low_stock: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let ids: Vec<i64> = listed.iter().map(|s| s.id).collect();
    assert!(ids.contains(&low));
    assert!(!ids.contains(&fine));
    assert!(!ids.contains(&untracked));
}

#[tokio::test]
async fn supply_patch_rejects_negative_stock() {
    let services = test_services().await;
    let t = tenant("optica-a");
    let supply_id = seed_supply(&services, &t, "Lens blank", Some(3)).await;

    let err = services
        .supplies
        .patch(
            &t,
            supply_id,
            SupplyPatch {
                current_stock: Some(-1),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn prescription_status_is_enforced_everywhere_it_is_written() {
    let services = test_services().await;
    let t = tenant("optica-a");
    let client_id = seed_client(&services, &t, "Perez", 11222333).await;
    let prescription_id = seed_prescription(&services, &t, client_id).await;

    // Default on create.
    let prescription = services.prescriptions.get(&t, prescription_id).await.unwrap();
    assert_eq!(prescription.status.as_deref(), Some("ACTIVE"));

    // Dedicated endpoint: normalized then validated.
    let updated = services
        .prescriptions
        .update_status(&t, prescription_id, " in_lab ", None)
        .await
        .unwrap();
    assert_eq!(updated.status.as_deref(), Some("IN_LAB"));

    let err = services
        .prescriptions
        .update_status(&t, prescription_id, "EXPIRED", None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidStatus(_)));

    // Generic patch: same validation.
    let err = services
        .prescriptions
        .patch(
            &t,
            prescription_id,
            PrescriptionPatch {
                status: Some("EXPIRED".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidStatus(_)));
}
