mod common;

use common::*;
use optica_api::{
    errors::ServiceError,
    services::lab_orders::{CreateLabOrder, LabOrderLineInput},
    services::purchases::{CreatePurchase, PurchaseLineInput},
};
use rust_decimal_macros::dec;

#[tokio::test]
async fn foreign_tenant_ids_behave_like_missing_ids() {
    let services = test_services().await;
    let a = tenant("optica-a");
    let b = tenant("optica-b");

    let client_id = seed_client(&services, &a, "Lopez", 20333444).await;
    let supplier_id = seed_supplier(&services, &a, "Laboratorio Sur").await;
    let supply_id = seed_supply(&services, &a, "Lens blank", Some(5)).await;
    let prescription_id = seed_prescription(&services, &a, client_id).await;

    assert!(matches!(
        services.clients.get(&b, client_id).await.unwrap_err(),
        ServiceError::NotFound(_)
    ));
    assert!(matches!(
        services.suppliers.get(&b, supplier_id).await.unwrap_err(),
        ServiceError::NotFound(_)
    ));
    assert!(matches!(
        services.supplies.get(&b, supply_id).await.unwrap_err(),
        ServiceError::NotFound(_)
    ));
    assert!(matches!(
        services
            .prescriptions
            .get(&b, prescription_id)
            .await
            .unwrap_err(),
        ServiceError::NotFound(_)
    ));
}

#[tokio::test]
async fn purchase_cannot_reference_another_tenants_entities() {
    let services = test_services().await;
    let a = tenant("optica-a");
    let b = tenant("optica-b");

    let foreign_supplier = seed_supplier(&services, &a, "Laboratorio Sur").await;
    let foreign_supply = seed_supply(&services, &a, "Lens blank", Some(5)).await;
    let own_supplier = seed_supplier(&services, &b, "Proveedor Propio").await;

    // Supplier from another tenant: rejected as a validation error, not a
    // leak of its existence.
    let err = services
        .purchases
        .create(
            &b,
            CreatePurchase {
                supplier_id: foreign_supplier,
                purchase_date: date(2024, 6, 1),
                voucher_kind: None,
                voucher_number: None,
                notes: None,
                lines: vec![PurchaseLineInput {
                    supply_id: foreign_supply,
                    quantity: 1,
                    unit_price: dec!(1.0),
                }],
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));

    // Own supplier but a foreign supply line: also rejected, and the
    // foreign supply's stock is untouched.
    let err = services
        .purchases
        .create(
            &b,
            CreatePurchase {
                supplier_id: own_supplier,
                purchase_date: date(2024, 6, 1),
                voucher_kind: None,
                voucher_number: None,
                notes: None,
                lines: vec![PurchaseLineInput {
                    supply_id: foreign_supply,
                    quantity: 1,
                    unit_price: dec!(1.0),
                }],
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));

    assert_eq!(
        services
            .supplies
            .get(&a, foreign_supply)
            .await
            .unwrap()
            .current_stock,
        Some(5)
    );
}

#[tokio::test]
async fn lab_order_cannot_reference_a_foreign_prescription() {
    let services = test_services().await;
    let a = tenant("optica-a");
    let b = tenant("optica-b");

    let client_id = seed_client(&services, &a, "Lopez", 20333444).await;
    let foreign_prescription = seed_prescription(&services, &a, client_id).await;
    let own_supplier = seed_supplier(&services, &b, "Laboratorio Propio").await;
    let own_supply = seed_supply(&services, &b, "Lens blank", Some(5)).await;

    let err = services
        .lab_orders
        .create(
            &b,
            CreateLabOrder {
                prescription_id: foreign_prescription,
                supplier_id: own_supplier,
                sent_on: None,
                expected_on: None,
                received_on: None,
                status: None,
                lab_order_number: None,
                notes: None,
                lines: vec![LabOrderLineInput {
                    supply_id: own_supply,
                    quantity: 1,
                    unit_price: dec!(1.0),
                    notes: None,
                }],
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn listings_are_scoped_to_the_caller_tenant() {
    let services = test_services().await;
    let a = tenant("optica-a");
    let b = tenant("optica-b");

    seed_supplier(&services, &a, "Solo A").await;
    seed_supplier(&services, &b, "Solo B").await;
    seed_supply(&services, &a, "Supply A", Some(1)).await;

    let a_suppliers = services.suppliers.list(&a, None, None).await.unwrap();
    assert_eq!(a_suppliers.len(), 1);
    assert_eq!(a_suppliers[0].name, "Solo A");

    let b_supplies = services
        .supplies
        .list(&b, Default::default())
        .await
        .unwrap();
    assert!(b_supplies.is_empty());
}

#[tokio::test]
async fn mutations_through_the_wrong_tenant_do_not_stick() {
    let services = test_services().await;
    let a = tenant("optica-a");
    let b = tenant("optica-b");

    let supplier_id = seed_supplier(&services, &a, "Laboratorio Sur").await;

    let err = services.suppliers.deactivate(&b, supplier_id).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    assert!(services.suppliers.get(&a, supplier_id).await.unwrap().active);
}
