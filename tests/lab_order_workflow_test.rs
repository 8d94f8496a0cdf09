mod common;

use common::*;
use optica_api::{
    errors::ServiceError,
    services::lab_orders::{
        CreateLabOrder, LabOrderLineInput, LabOrderPatch, ReceiveLabOrder,
    },
};
use rust_decimal_macros::dec;

fn order(
    prescription_id: i64,
    supplier_id: i64,
    lines: Vec<LabOrderLineInput>,
) -> CreateLabOrder {
    CreateLabOrder {
        prescription_id,
        supplier_id,
        sent_on: Some(date(2024, 6, 3)),
        expected_on: Some(date(2024, 6, 10)),
        received_on: None,
        status: None,
        lab_order_number: None,
        notes: None,
        lines,
    }
}

fn line(supply_id: i64, quantity: i32) -> LabOrderLineInput {
    LabOrderLineInput {
        supply_id,
        quantity,
        unit_price: dec!(10.0),
        notes: None,
    }
}

fn receive_defaults() -> ReceiveLabOrder {
    ReceiveLabOrder {
        received_on: None,
        status: None,
        lab_order_number: None,
        notes: None,
        deduct_stock: true,
    }
}

async fn seed_order(
    services: &optica_api::handlers::AppServices,
    t: &optica_api::tenant::TenantId,
    lines: Vec<LabOrderLineInput>,
) -> i64 {
    let client_id = seed_client(services, t, "Suarez", 30111222).await;
    let prescription_id = seed_prescription(services, t, client_id).await;
    let supplier_id = seed_supplier(services, t, "Laboratorio Andino").await;
    services
        .lab_orders
        .create(t, order(prescription_id, supplier_id, lines))
        .await
        .expect("lab order create")
        .id
}

#[tokio::test]
async fn create_defaults_to_sent_and_moves_no_stock() {
    let services = test_services().await;
    let t = tenant("optica-a");
    let supply_id = seed_supply(&services, &t, "Lens blank", Some(7)).await;

    let order_id = seed_order(&services, &t, vec![line(supply_id, 3)]).await;

    let order = services.lab_orders.get(&t, order_id).await.unwrap();
    assert_eq!(order.status.as_deref(), Some("SENT"));
    assert!(order.received_on.is_none());

    // Creation never touches stock.
    assert_eq!(
        services
            .supplies
            .get(&t, supply_id)
            .await
            .unwrap()
            .current_stock,
        Some(7)
    );
}

#[tokio::test]
async fn status_input_is_normalized_and_validated() {
    let services = test_services().await;
    let t = tenant("optica-a");
    let supply_id = seed_supply(&services, &t, "Lens blank", Some(7)).await;
    let client_id = seed_client(&services, &t, "Gomez", 28555111).await;
    let prescription_id = seed_prescription(&services, &t, client_id).await;
    let supplier_id = seed_supplier(&services, &t, "Laboratorio Andino").await;

    let mut create = order(prescription_id, supplier_id, vec![line(supply_id, 1)]);
    create.status = Some("  in_process ".to_string());
    let created = services.lab_orders.create(&t, create).await.unwrap();
    assert_eq!(created.status, "IN_PROCESS");

    let mut bad = order(prescription_id, supplier_id, vec![line(supply_id, 1)]);
    bad.status = Some("SHIPPED".to_string());
    let err = services.lab_orders.create(&t, bad).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidStatus(_)));
}

#[tokio::test]
async fn receive_deducts_stock_exactly_once() {
    let services = test_services().await;
    let t = tenant("optica-a");
    let supply_id = seed_supply(&services, &t, "Lens blank", Some(10)).await;
    let order_id = seed_order(&services, &t, vec![line(supply_id, 4)]).await;

    let receipt = services
        .lab_orders
        .receive(&t, order_id, receive_defaults())
        .await
        .expect("receive");

    assert_eq!(receipt.status, "RECEIVED");
    assert!(receipt.stock_deducted);
    assert_eq!(
        services
            .supplies
            .get(&t, supply_id)
            .await
            .unwrap()
            .current_stock,
        Some(6)
    );

    // Second receive: conflict, and no double deduction.
    let err = services
        .lab_orders
        .receive(&t, order_id, receive_defaults())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)), "got {err:?}");
    assert_eq!(
        services
            .supplies
            .get(&t, supply_id)
            .await
            .unwrap()
            .current_stock,
        Some(6)
    );
}

#[tokio::test]
async fn receive_rejects_insufficient_stock_without_partial_effect() {
    let services = test_services().await;
    let t = tenant("optica-a");
    let plentiful = seed_supply(&services, &t, "Cleaning cloth", Some(50)).await;
    let scarce = seed_supply(&services, &t, "Photochromic blank", Some(3)).await;
    let order_id = seed_order(
        &services,
        &t,
        vec![line(plentiful, 2), line(scarce, 5)],
    )
    .await;

    let err = services
        .lab_orders
        .receive(&t, order_id, receive_defaults())
        .await
        .unwrap_err();

    match err {
        ServiceError::InsufficientStock(msg) => {
            assert!(msg.contains("Photochromic blank"), "message: {msg}");
            assert!(msg.contains("stock=3"), "message: {msg}");
            assert!(msg.contains("required=5"), "message: {msg}");
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }

    // Nothing was deducted, not even the satisfiable line, and the order
    // is still receivable.
    assert_eq!(
        services
            .supplies
            .get(&t, plentiful)
            .await
            .unwrap()
            .current_stock,
        Some(50)
    );
    assert_eq!(
        services
            .supplies
            .get(&t, scarce)
            .await
            .unwrap()
            .current_stock,
        Some(3)
    );
    assert!(services
        .lab_orders
        .get(&t, order_id)
        .await
        .unwrap()
        .received_on
        .is_none());
}

#[tokio::test]
async fn untracked_stock_counts_as_zero_on_receive() {
    let services = test_services().await;
    let t = tenant("optica-a");
    let supply_id = seed_supply(&services, &t, "Untracked item", None).await;
    let order_id = seed_order(&services, &t, vec![line(supply_id, 1)]).await;

    let err = services
        .lab_orders
        .receive(&t, order_id, receive_defaults())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InsufficientStock(_)));
}

#[tokio::test]
async fn receive_without_deduction_leaves_stock_alone() {
    let services = test_services().await;
    let t = tenant("optica-a");
    let supply_id = seed_supply(&services, &t, "Lens blank", Some(2)).await;
    let order_id = seed_order(&services, &t, vec![line(supply_id, 5)]).await;

    let receipt = services
        .lab_orders
        .receive(
            &t,
            order_id,
            ReceiveLabOrder {
                deduct_stock: false,
                received_on: Some(date(2024, 6, 12)),
                ..receive_defaults()
            },
        )
        .await
        .expect("receive without deduction");

    assert!(!receipt.stock_deducted);
    assert_eq!(receipt.received_on, date(2024, 6, 12));
    assert_eq!(
        services
            .supplies
            .get(&t, supply_id)
            .await
            .unwrap()
            .current_stock,
        Some(2)
    );
}

#[tokio::test]
async fn received_is_terminal_for_status_updates() {
    let services = test_services().await;
    let t = tenant("optica-a");
    let supply_id = seed_supply(&services, &t, "Lens blank", Some(10)).await;
    let order_id = seed_order(&services, &t, vec![line(supply_id, 1)]).await;

    services
        .lab_orders
        .receive(&t, order_id, receive_defaults())
        .await
        .unwrap();

    // Any transition away from RECEIVED is a conflict...
    let err = services
        .lab_orders
        .update_status(&t, order_id, "SENT")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));

    // ...but the RECEIVED -> RECEIVED no-op is accepted.
    let order = services
        .lab_orders
        .update_status(&t, order_id, "received")
        .await
        .unwrap();
    assert_eq!(order.status.as_deref(), Some("RECEIVED"));

    // The same guard applies to a status embedded in a generic patch.
    let err = services
        .lab_orders
        .patch(
            &t,
            order_id,
            LabOrderPatch {
                status: Some("CANCELLED".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[tokio::test]
async fn unknown_status_is_rejected_on_update() {
    let services = test_services().await;
    let t = tenant("optica-a");
    let supply_id = seed_supply(&services, &t, "Lens blank", Some(1)).await;
    let order_id = seed_order(&services, &t, vec![line(supply_id, 1)]).await;

    let err = services
        .lab_orders
        .update_status(&t, order_id, "LOST_IN_TRANSIT")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidStatus(_)));
}

#[tokio::test]
async fn create_validates_references_within_tenant() {
    let services = test_services().await;
    let t = tenant("optica-a");
    let supply_id = seed_supply(&services, &t, "Lens blank", Some(1)).await;
    let supplier_id = seed_supplier(&services, &t, "Laboratorio Andino").await;

    // Unknown prescription
    let err = services
        .lab_orders
        .create(&t, order(424242, supplier_id, vec![line(supply_id, 1)]))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));
}
