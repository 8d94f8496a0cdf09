mod common;

use common::*;
use optica_api::{
    errors::ServiceError,
    services::clients::ClientSearch,
    services::purchases::{CreatePurchase, PurchaseLineInput, PurchaseSearch},
    services::suppliers::SupplierSearch,
};
use rstest::rstest;
use rust_decimal_macros::dec;

fn search_defaults() -> PurchaseSearch {
    PurchaseSearch {
        order_by: "purchase_date".to_string(),
        order_dir: "desc".to_string(),
        limit: 50,
        offset: 0,
        ..Default::default()
    }
}

#[tokio::test]
async fn unknown_sort_column_is_rejected_with_the_whitelist() {
    let services = test_services().await;
    let t = tenant("optica-a");

    let err = services
        .purchases
        .search(
            &t,
            PurchaseSearch {
                order_by: "supplier_name".to_string(),
                ..search_defaults()
            },
        )
        .await
        .unwrap_err();

    match err {
        ServiceError::ValidationError(msg) => {
            assert!(msg.contains("supplier_name"), "message: {msg}");
            assert!(msg.contains("purchase_date"), "message: {msg}");
            assert!(msg.contains("total_amount"), "message: {msg}");
        }
        other => panic!("expected ValidationError, got {other:?}"),
    }
}

#[tokio::test]
async fn pagination_is_deterministic_under_duplicate_sort_keys() {
    let services = test_services().await;
    let t = tenant("optica-a");
    let supplier_id = seed_supplier(&services, &t, "Laboratorio Sur").await;
    let supply_id = seed_supply(&services, &t, "Lens blank", Some(0)).await;

    // Five purchases sharing the same date: the primary sort key ties on
    // every row, so ordering falls to the id tie-break.
    for _ in 0..5 {
        services
            .purchases
            .create(
                &t,
                CreatePurchase {
                    supplier_id,
                    purchase_date: date(2024, 6, 1),
                    voucher_kind: None,
                    voucher_number: None,
                    notes: None,
                    lines: vec![PurchaseLineInput {
                        supply_id,
                        quantity: 1,
                        unit_price: dec!(1.0),
                    }],
                },
            )
            .await
            .unwrap();
    }

    let mut seen = Vec::new();
    for page in 0u64..3 {
        let (items, total) = services
            .purchases
            .search(
                &t,
                PurchaseSearch {
                    limit: 2,
                    offset: page * 2,
                    ..search_defaults()
                },
            )
            .await
            .unwrap();
        assert_eq!(total, 5);
        seen.extend(items.into_iter().map(|p| p.id));
    }

    // All five rows, no duplicates across pages, ids strictly descending.
    assert_eq!(seen.len(), 5);
    let mut sorted = seen.clone();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    sorted.dedup();
    assert_eq!(seen, sorted);
}

#[rstest]
#[case::lowercase("laboratorio")]
#[case::uppercase("LABORATORIO")]
#[case::mixed_prefix("Labo")]
#[tokio::test]
async fn free_text_filter_is_case_insensitive(#[case] needle: &str) {
    let services = test_services().await;
    let t = tenant("optica-a");
    seed_supplier(&services, &t, "Laboratorio Sur").await;
    seed_supplier(&services, &t, "Distribuidora Norte").await;

    let (items, total) = services
        .suppliers
        .search(
            &t,
            SupplierSearch {
                q: Some(needle.to_string()),
                order_by: "name".to_string(),
                order_dir: "asc".to_string(),
                limit: 50,
                offset: 0,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(total, 1, "needle: {needle}");
    assert_eq!(items[0].name, "Laboratorio Sur");
}

#[tokio::test]
async fn filters_on_id_references_are_validated_within_tenant() {
    let services = test_services().await;
    let a = tenant("optica-a");
    let b = tenant("optica-b");
    let foreign_supplier = seed_supplier(&services, &a, "Laboratorio Sur").await;

    let err = services
        .purchases
        .search(
            &b,
            PurchaseSearch {
                supplier_id: Some(foreign_supplier),
                ..search_defaults()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn client_search_orders_by_requested_column() {
    let services = test_services().await;
    let t = tenant("optica-a");
    seed_client(&services, &t, "Zapata", 1).await;
    seed_client(&services, &t, "Alvarez", 2).await;
    seed_client(&services, &t, "Moreno", 3).await;

    let (items, total) = services
        .clients
        .search(
            &t,
            ClientSearch {
                order_by: "last_name".to_string(),
                order_dir: "asc".to_string(),
                limit: 10,
                offset: 0,
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(total, 3);
    let names: Vec<&str> = items.iter().map(|c| c.last_name.as_str()).collect();
    assert_eq!(names, vec!["Alvarez", "Moreno", "Zapata"]);

    let (items, _) = services
        .clients
        .search(
            &t,
            ClientSearch {
                order_by: "last_name".to_string(),
                order_dir: "desc".to_string(),
                limit: 10,
                offset: 0,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(items[0].last_name, "Zapata");
}

#[tokio::test]
async fn voided_filter_narrows_purchase_listings() {
    let services = test_services().await;
    let t = tenant("optica-a");
    let supplier_id = seed_supplier(&services, &t, "Laboratorio Sur").await;
    let supply_id = seed_supply(&services, &t, "Lens blank", Some(0)).await;

    let mut ids = Vec::new();
    for _ in 0..2 {
        let created = services
            .purchases
            .create(
                &t,
                CreatePurchase {
                    supplier_id,
                    purchase_date: date(2024, 6, 1),
                    voucher_kind: None,
                    voucher_number: None,
                    notes: None,
                    lines: vec![PurchaseLineInput {
                        supply_id,
                        quantity: 1,
                        unit_price: dec!(1.0),
                    }],
                },
            )
            .await
            .unwrap();
        ids.push(created.id);
    }
    services.purchases.void(&t, ids[0], None).await.unwrap();

    let (live, total_live) = services
        .purchases
        .search(
            &t,
            PurchaseSearch {
                voided: Some(false),
                ..search_defaults()
            },
        )
        .await
        .unwrap();
    assert_eq!(total_live, 1);
    assert_eq!(live[0].id, ids[1]);

    let listed = services.purchases.list(&t, false).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, ids[1]);
}
