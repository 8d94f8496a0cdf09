//! Property-based tests for the inventory/order consistency core.

mod common;

use common::*;
use optica_api::entities::lab_orders::LabOrderStatus;
use optica_api::services::purchases::{CreatePurchase, PurchaseLineInput};
use proptest::prelude::*;
use rust_decimal::Decimal;

// Strategies for generating test data

fn line_strategy() -> impl Strategy<Value = (i32, i64)> {
    // quantity, unit price in cents
    (1i32..=50, 1i64..=10_000)
}

fn lines_strategy() -> impl Strategy<Value = Vec<(i32, i64)>> {
    prop::collection::vec(line_strategy(), 1..=4)
}

fn mangled_status_strategy() -> impl Strategy<Value = String> {
    (
        prop_oneof![
            Just("pending"),
            Just("sent"),
            Just("in_process"),
            Just("received"),
            Just("cancelled"),
        ],
        "\\s{0,3}",
        "\\s{0,3}",
        any::<bool>(),
    )
        .prop_map(|(name, prefix, suffix, upper)| {
            let body = if upper {
                name.to_uppercase()
            } else {
                name.to_string()
            };
            format!("{prefix}{body}{suffix}")
        })
}

// Property: lenient parsing accepts any casing/whitespace of a valid status
// and round-trips through the canonical wire form.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn mangled_valid_statuses_always_parse(raw in mangled_status_strategy()) {
        let parsed = LabOrderStatus::parse_normalized(&raw);
        prop_assert!(parsed.is_some(), "rejected valid status input: {raw:?}");
        let canonical = parsed.unwrap().to_string();
        prop_assert_eq!(LabOrderStatus::parse_normalized(&canonical), parsed);
    }

    #[test]
    fn arbitrary_words_never_parse_as_statuses(raw in "[a-z]{1,12}") {
        let allowed = ["pending", "sent", "in_process", "received", "cancelled"];
        if !allowed.contains(&raw.as_str()) {
            prop_assert!(LabOrderStatus::parse_normalized(&raw).is_none());
        }
    }
}

// Property: for any set of lines, the stored total equals the sum of
// quantity x unit price, and every supply's stock grows by exactly its
// line quantity. Runs against the real service and store.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(10))]

    #[test]
    fn purchase_totals_and_stock_match_lines(lines in lines_strategy()) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("runtime");

        rt.block_on(async {
            let services = test_services().await;
            let t = tenant("optica-prop");
            let supplier_id = seed_supplier(&services, &t, "Laboratorio Sur").await;

            let mut inputs = Vec::with_capacity(lines.len());
            let mut expected_total = Decimal::ZERO;
            for (i, (quantity, cents)) in lines.iter().enumerate() {
                let supply_id =
                    seed_supply(&services, &t, &format!("Supply {i}"), Some(0)).await;
                let unit_price = Decimal::new(*cents, 2);
                expected_total += Decimal::from(*quantity) * unit_price;
                inputs.push(PurchaseLineInput {
                    supply_id,
                    quantity: *quantity,
                    unit_price,
                });
            }

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
                        lines: inputs.clone(),
                    },
                )
                .await
                .expect("purchase create");

            assert_eq!(created.total_amount, expected_total);

            for input in &inputs {
                let supply = services.supplies.get(&t, input.supply_id).await.unwrap();
                assert_eq!(supply.current_stock, Some(input.quantity));
            }

            // Voiding with no intervening consumption restores every stock
            // to its pre-create level.
            services.purchases.void(&t, created.id, None).await.expect("void");
            for input in &inputs {
                let supply = services.supplies.get(&t, input.supply_id).await.unwrap();
                assert_eq!(supply.current_stock, Some(0));
            }
        });
    }
}
