//! Ledger and registry tests
//!
//! Covers the append-only ledger, the weighted-average cost rules and the
//! rebuild-equals-cache guarantee under arbitrary transaction sequences.

use std::sync::Arc;

use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{StockTransaction, TransactionKind, UnitCategory};

use costbook_backend::services::ledger::LedgerService;
use costbook_backend::services::registry::{
    weighted_average, CorrectionInput, CreateIngredientInput, IngredientService,
};
use costbook_backend::store::{MemoryStore, Store};

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn setup() -> (Arc<MemoryStore>, IngredientService, LedgerService) {
    let store = Arc::new(MemoryStore::new());
    let registry = IngredientService::new(store.clone());
    let ledger = LedgerService::new(store.clone());
    (store, registry, ledger)
}

async fn create(registry: &IngredientService, name: &str, qty: &str, cost: &str) -> shared::Ingredient {
    registry
        .create(CreateIngredientInput {
            name: name.to_string(),
            category: UnitCategory::Mass,
            opening_quantity: Some(dec(qty)),
            opening_unit_cost: Some(dec(cost)),
        })
        .await
        .unwrap()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[tokio::test]
async fn test_opening_balance_is_a_purchase_transaction() {
    let (store, registry, _) = setup();
    let ing = create(&registry, "farinha", "1000", "0.005").await;

    assert_eq!(ing.quantity, dec("1000"));
    assert_eq!(ing.avg_unit_cost, dec("0.005"));
    assert_eq!(ing.name, "FARINHA");

    let txns = store.transactions_for_ingredient(ing.id);
    assert_eq!(txns.len(), 1);
    assert_eq!(txns[0].kind, TransactionKind::Purchase);
}

#[tokio::test]
async fn test_purchase_moves_weighted_average() {
    let (_, registry, _) = setup();
    let ing = create(&registry, "acucar", "100", "2").await;

    let txn = StockTransaction::new(TransactionKind::Purchase, ing.id, dec("50"))
        .with_unit_cost(dec("5"));
    let updated = registry.apply_transaction(txn).await.unwrap();

    // (100*2 + 50*5) / 150 = 3
    assert_eq!(updated.quantity, dec("150"));
    assert_eq!(updated.avg_unit_cost, dec("3"));
}

#[tokio::test]
async fn test_consumption_keeps_average() {
    let (_, registry, _) = setup();
    let ing = create(&registry, "leite", "1000", "0.006").await;

    let txn = StockTransaction::new(TransactionKind::Waste, ing.id, dec("-400"));
    let updated = registry.apply_transaction(txn).await.unwrap();
    assert_eq!(updated.quantity, dec("600"));
    assert_eq!(updated.avg_unit_cost, dec("0.006"));
}

#[tokio::test]
async fn test_apply_transaction_is_idempotent() {
    let (store, registry, _) = setup();
    let ing = create(&registry, "ovos", "30", "0.80").await;

    let txn = StockTransaction::new(TransactionKind::Purchase, ing.id, dec("12"))
        .with_unit_cost(dec("0.75"));
    let after_first = registry.apply_transaction(txn.clone()).await.unwrap();
    let after_second = registry.apply_transaction(txn).await.unwrap();

    assert_eq!(after_first.quantity, after_second.quantity);
    assert_eq!(after_first.avg_unit_cost, after_second.avg_unit_cost);
    // opening balance + one purchase
    assert_eq!(store.transaction_count(), 2);
}

#[tokio::test]
async fn test_overdraw_is_rejected_with_no_ledger_growth() {
    let (store, registry, _) = setup();
    let ing = create(&registry, "cacau", "300", "0.09").await;

    let txn = StockTransaction::new(TransactionKind::SaleConsumption, ing.id, dec("-500"));
    let err = registry.apply_transaction(txn).await.unwrap_err();
    assert!(matches!(
        err,
        costbook_backend::error::AppError::InsufficientStock { .. }
    ));
    assert_eq!(store.transaction_count(), 1);
    assert_eq!(
        registry.lookup(ing.id).await.unwrap().quantity,
        dec("300")
    );
}

#[tokio::test]
async fn test_correction_may_drive_stock_negative() {
    let (_, registry, ledger) = setup();
    let ing = create(&registry, "manteiga", "200", "0.04").await;

    let updated = registry
        .record_correction(
            ing.id,
            CorrectionInput {
                quantity_delta: dec("-350"),
                note: Some("uso não registrado".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.quantity, dec("-150"));
    // average untouched by the correction
    assert_eq!(updated.avg_unit_cost, dec("0.04"));

    let report = ledger.verify_ingredient(ing.id).await.unwrap();
    assert!(report.consistent);
}

#[tokio::test]
async fn test_zero_correction_is_rejected() {
    let (_, registry, _) = setup();
    let ing = create(&registry, "fermento", "100", "0.12").await;

    let err = registry
        .record_correction(
            ing.id,
            CorrectionInput {
                quantity_delta: Decimal::ZERO,
                note: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        costbook_backend::error::AppError::Validation { .. }
    ));
}

#[tokio::test]
async fn test_rebuild_matches_cache_after_mixed_sequence() {
    let (_, registry, ledger) = setup();
    let ing = create(&registry, "farinha", "1000", "0.005").await;

    let purchase = StockTransaction::new(TransactionKind::Purchase, ing.id, dec("2000"))
        .with_unit_cost(dec("0.004"));
    registry.apply_transaction(purchase).await.unwrap();
    let waste = StockTransaction::new(TransactionKind::Waste, ing.id, dec("-300"));
    registry.apply_transaction(waste).await.unwrap();
    registry
        .record_correction(
            ing.id,
            CorrectionInput {
                quantity_delta: dec("-50"),
                note: None,
            },
        )
        .await
        .unwrap();

    let report = ledger.verify_ingredient(ing.id).await.unwrap();
    assert!(report.consistent);
    assert_eq!(report.cached_quantity, dec("2650"));
    assert_eq!(report.transaction_count, 4);
}

#[tokio::test]
async fn test_restore_from_ledger_converges() {
    let (_, registry, ledger) = setup();
    let ing = create(&registry, "acucar", "500", "0.01").await;

    let restored = ledger.restore_from_ledger(ing.id).await.unwrap();
    assert_eq!(restored.quantity, dec("500"));
    assert_eq!(restored.avg_unit_cost, dec("0.01"));
    assert!(ledger.verify_ingredient(ing.id).await.unwrap().consistent);
}

#[tokio::test]
async fn test_rejected_opening_balance_leaves_no_registry_entry() {
    let (_, registry, _) = setup();
    let err = registry
        .create(CreateIngredientInput {
            name: "fuba".to_string(),
            category: UnitCategory::Mass,
            opening_quantity: Some(dec("-5")),
            opening_unit_cost: Some(dec("1")),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        costbook_backend::error::AppError::Validation { .. }
    ));

    // the corrected retry must not collide with a half-created entry
    let ing = create(&registry, "fuba", "5", "1").await;
    assert_eq!(ing.quantity, dec("5"));
}

#[tokio::test]
async fn test_replayed_batch_does_not_move_the_cache_again() {
    let (store, registry, ledger) = setup();
    let ing = create(&registry, "polvilho", "1000", "0.01").await;

    let batch = vec![StockTransaction::new(
        TransactionKind::Waste,
        ing.id,
        dec("-200"),
    )];
    registry.apply_batch(batch.clone()).await.unwrap();
    registry.apply_batch(batch).await.unwrap();

    assert_eq!(registry.lookup(ing.id).await.unwrap().quantity, dec("800"));
    // opening balance + one waste entry
    assert_eq!(store.transaction_count(), 2);
    assert!(ledger.verify_ingredient(ing.id).await.unwrap().consistent);
}

#[tokio::test]
async fn test_duplicate_active_name_is_rejected() {
    let (_, registry, _) = setup();
    create(&registry, "Farinha  de Trigo", "10", "1").await;

    let err = registry
        .create(CreateIngredientInput {
            name: "farinha de trigo".to_string(),
            category: UnitCategory::Mass,
            opening_quantity: None,
            opening_unit_cost: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        costbook_backend::error::AppError::DuplicateEntry(_)
    ));
}

// ============================================================================
// Property Tests
// ============================================================================

/// Purchase quantities in base units
fn quantity_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..=100_000).prop_map(|n| Decimal::new(n, 2))
}

/// Per-unit costs
fn cost_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..=50_000).prop_map(|n| Decimal::new(n, 4))
}

proptest! {
    /// Replaying the ledger always reproduces the cached state exactly,
    /// whatever sequence of purchases was applied.
    #[test]
    fn prop_rebuild_equals_cache_for_purchase_sequences(
        purchases in prop::collection::vec((quantity_strategy(), cost_strategy()), 1..12)
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let (_, registry, ledger) = setup();
            let ing = registry
                .create(CreateIngredientInput {
                    name: "CAFE".to_string(),
                    category: UnitCategory::Mass,
                    opening_quantity: None,
                    opening_unit_cost: None,
                })
                .await
                .unwrap();

            for (qty, cost) in &purchases {
                let txn = StockTransaction::new(TransactionKind::Purchase, ing.id, *qty)
                    .with_unit_cost(*cost);
                registry.apply_transaction(txn).await.unwrap();
            }

            let report = ledger.verify_ingredient(ing.id).await.unwrap();
            prop_assert!(report.consistent);

            // the cached average equals the total value over total quantity
            let total_qty: Decimal = purchases.iter().map(|(q, _)| *q).sum();
            let total_value: Decimal = purchases.iter().map(|(q, c)| *q * *c).sum();
            prop_assert_eq!(report.cached_quantity, total_qty);
            let expected_avg = total_value / total_qty;
            let diff = (report.cached_avg_cost - expected_avg).abs();
            prop_assert!(diff < Decimal::new(1, 10));
            Ok(())
        })?;
    }

    /// The weighted average always lies between the two input costs.
    #[test]
    fn prop_weighted_average_is_bounded(
        old_qty in quantity_strategy(),
        old_avg in cost_strategy(),
        qty in quantity_strategy(),
        cost in cost_strategy(),
    ) {
        let avg = weighted_average(old_qty, old_avg, qty, cost);
        let lo = old_avg.min(cost);
        let hi = old_avg.max(cost);
        prop_assert!(avg >= lo && avg <= hi);
    }
}
