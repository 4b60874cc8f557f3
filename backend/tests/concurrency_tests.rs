//! Optimistic-concurrency tests
//!
//! Concurrent writers against the same ingredient must never lose updates:
//! every committed transaction is reflected in the final cached state, and
//! the ledger replay still matches the cache.

use std::sync::Arc;

use rust_decimal::Decimal;
use shared::{CustomerInfo, StockTransaction, TransactionKind, UnitCategory};

use costbook_backend::error::AppError;
use costbook_backend::services::catalog::{CatalogService, EntryInput, PricingSpec, RecipeInput};
use costbook_backend::services::ledger::LedgerService;
use costbook_backend::services::registry::{CreateIngredientInput, IngredientService};
use costbook_backend::services::sales::{SaleInput, SaleService};
use costbook_backend::store::{MemoryStore, Store};

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_purchases_are_all_committed() {
    let store = Arc::new(MemoryStore::new());
    let registry = IngredientService::new(store.clone());
    let ing = registry
        .create(CreateIngredientInput {
            name: "CAFE".to_string(),
            category: UnitCategory::Mass,
            opening_quantity: None,
            opening_unit_cost: None,
        })
        .await
        .unwrap();

    let tasks: Vec<_> = (1..=8u32)
        .map(|i| {
            let registry = IngredientService::new(store.clone());
            let ingredient_id = ing.id;
            tokio::spawn(async move {
                let txn = StockTransaction::new(
                    TransactionKind::Purchase,
                    ingredient_id,
                    Decimal::from(i * 100),
                )
                .with_unit_cost(dec("0.05"));
                registry.apply_transaction(txn).await
            })
        })
        .collect();

    let mut committed = 0;
    for task in tasks {
        if task.await.unwrap().is_ok() {
            committed += 1;
        }
    }
    // contention may exhaust retries for some writers, but whatever was
    // accepted must be fully reflected
    assert!(committed >= 1);

    let final_state = registry.lookup(ing.id).await.unwrap();
    let ledger_total: Decimal = store
        .transactions_for_ingredient(ing.id)
        .iter()
        .map(|t| t.quantity_delta)
        .sum();
    assert_eq!(final_state.quantity, ledger_total);

    let ledger = LedgerService::new(store.clone());
    assert!(ledger.verify_ingredient(ing.id).await.unwrap().consistent);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_interleaved_purchases_and_corrections_stay_consistent() {
    let store = Arc::new(MemoryStore::new());
    let registry = IngredientService::new(store.clone());
    let ing = registry
        .create(CreateIngredientInput {
            name: "ACUCAR".to_string(),
            category: UnitCategory::Mass,
            opening_quantity: Some(dec("10000")),
            opening_unit_cost: Some(dec("0.004")),
        })
        .await
        .unwrap();

    let tasks: Vec<_> = (0..6u32)
        .map(|i| {
            let registry = IngredientService::new(store.clone());
            let ingredient_id = ing.id;
            tokio::spawn(async move {
                let txn = if i % 2 == 0 {
                    StockTransaction::new(
                        TransactionKind::Purchase,
                        ingredient_id,
                        Decimal::from(500),
                    )
                    .with_unit_cost(dec("0.005"))
                } else {
                    StockTransaction::new(
                        TransactionKind::Waste,
                        ingredient_id,
                        Decimal::from(-200),
                    )
                };
                registry.apply_transaction(txn).await
            })
        })
        .collect();

    for task in tasks {
        // retries are bounded; a conflict error is acceptable, silent loss
        // is not
        let _ = task.await.unwrap();
    }

    let ledger = LedgerService::new(store.clone());
    let report = ledger.verify_ingredient(ing.id).await.unwrap();
    assert!(report.consistent);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_reversals_restore_stock_exactly_once() {
    let store = Arc::new(MemoryStore::new());
    let registry = IngredientService::new(store.clone());
    let catalog = CatalogService::new(store.clone());
    let sales = SaleService::new(store.clone());

    let flour = registry
        .create(CreateIngredientInput {
            name: "FARINHA".to_string(),
            category: UnitCategory::Mass,
            opening_quantity: Some(dec("10000")),
            opening_unit_cost: Some(dec("0.005")),
        })
        .await
        .unwrap();
    let priced = catalog
        .create_recipe(RecipeInput {
            name: "pao".to_string(),
            entries: vec![EntryInput {
                ingredient_id: flour.id,
                quantity: dec("500"),
                unit: "g".to_string(),
            }],
            extra_costs: vec![],
            pricing: PricingSpec::Price(dec("10")),
        })
        .await
        .unwrap();
    let product = catalog.publish_product(priced.recipe.id).await.unwrap();

    let sale = sales
        .register_sale(SaleInput {
            product_id: product.id,
            quantity: dec("4"),
            unit_price: None,
            customer: CustomerInfo::default(),
        })
        .await
        .unwrap();
    assert_eq!(registry.lookup(flour.id).await.unwrap().quantity, dec("8000"));

    let tasks: Vec<_> = (0..4)
        .map(|_| {
            let sales = SaleService::new(store.clone());
            let sale_id = sale.id;
            tokio::spawn(async move { sales.reverse_sale(sale_id).await })
        })
        .collect();

    let mut reversed = 0;
    let mut already = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => reversed += 1,
            Err(AppError::AlreadyReversed(_)) => already += 1,
            Err(e) => panic!("unexpected reversal error: {:?}", e),
        }
    }
    assert_eq!(reversed, 1);
    assert_eq!(already, 3);

    // stock is back at the pre-sale level, not above it
    assert_eq!(
        registry.lookup(flour.id).await.unwrap().quantity,
        dec("10000")
    );
    // opening purchase + one consumption + one inverse
    assert_eq!(store.transactions_for_ingredient(flour.id).len(), 3);
}

#[tokio::test]
async fn test_version_advances_once_per_commit() {
    let store = Arc::new(MemoryStore::new());
    let registry = IngredientService::new(store.clone());
    let ing = registry
        .create(CreateIngredientInput {
            name: "LEITE".to_string(),
            category: UnitCategory::Volume,
            opening_quantity: None,
            opening_unit_cost: None,
        })
        .await
        .unwrap();
    assert_eq!(ing.version, 0);

    let txn = StockTransaction::new(TransactionKind::Purchase, ing.id, dec("1000"))
        .with_unit_cost(dec("0.006"));
    let after = registry.apply_transaction(txn).await.unwrap();
    assert_eq!(after.version, 1);

    let txn = StockTransaction::new(TransactionKind::Waste, ing.id, dec("-100"));
    let after = registry.apply_transaction(txn).await.unwrap();
    assert_eq!(after.version, 2);
}
