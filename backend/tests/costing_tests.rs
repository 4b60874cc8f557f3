//! Costing and pricing tests
//!
//! Covers the bidirectional price/margin solver, its inverse law, and recipe
//! cost breakdowns priced from registry averages.

use std::sync::Arc;

use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{ExtraCost, PricingInput, UnitCategory};

use costbook_backend::error::AppError;
use costbook_backend::services::catalog::{CatalogService, EntryInput, PricingSpec, RecipeInput};
use costbook_backend::services::costing::{solve_from_margin, solve_from_price};
use costbook_backend::services::registry::{CreateIngredientInput, IngredientService};
use costbook_backend::store::MemoryStore;

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn setup() -> (IngredientService, CatalogService) {
    let store = Arc::new(MemoryStore::new());
    (
        IngredientService::new(store.clone()),
        CatalogService::new(store),
    )
}

async fn create(
    registry: &IngredientService,
    name: &str,
    category: UnitCategory,
    qty: &str,
    cost: &str,
) -> shared::Ingredient {
    registry
        .create(CreateIngredientInput {
            name: name.to_string(),
            category,
            opening_quantity: Some(dec(qty)),
            opening_unit_cost: Some(dec(cost)),
        })
        .await
        .unwrap()
}

// ============================================================================
// Solver Unit Tests
// ============================================================================

#[test]
fn test_margin_of_50_doubles_cost() {
    assert_eq!(solve_from_margin(dec("12"), dec("50")).unwrap(), dec("24"));
}

#[test]
fn test_margin_at_or_above_100_fails() {
    assert!(matches!(
        solve_from_margin(dec("12"), dec("100")),
        Err(AppError::InvalidMargin(_))
    ));
    assert!(matches!(
        solve_from_margin(dec("12"), dec("150")),
        Err(AppError::InvalidMargin(_))
    ));
}

#[test]
fn test_price_below_cost_gives_negative_margin() {
    let margin = solve_from_price(dec("10"), dec("7.50")).unwrap();
    assert!(margin < Decimal::ZERO);
    let diff = (margin - dec("-33.3333333333")).abs();
    assert!(diff < dec("0.0001"));
}

#[test]
fn test_zero_price_fails() {
    assert!(matches!(
        solve_from_price(dec("10"), Decimal::ZERO),
        Err(AppError::InvalidPrice(_))
    ));
}

// ============================================================================
// Recipe Costing Tests
// ============================================================================

#[tokio::test]
async fn test_recipe_breakdown_sums_entries_and_extras() {
    let (registry, catalog) = setup();
    let flour = create(&registry, "farinha", UnitCategory::Mass, "10000", "0.005").await;
    let milk = create(&registry, "leite", UnitCategory::Volume, "5000", "0.006").await;

    let priced = catalog
        .create_recipe(RecipeInput {
            name: "bolo simples".to_string(),
            entries: vec![
                EntryInput {
                    ingredient_id: flour.id,
                    quantity: dec("0.5"),
                    unit: "kg".to_string(),
                },
                EntryInput {
                    ingredient_id: milk.id,
                    quantity: dec("200"),
                    unit: "ml".to_string(),
                },
            ],
            extra_costs: vec![ExtraCost {
                name: "embalagem".to_string(),
                amount: dec("1.20"),
            }],
            pricing: PricingSpec::Margin(dec("60")),
        })
        .await
        .unwrap();

    // 500g * 0.005 + 200ml * 0.006 = 2.5 + 1.2 = 3.7; + 1.20 extra = 4.90
    assert_eq!(priced.breakdown.ingredient_cost, dec("3.700"));
    assert_eq!(priced.breakdown.extra_cost, dec("1.20"));
    assert_eq!(priced.breakdown.total, dec("4.900"));
    // price = 4.90 / 0.4 = 12.25
    assert_eq!(priced.recipe.sale_price, dec("12.25"));
    assert_eq!(priced.recipe.pricing_input, PricingInput::Margin);
}

#[tokio::test]
async fn test_recipe_combines_duplicate_entries() {
    let (registry, catalog) = setup();
    let sugar = create(&registry, "acucar", UnitCategory::Mass, "10000", "0.004").await;

    let priced = catalog
        .create_recipe(RecipeInput {
            name: "calda".to_string(),
            entries: vec![
                EntryInput {
                    ingredient_id: sugar.id,
                    quantity: dec("100"),
                    unit: "g".to_string(),
                },
                EntryInput {
                    ingredient_id: sugar.id,
                    quantity: dec("0.2"),
                    unit: "kg".to_string(),
                },
            ],
            extra_costs: vec![],
            pricing: PricingSpec::Price(dec("5")),
        })
        .await
        .unwrap();

    assert_eq!(priced.recipe.entries.len(), 1);
    assert_eq!(priced.recipe.entries[0].quantity, dec("300.0"));
}

#[tokio::test]
async fn test_recipe_rejects_unit_of_wrong_category() {
    let (registry, catalog) = setup();
    let milk = create(&registry, "leite", UnitCategory::Volume, "5000", "0.006").await;

    let err = catalog
        .create_recipe(RecipeInput {
            name: "vitamina".to_string(),
            entries: vec![EntryInput {
                ingredient_id: milk.id,
                quantity: dec("1"),
                unit: "kg".to_string(),
            }],
            extra_costs: vec![],
            pricing: PricingSpec::Margin(dec("50")),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::CategoryMismatch { .. }));
}

#[tokio::test]
async fn test_reprice_rederives_the_non_authoritative_field() {
    let (registry, catalog) = setup();
    let cocoa = create(&registry, "cacau", UnitCategory::Mass, "1000", "0.08").await;

    let priced = catalog
        .create_recipe(RecipeInput {
            name: "brigadeiro".to_string(),
            entries: vec![EntryInput {
                ingredient_id: cocoa.id,
                quantity: dec("50"),
                unit: "g".to_string(),
            }],
            extra_costs: vec![],
            pricing: PricingSpec::Margin(dec("50")),
        })
        .await
        .unwrap();
    // 50g * 0.08 = 4.00, price = 8.00
    assert_eq!(priced.recipe.sale_price, dec("8.00"));

    // a cheaper purchase lowers the average and thus the solved price
    use shared::{StockTransaction, TransactionKind};
    let txn = StockTransaction::new(TransactionKind::Purchase, cocoa.id, dec("1000"))
        .with_unit_cost(dec("0.04"));
    registry.apply_transaction(txn).await.unwrap();

    let repriced = catalog.reprice_recipe(priced.recipe.id).await.unwrap();
    // new avg = (1000*0.08 + 1000*0.04)/2000 = 0.06; cost 3.00; price 6.00
    assert_eq!(repriced.recipe.unit_cost, dec("3.00"));
    assert_eq!(repriced.recipe.sale_price, dec("6.00"));
    // margin stays authoritative
    assert_eq!(repriced.recipe.margin_percent, dec("50"));
}

// ============================================================================
// Property Tests
// ============================================================================

fn cost_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..=1_000_000).prop_map(|n| Decimal::new(n, 2))
}

fn margin_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..=9_900).prop_map(|n| Decimal::new(n, 2))
}

proptest! {
    /// Solving price from margin and margin back from price recovers the
    /// original margin (up to decimal rounding).
    #[test]
    fn prop_margin_price_solvers_are_inverse(
        cost in cost_strategy(),
        margin in margin_strategy(),
    ) {
        let price = solve_from_margin(cost, margin).unwrap();
        let recovered = solve_from_price(cost, price).unwrap();
        let diff = (recovered - margin).abs();
        prop_assert!(diff < Decimal::new(1, 6), "margin {} recovered as {}", margin, recovered);
    }

    /// The solved price never drops below cost for valid margins.
    #[test]
    fn prop_price_at_least_cost(
        cost in cost_strategy(),
        margin in margin_strategy(),
    ) {
        let price = solve_from_margin(cost, margin).unwrap();
        prop_assert!(price >= cost);
    }
}
