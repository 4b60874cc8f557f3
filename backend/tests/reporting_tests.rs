//! Reporting tests
//!
//! Covers the inventory overview with negative-stock alerts, the sales and
//! waste summaries, and the CSV ledger export.

use std::sync::Arc;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use shared::{CustomerInfo, TimeRange, UnitCategory, WasteReason};

use costbook_backend::services::catalog::{CatalogService, EntryInput, PricingSpec, RecipeInput};
use costbook_backend::services::registry::{
    CorrectionInput, CreateIngredientInput, IngredientService,
};
use costbook_backend::services::reporting::ReportingService;
use costbook_backend::services::sales::{SaleInput, SaleService};
use costbook_backend::services::waste::{IngredientWasteInput, WasteService};
use costbook_backend::store::MemoryStore;

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn last_day() -> TimeRange {
    let now = Utc::now();
    TimeRange {
        start: now - Duration::days(1),
        end: now + Duration::minutes(5),
    }
}

struct Fixture {
    registry: IngredientService,
    catalog: CatalogService,
    sales: SaleService,
    waste: WasteService,
    reporting: ReportingService,
}

fn setup() -> Fixture {
    let store = Arc::new(MemoryStore::new());
    Fixture {
        registry: IngredientService::new(store.clone()),
        catalog: CatalogService::new(store.clone()),
        sales: SaleService::new(store.clone()),
        waste: WasteService::new(store.clone()),
        reporting: ReportingService::new(store),
    }
}

impl Fixture {
    async fn ingredient(&self, name: &str, category: UnitCategory, qty: &str, cost: &str) -> shared::Ingredient {
        self.registry
            .create(CreateIngredientInput {
                name: name.to_string(),
                category,
                opening_quantity: Some(dec(qty)),
                opening_unit_cost: Some(dec(cost)),
            })
            .await
            .unwrap()
    }
}

// ============================================================================
// Inventory Overview
// ============================================================================

#[tokio::test]
async fn test_overview_totals_stock_value_and_flags_negative_stock() {
    let f = setup();
    let flour = f.ingredient("farinha", UnitCategory::Mass, "1000", "0.005").await;
    f.ingredient("leite", UnitCategory::Volume, "2000", "0.006").await;

    // drive flour negative via a correction
    f.registry
        .record_correction(
            flour.id,
            CorrectionInput {
                quantity_delta: dec("-1500"),
                note: Some("estoque não registrado".to_string()),
            },
        )
        .await
        .unwrap();

    let overview = f.reporting.inventory_overview().await;
    assert_eq!(overview.lines.len(), 2);
    // only the milk contributes positive value: 2000 * 0.006
    assert_eq!(overview.total_stock_value, dec("12.000"));

    assert_eq!(overview.negative_stock.len(), 1);
    let alert = &overview.negative_stock[0];
    assert_eq!(alert.ingredient_id, flour.id);
    assert_eq!(alert.quantity, dec("-500"));
    // 500g at 0.005 to regularize back to zero
    assert_eq!(alert.regularization_cost, dec("2.500"));
}

// ============================================================================
// Sales and Waste Summaries
// ============================================================================

#[tokio::test]
async fn test_sales_summary_excludes_reversed_sales() {
    let f = setup();
    let flour = f.ingredient("farinha", UnitCategory::Mass, "10000", "0.005").await;
    let priced = f
        .catalog
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
    let product = f.catalog.publish_product(priced.recipe.id).await.unwrap();

    let keep = f
        .sales
        .register_sale(SaleInput {
            product_id: product.id,
            quantity: dec("2"),
            unit_price: None,
            customer: CustomerInfo::default(),
        })
        .await
        .unwrap();
    let undo = f
        .sales
        .register_sale(SaleInput {
            product_id: product.id,
            quantity: dec("5"),
            unit_price: None,
            customer: CustomerInfo::default(),
        })
        .await
        .unwrap();
    f.sales.reverse_sale(undo.id).await.unwrap();

    let summary = f.reporting.sales_summary(last_day()).await;
    assert_eq!(summary.sale_count, 1);
    assert_eq!(summary.units_sold, dec("2"));
    assert_eq!(summary.gross_revenue, keep.total);
    // cost of goods: 2 * 500g * 0.005 = 5.00
    assert_eq!(summary.cost_of_goods, dec("5.000"));
    assert_eq!(summary.gross_profit, keep.total - dec("5.000"));

    assert_eq!(summary.by_product.len(), 1);
    assert_eq!(summary.by_product[0].product_id, product.id);
    assert_eq!(summary.by_product[0].name, "PAO");
    assert_eq!(summary.by_product[0].units_sold, dec("2"));
    assert_eq!(summary.by_product[0].gross_revenue, keep.total);
}

#[tokio::test]
async fn test_waste_summary_groups_by_reason() {
    let f = setup();
    let milk = f.ingredient("leite", UnitCategory::Volume, "10000", "0.006").await;

    f.waste
        .register_ingredient_waste(IngredientWasteInput {
            ingredient_id: milk.id,
            quantity: dec("1000"),
            unit: "ml".to_string(),
            reason: WasteReason::Expiration,
            note: None,
        })
        .await
        .unwrap();
    f.waste
        .register_ingredient_waste(IngredientWasteInput {
            ingredient_id: milk.id,
            quantity: dec("500"),
            unit: "ml".to_string(),
            reason: WasteReason::Drop,
            note: None,
        })
        .await
        .unwrap();

    let summary = f.reporting.waste_summary(last_day()).await;
    assert_eq!(summary.event_count, 2);
    // 1000*0.006 + 500*0.006 = 9.00
    assert_eq!(summary.financial_loss, dec("9.000"));
    assert_eq!(summary.by_reason["Expiration"], dec("6.000"));
    assert_eq!(summary.by_reason["Drop"], dec("3.000"));
}

// ============================================================================
// CSV Export
// ============================================================================

#[tokio::test]
async fn test_ledger_export_contains_every_transaction() {
    let f = setup();
    let flour = f.ingredient("farinha", UnitCategory::Mass, "1000", "0.005").await;
    f.registry
        .record_correction(
            flour.id,
            CorrectionInput {
                quantity_delta: dec("-100"),
                note: Some("contagem".to_string()),
            },
        )
        .await
        .unwrap();

    let csv = f.reporting.export_ledger_csv().await.unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    // header + opening purchase + correction
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("id,recorded_at,kind"));
    assert!(csv.contains("FARINHA"));
    assert!(csv.contains("Purchase"));
    assert!(csv.contains("ManualCorrection"));
    assert!(csv.contains("contagem"));
}
