//! Reporting
//!
//! Read-only aggregations over the registry, sales and waste records, plus
//! a CSV export of the full ledger. Reversed events are excluded from the
//! summaries; their transactions still appear in the export, which is the
//! audit surface.

use std::collections::BTreeMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use shared::{EventRef, TimeRange, UnitCategory, WasteReason};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::store::Store;

/// Reporting service
#[derive(Clone)]
pub struct ReportingService {
    store: Arc<dyn Store>,
}

/// Stock position of one ingredient
#[derive(Debug, Clone, Serialize)]
pub struct StockLine {
    pub ingredient_id: Uuid,
    pub name: String,
    pub category: UnitCategory,
    pub quantity: Decimal,
    pub avg_unit_cost: Decimal,
    pub stock_value: Decimal,
}

/// An ingredient whose cached quantity is below zero, with the cost of
/// purchasing back to zero at the current average
#[derive(Debug, Clone, Serialize)]
pub struct NegativeStockAlert {
    pub ingredient_id: Uuid,
    pub name: String,
    pub quantity: Decimal,
    pub regularization_cost: Decimal,
}

/// Current inventory position
#[derive(Debug, Clone, Serialize)]
pub struct InventoryOverview {
    pub lines: Vec<StockLine>,
    pub total_stock_value: Decimal,
    pub negative_stock: Vec<NegativeStockAlert>,
}

/// Units and revenue of a single product within a sales summary
#[derive(Debug, Clone, Serialize)]
pub struct ProductSales {
    pub product_id: Uuid,
    pub name: String,
    pub units_sold: Decimal,
    pub gross_revenue: Decimal,
}

/// Sales aggregation over a time range
#[derive(Debug, Clone, Serialize)]
pub struct SalesSummary {
    pub sale_count: usize,
    pub units_sold: Decimal,
    pub gross_revenue: Decimal,
    /// Ingredient cost of the goods sold, at the averages in effect at each
    /// sale
    pub cost_of_goods: Decimal,
    pub gross_profit: Decimal,
    /// Best sellers first
    pub by_product: Vec<ProductSales>,
}

/// Waste aggregation over a time range
#[derive(Debug, Clone, Serialize)]
pub struct WasteSummary {
    pub event_count: usize,
    pub financial_loss: Decimal,
    pub opportunity_loss: Decimal,
    pub by_reason: BTreeMap<String, Decimal>,
}

impl ReportingService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Current stock position of every active ingredient, with negative
    /// quantities surfaced as alerts
    pub async fn inventory_overview(&self) -> InventoryOverview {
        let mut lines = Vec::new();
        let mut negative_stock = Vec::new();
        let mut total_stock_value = Decimal::ZERO;

        let mut ingredients = self.store.list_ingredients();
        ingredients.retain(|i| i.is_active());
        ingredients.sort_by(|a, b| a.name.cmp(&b.name));

        for ingredient in ingredients {
            let stock_value = ingredient.stock_value();
            if ingredient.quantity < Decimal::ZERO {
                negative_stock.push(NegativeStockAlert {
                    ingredient_id: ingredient.id,
                    name: ingredient.name.clone(),
                    quantity: ingredient.quantity,
                    regularization_cost: -ingredient.quantity * ingredient.avg_unit_cost,
                });
            } else {
                total_stock_value += stock_value;
            }
            lines.push(StockLine {
                ingredient_id: ingredient.id,
                name: ingredient.name,
                category: ingredient.category,
                quantity: ingredient.quantity,
                avg_unit_cost: ingredient.avg_unit_cost,
                stock_value,
            });
        }
        InventoryOverview {
            lines,
            total_stock_value,
            negative_stock,
        }
    }

    /// Revenue, cost of goods and profit for sales recorded within the range
    pub async fn sales_summary(&self, range: TimeRange) -> SalesSummary {
        let mut summary = SalesSummary {
            sale_count: 0,
            units_sold: Decimal::ZERO,
            gross_revenue: Decimal::ZERO,
            cost_of_goods: Decimal::ZERO,
            gross_profit: Decimal::ZERO,
            by_product: Vec::new(),
        };
        let mut per_product: BTreeMap<Uuid, ProductSales> = BTreeMap::new();
        for sale in self.store.list_sales() {
            if sale.reversed || !range.contains(sale.recorded_at) {
                continue;
            }
            summary.sale_count += 1;
            summary.units_sold += sale.quantity;
            summary.gross_revenue += sale.total;
            for txn_id in &sale.consumption_txns {
                if let Some(txn) = self.store.get_transaction(*txn_id) {
                    summary.cost_of_goods += -txn.quantity_delta * txn.unit_cost;
                }
            }
            let entry = per_product
                .entry(sale.product_id)
                .or_insert_with(|| ProductSales {
                    product_id: sale.product_id,
                    name: self
                        .store
                        .get_product(sale.product_id)
                        .map(|p| p.name)
                        .unwrap_or_default(),
                    units_sold: Decimal::ZERO,
                    gross_revenue: Decimal::ZERO,
                });
            entry.units_sold += sale.quantity;
            entry.gross_revenue += sale.total;
        }
        summary.gross_profit = summary.gross_revenue - summary.cost_of_goods;
        summary.by_product = per_product.into_values().collect();
        summary
            .by_product
            .sort_by(|a, b| b.units_sold.cmp(&a.units_sold));
        summary
    }

    /// Losses registered within the range, broken down by reason
    pub async fn waste_summary(&self, range: TimeRange) -> WasteSummary {
        let mut summary = WasteSummary {
            event_count: 0,
            financial_loss: Decimal::ZERO,
            opportunity_loss: Decimal::ZERO,
            by_reason: WasteReason::ALL
                .iter()
                .map(|r| (format!("{:?}", r), Decimal::ZERO))
                .collect(),
        };
        for event in self.store.list_waste_events() {
            if event.reversed || !range.contains(event.recorded_at) {
                continue;
            }
            summary.event_count += 1;
            summary.financial_loss += event.financial_loss;
            summary.opportunity_loss += event.opportunity_loss;
            *summary
                .by_reason
                .entry(format!("{:?}", event.reason))
                .or_insert(Decimal::ZERO) += event.financial_loss;
        }
        summary
    }

    /// The full ledger as CSV, one row per transaction in append order
    pub async fn export_ledger_csv(&self) -> AppResult<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record([
                "id",
                "recorded_at",
                "kind",
                "ingredient_id",
                "ingredient_name",
                "quantity_delta",
                "unit_cost",
                "value",
                "correction",
                "parent_event",
                "reverses",
                "note",
            ])
            .map_err(|e| AppError::Internal(e.to_string()))?;

        for txn in self.store.all_transactions() {
            let ingredient_name = self
                .store
                .get_ingredient(txn.ingredient_id)
                .map(|i| i.name)
                .unwrap_or_default();
            let parent = match txn.parent_event {
                Some(EventRef::Sale(id)) => format!("sale:{}", id),
                Some(EventRef::Waste(id)) => format!("waste:{}", id),
                None => String::new(),
            };
            writer
                .write_record([
                    txn.id.to_string(),
                    txn.recorded_at.to_rfc3339(),
                    format!("{:?}", txn.kind),
                    txn.ingredient_id.to_string(),
                    ingredient_name,
                    txn.quantity_delta.to_string(),
                    txn.unit_cost.to_string(),
                    (txn.quantity_delta * txn.unit_cost).to_string(),
                    txn.correction.to_string(),
                    parent,
                    txn.reverses.map(|id| id.to_string()).unwrap_or_default(),
                    txn.note.unwrap_or_default(),
                ])
                .map_err(|e| AppError::Internal(e.to_string()))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| AppError::Internal(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| AppError::Internal(e.to_string()))
    }
}
