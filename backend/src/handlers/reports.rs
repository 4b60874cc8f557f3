//! HTTP handlers for reports and data export

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Json,
};

use crate::error::AppResult;
use crate::services::reporting::{InventoryOverview, ReportingService, SalesSummary, WasteSummary};
use crate::AppState;

use super::ledger::RangeQuery;

/// Current stock position with negative-stock alerts
pub async fn inventory_overview(State(state): State<AppState>) -> Json<InventoryOverview> {
    let service = ReportingService::new(state.store.clone());
    Json(service.inventory_overview().await)
}

/// Sales aggregation over a time range
pub async fn sales_summary(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> Json<SalesSummary> {
    let service = ReportingService::new(state.store.clone());
    Json(service.sales_summary(query.to_range()).await)
}

/// Waste aggregation over a time range
pub async fn waste_summary(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> Json<WasteSummary> {
    let service = ReportingService::new(state.store.clone());
    Json(service.waste_summary(query.to_range()).await)
}

/// Export the full ledger as CSV
pub async fn export_ledger(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let service = ReportingService::new(state.store.clone());
    let csv = service.export_ledger_csv().await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"ledger.csv\"",
            ),
        ],
        csv,
    ))
}
