//! HTTP handlers for purchase intake

use axum::{extract::State, Json};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::Deserialize;
use shared::{ExtractedLine, ExtractedReceipt, StockTransaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::purchase::{
    MatchPolicy, PurchaseInput, PurchaseOutcome, PurchaseService, RecordedPurchase,
};
use crate::AppState;

#[derive(Deserialize)]
pub struct ReceiptUpload {
    /// Base64-encoded receipt photo
    pub image_base64: String,
    /// Image MIME type, e.g. image/jpeg
    pub mime_type: String,
}

#[derive(Deserialize)]
pub struct ConfirmLineInput {
    pub line: ExtractedLine,
    pub ingredient_id: Uuid,
}

fn purchase_service(state: &AppState) -> PurchaseService {
    PurchaseService::new(
        state.store.clone(),
        state.extractor.clone(),
        state.matcher.clone(),
        MatchPolicy::from(&state.config.matching),
    )
}

/// Record a manual purchase
pub async fn record_purchase(
    State(state): State<AppState>,
    Json(input): Json<PurchaseInput>,
) -> AppResult<Json<StockTransaction>> {
    let txn = purchase_service(&state).record_purchase(input).await?;
    Ok(Json(txn))
}

/// Extract structured line items from a receipt photo
pub async fn extract_receipt(
    State(state): State<AppState>,
    Json(upload): Json<ReceiptUpload>,
) -> AppResult<Json<ExtractedReceipt>> {
    let image = BASE64
        .decode(&upload.image_base64)
        .map_err(|e| AppError::Validation {
            field: "image_base64".to_string(),
            message: format!("Invalid base64 image: {}", e),
            message_pt: "Imagem em base64 inválida".to_string(),
        })?;
    let receipt = purchase_service(&state)
        .extract_receipt(&image, &upload.mime_type)
        .await?;
    Ok(Json(receipt))
}

/// Resolve and record the lines of an extracted receipt
pub async fn process_receipt(
    State(state): State<AppState>,
    Json(receipt): Json<ExtractedReceipt>,
) -> AppResult<Json<PurchaseOutcome>> {
    let outcome = purchase_service(&state).process_receipt(receipt).await?;
    Ok(Json(outcome))
}

/// Record a pending receipt line against the ingredient the operator chose
pub async fn confirm_receipt_line(
    State(state): State<AppState>,
    Json(input): Json<ConfirmLineInput>,
) -> AppResult<Json<RecordedPurchase>> {
    let recorded = purchase_service(&state)
        .confirm_line(input.line, input.ingredient_id)
        .await?;
    Ok(Json(recorded))
}
