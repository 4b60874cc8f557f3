//! Error handling for the Costbook ledger
//!
//! Provides consistent error responses in English and Portuguese

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Unit normalization errors
    #[error("Unsupported unit: {0}")]
    UnsupportedUnit(String),

    #[error("Unit {unit} does not match the ingredient's {category} category")]
    CategoryMismatch { unit: String, category: String },

    #[error("Cannot merge ingredients with different base-unit categories")]
    IncompatibleUnits {
        source_category: String,
        target_category: String,
    },

    // Validation errors
    #[error("Validation error: {message}")]
    Validation {
        field: String,
        message: String,
        message_pt: String,
    },

    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    // Registry / catalog errors
    #[error("Unknown ingredient: {0}")]
    UnknownIngredient(Uuid),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Costing errors
    #[error("Invalid margin: {0}%")]
    InvalidMargin(Decimal),

    #[error("Invalid price: {0}")]
    InvalidPrice(Decimal),

    // Stock movement errors
    #[error("Insufficient stock of {ingredient}: requested {requested}, available {available}")]
    InsufficientStock {
        ingredient: String,
        requested: Decimal,
        available: Decimal,
    },

    #[error("Concurrent modification of {0} persisted after retries")]
    ConcurrencyConflict(String),

    // Reversal errors
    #[error("Event {0} was already reversed")]
    AlreadyReversed(Uuid),

    #[error("Sale not found: {0}")]
    SaleNotFound(Uuid),

    #[error("Waste event not found: {0}")]
    WasteEventNotFound(Uuid),

    // External service errors
    #[error("Receipt extraction error: {0}")]
    ExtractionError(String),

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl From<shared::UnitError> for AppError {
    fn from(err: shared::UnitError) -> Self {
        match err {
            shared::UnitError::UnsupportedUnit(unit) => AppError::UnsupportedUnit(unit),
            shared::UnitError::CategoryMismatch { unit, expected } => AppError::CategoryMismatch {
                unit: unit.to_string(),
                category: format!("{:?}", expected).to_lowercase(),
            },
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message_en: String,
    pub message_pt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::UnsupportedUnit(unit) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "UNSUPPORTED_UNIT".to_string(),
                    message_en: format!("Unsupported unit: {}", unit),
                    message_pt: format!("Unidade não suportada: {}", unit),
                    field: Some("unit".to_string()),
                },
            ),
            AppError::CategoryMismatch { unit, category } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "CATEGORY_MISMATCH".to_string(),
                    message_en: format!(
                        "Unit {} does not match the ingredient's {} category",
                        unit, category
                    ),
                    message_pt: format!(
                        "A unidade {} não corresponde à categoria {} do ingrediente",
                        unit, category
                    ),
                    field: Some("unit".to_string()),
                },
            ),
            AppError::IncompatibleUnits {
                source_category,
                target_category,
            } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "INCOMPATIBLE_UNITS".to_string(),
                    message_en: format!(
                        "Cannot merge a {} ingredient into a {} ingredient",
                        source_category, target_category
                    ),
                    message_pt: format!(
                        "Não é possível unificar um ingrediente de {} com um de {}",
                        source_category, target_category
                    ),
                    field: None,
                },
            ),
            AppError::Validation {
                field,
                message,
                message_pt,
            } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message_en: message.clone(),
                    message_pt: message_pt.clone(),
                    field: Some(field.clone()),
                },
            ),
            AppError::DuplicateEntry(name) => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "DUPLICATE_ENTRY".to_string(),
                    message_en: format!("A record named {} already exists", name),
                    message_pt: format!("Já existe um registro com o nome {}", name),
                    field: Some("name".to_string()),
                },
            ),
            AppError::UnknownIngredient(id) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "UNKNOWN_INGREDIENT".to_string(),
                    message_en: format!("Ingredient {} is not in the registry", id),
                    message_pt: format!("O ingrediente {} não está no cadastro", id),
                    field: None,
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "NOT_FOUND".to_string(),
                    message_en: format!("{} not found", resource),
                    message_pt: format!("{} não encontrado", resource),
                    field: None,
                },
            ),
            AppError::InvalidMargin(margin) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "INVALID_MARGIN".to_string(),
                    message_en: format!("Margin must be at least 0 and below 100, got {}", margin),
                    message_pt: format!("A margem deve ser no mínimo 0 e menor que 100, recebido {}", margin),
                    field: Some("margin_percent".to_string()),
                },
            ),
            AppError::InvalidPrice(price) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "INVALID_PRICE".to_string(),
                    message_en: format!("Price must be positive, got {}", price),
                    message_pt: format!("O preço deve ser positivo, recebido {}", price),
                    field: Some("sale_price".to_string()),
                },
            ),
            AppError::InsufficientStock {
                ingredient,
                requested,
                available,
            } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "INSUFFICIENT_STOCK".to_string(),
                    message_en: format!(
                        "Insufficient stock of {}: requested {}, available {}",
                        ingredient, requested, available
                    ),
                    message_pt: format!(
                        "Estoque insuficiente de {}: necessário {}, disponível {}",
                        ingredient, requested, available
                    ),
                    field: None,
                },
            ),
            AppError::ConcurrencyConflict(resource) => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "CONCURRENCY_CONFLICT".to_string(),
                    message_en: format!(
                        "{} was modified concurrently too many times, please retry",
                        resource
                    ),
                    message_pt: format!(
                        "{} foi modificado simultaneamente, tente novamente",
                        resource
                    ),
                    field: None,
                },
            ),
            AppError::AlreadyReversed(id) => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "ALREADY_REVERSED".to_string(),
                    message_en: format!("Event {} was already reversed", id),
                    message_pt: format!("O evento {} já foi estornado", id),
                    field: None,
                },
            ),
            AppError::SaleNotFound(id) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "SALE_NOT_FOUND".to_string(),
                    message_en: format!("Sale {} not found", id),
                    message_pt: format!("Venda {} não encontrada", id),
                    field: None,
                },
            ),
            AppError::WasteEventNotFound(id) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "WASTE_EVENT_NOT_FOUND".to_string(),
                    message_en: format!("Waste event {} not found", id),
                    message_pt: format!("Registro de desperdício {} não encontrado", id),
                    field: None,
                },
            ),
            AppError::ExtractionError(msg) => (
                StatusCode::BAD_GATEWAY,
                ErrorDetail {
                    code: "EXTRACTION_ERROR".to_string(),
                    message_en: format!("Receipt extraction error: {}", msg),
                    message_pt: format!("Erro na leitura da nota: {}", msg),
                    field: None,
                },
            ),
            AppError::ExternalService(msg) => (
                StatusCode::BAD_GATEWAY,
                ErrorDetail {
                    code: "EXTERNAL_SERVICE_ERROR".to_string(),
                    message_en: format!("External service error: {}", msg),
                    message_pt: format!("Erro em serviço externo: {}", msg),
                    field: None,
                },
            ),
            AppError::Configuration(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "CONFIGURATION_ERROR".to_string(),
                    message_en: format!("Configuration error: {}", msg),
                    message_pt: format!("Erro de configuração: {}", msg),
                    field: None,
                },
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message_en: msg.clone(),
                    message_pt: "Erro interno do servidor".to_string(),
                    field: None,
                },
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message_en: "An internal server error occurred".to_string(),
                    message_pt: "Erro interno do servidor".to_string(),
                    field: None,
                },
            ),
        };

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
