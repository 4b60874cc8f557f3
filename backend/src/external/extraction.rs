//! Receipt extraction collaborator
//!
//! Sends a receipt photo to a vision-capable chat-completions endpoint and
//! parses the structured line items out of the reply.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::Deserialize;
use serde_json::json;
use shared::ExtractedReceipt;

use crate::config::ExtractionConfig;
use crate::error::{AppError, AppResult};

const EXTRACTION_PROMPT: &str = "\
Read this purchase receipt and return ONLY a JSON object, no prose:
{
  \"store\": \"store name or null\",
  \"date\": \"YYYY-MM-DD or null\",
  \"lines\": [
    {\"raw_name\": \"item name as printed\", \"quantity\": 1.5, \"unit\": \"kg\", \"unit_price\": 12.90}
  ]
}
Quantities and prices are decimal numbers. The unit is the unit printed on
the receipt (kg, g, l, ml, un, dz...). Skip non-ingredient lines such as
taxes, discounts and totals.";

/// Extracts structured line items from a receipt image
#[async_trait]
pub trait ReceiptExtractor: Send + Sync {
    async fn extract(&self, image: &[u8], mime_type: &str) -> AppResult<ExtractedReceipt>;
}

/// Extractor backed by an OpenAI-compatible chat-completions endpoint
pub struct OpenAiExtractor {
    client: reqwest::Client,
    config: ExtractionConfig,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// Model replies sometimes wrap the JSON in a fenced code block; strip it
pub(crate) fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

impl OpenAiExtractor {
    pub fn new(config: ExtractionConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl ReceiptExtractor for OpenAiExtractor {
    async fn extract(&self, image: &[u8], mime_type: &str) -> AppResult<ExtractedReceipt> {
        let data_url = format!("data:{};base64,{}", mime_type, BASE64.encode(image));
        let body = json!({
            "model": self.config.model,
            "messages": [{
                "role": "user",
                "content": [
                    {"type": "text", "text": EXTRACTION_PROMPT},
                    {"type": "image_url", "image_url": {"url": data_url}}
                ]
            }],
            "temperature": 0.0,
        });

        let response = self
            .client
            .post(&self.config.api_endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalService(format!(
                "extraction endpoint returned {}: {}",
                status, detail
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::ExternalService(e.to_string()))?;
        let content = parsed
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .ok_or_else(|| AppError::ExtractionError("empty model reply".to_string()))?;

        let receipt: ExtractedReceipt = serde_json::from_str(strip_code_fences(content))
            .map_err(|e| AppError::ExtractionError(format!("unparseable model reply: {}", e)))?;
        tracing::debug!(lines = receipt.lines.len(), "receipt extracted");
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("  {\"a\":1}  "), "{\"a\":1}");
    }

    #[test]
    fn test_receipt_parses_from_model_reply() {
        let reply = r#"```json
        {
            "store": "Mercado Central",
            "date": "2025-03-10",
            "lines": [
                {"raw_name": "ACUCAR CRISTAL", "quantity": 2, "unit": "kg", "unit_price": 4.99}
            ]
        }
        ```"#;
        let receipt: ExtractedReceipt =
            serde_json::from_str(strip_code_fences(reply)).unwrap();
        assert_eq!(receipt.store.as_deref(), Some("Mercado Central"));
        assert_eq!(receipt.lines.len(), 1);
        assert_eq!(receipt.lines[0].unit, "kg");
    }
}
