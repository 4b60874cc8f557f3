//! Ingredient-name matching collaborator
//!
//! Decides whether a raw receipt name refers to an ingredient already in the
//! registry. Exact normalized-name hits are resolved locally by the purchase
//! service; only the fuzzy cases reach this collaborator.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use shared::Ingredient;
use uuid::Uuid;

use crate::config::MatchingConfig;
use crate::error::{AppError, AppResult};

use super::extraction::strip_code_fences;

/// Matcher verdict for one raw name
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchOutcome {
    /// The raw name refers to this registry ingredient with the given
    /// confidence in [0, 1]
    Match {
        ingredient_id: Uuid,
        confidence: f32,
    },
    NoMatch,
}

/// Resolves raw receipt names against registry candidates
#[async_trait]
pub trait NameMatcher: Send + Sync {
    async fn best_match(
        &self,
        raw_name: &str,
        candidates: &[Ingredient],
    ) -> AppResult<MatchOutcome>;
}

/// Matcher backed by an OpenAI-compatible chat-completions endpoint
pub struct OpenAiMatcher {
    client: reqwest::Client,
    config: MatchingConfig,
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

#[derive(Deserialize)]
struct MatchReply {
    /// Exact name of the chosen candidate, or null when nothing matches
    name: Option<String>,
    #[serde(default)]
    confidence: f32,
}

impl OpenAiMatcher {
    pub fn new(config: MatchingConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl NameMatcher for OpenAiMatcher {
    async fn best_match(
        &self,
        raw_name: &str,
        candidates: &[Ingredient],
    ) -> AppResult<MatchOutcome> {
        if candidates.is_empty() {
            return Ok(MatchOutcome::NoMatch);
        }
        let names: Vec<&str> = candidates.iter().map(|i| i.name.as_str()).collect();
        let prompt = format!(
            "A purchase receipt lists the item \"{}\". Which of these registered \
ingredients is it, if any?\n{}\nReturn ONLY a JSON object \
{{\"name\": \"<exact candidate name or null>\", \"confidence\": <0.0-1.0>}}. \
Consider abbreviations, brands and misspellings; null when none fit.",
            raw_name,
            names.join("\n"),
        );
        let body = json!({
            "model": self.config.model,
            "messages": [{"role": "user", "content": prompt}],
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
                "matching endpoint returned {}: {}",
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
            .ok_or_else(|| AppError::ExternalService("empty matcher reply".to_string()))?;
        let reply: MatchReply = serde_json::from_str(strip_code_fences(content))
            .map_err(|e| AppError::ExternalService(format!("unparseable matcher reply: {}", e)))?;

        match reply.name {
            Some(name) => match candidates.iter().find(|i| i.name == name) {
                Some(ingredient) => Ok(MatchOutcome::Match {
                    ingredient_id: ingredient.id,
                    confidence: reply.confidence.clamp(0.0, 1.0),
                }),
                // hallucinated a name outside the candidate list
                None => Ok(MatchOutcome::NoMatch),
            },
            None => Ok(MatchOutcome::NoMatch),
        }
    }
}
