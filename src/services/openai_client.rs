// src/services/openai_client.rs
// DOCUMENTATION: Generative-AI provider client
// PURPOSE: Handle communication with the OpenAI chat-completions API for
// review analysis, search understanding and recommendation rationale

use crate::errors::ApiError;
use crate::models::{QueryExpansion, ReviewAnalysis, SearchIntent};
use crate::services::AiCache;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// OpenAI API client
/// DOCUMENTATION: Handles authentication and API calls to the chat endpoint
pub struct OpenAiClient {
    /// HTTP client for making requests
    client: Client,
    /// API key
    api_key: String,
    /// Base URL for the API
    base_url: String,
    /// Model used for all completions
    model: String,
    /// Shared response cache (LLM calls are paid; results are repeatable)
    cache: Option<Arc<AiCache>>,
}

/// Chat completion request body
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
}

/// One chat message
#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Forces the model to emit a JSON object
#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

/// Chat completion response body
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// API error envelope returned on non-2xx responses
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

impl OpenAiClient {
    /// Create new client
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: "https://api.openai.com/v1".to_string(),
            model,
            cache: None,
        }
    }

    /// Create new client sharing a response cache
    pub fn new_with_cache(api_key: String, model: String, cache: Arc<AiCache>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: "https://api.openai.com/v1".to_string(),
            model,
            cache: Some(cache),
        }
    }

    /// Whether an API key has been configured
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Run one JSON-mode chat completion, with caching
    /// DOCUMENTATION: Returns the raw JSON string emitted by the model.
    /// The operation name scopes the cache key so different prompts over
    /// the same text do not collide.
    async fn complete_json(
        &self,
        operation: &str,
        system: &str,
        prompt: &str,
    ) -> Result<String, ApiError> {
        if !self.is_configured() {
            return Err(ApiError::ExternalApiError(
                "OpenAI API key not configured".to_string(),
            ));
        }

        let cache_key = AiCache::generate_key(operation, prompt);
        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.get(&cache_key).await {
                return Ok(cached);
            }
        }

        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            temperature: 0.2,
            max_tokens: 800,
            response_format: ResponseFormat {
                format_type: "json_object".to_string(),
            },
        };

        log::debug!("OpenAI request: operation={} model={}", operation, self.model);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                log::error!("OpenAI API request failed: {}", e);
                ApiError::ExternalApiError(format!("Request failed: {}", e))
            })?;

        let status = response.status();
        if status.as_u16() == 429 {
            log::error!("OpenAI API quota exceeded");
            return Err(ApiError::RateLimitExceeded);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorResponse>(&body)
                .ok()
                .and_then(|e| e.error)
                .map(|e| e.message)
                .unwrap_or(body);
            log::error!("OpenAI API error {}: {}", status, message);
            return Err(ApiError::ExternalApiError(format!(
                "API error {}: {}",
                status, message
            )));
        }

        let api_response: ChatResponse = response.json().await.map_err(|e| {
            log::error!("Failed to parse OpenAI response: {}", e);
            ApiError::ExternalApiError(format!("Parse error: {}", e))
        })?;

        let content = api_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ApiError::ExternalApiError("Empty completion".to_string()))?;

        if let Some(cache) = &self.cache {
            cache.set(cache_key, content.clone()).await;
        }

        Ok(content)
    }

    /// Analyze a review text into sentiment, category scores and tags
    /// DOCUMENTATION: The platform serves Turkish reviews; the prompt tells
    /// the model so, but any language in the content is analyzed as-is
    pub async fn analyze_review(
        &self,
        review_text: &str,
        business_type: &str,
    ) -> Result<ReviewAnalysis, ApiError> {
        let prompt = format!(
            r#"Analyze this business review (usually Turkish). Business type: "{business_type}".

Review: "{review_text}"

Respond with a JSON object:
{{
  "sentiment": "VERY_NEGATIVE|NEGATIVE|NEUTRAL|POSITIVE|VERY_POSITIVE",
  "score": overall score 0-10,
  "categories": {{
    "taste": 0-10,
    "service": 0-10,
    "cleanliness": 0-10,
    "price": 0-10,
    "atmosphere": 0-10
  }},
  "summary": "one sentence summary",
  "tags": ["topic tags, max 10"],
  "confidence": 0-1
}}"#
        );

        let content = self
            .complete_json(
                "analyze_review",
                "You analyze customer reviews of local businesses and answer only with JSON.",
                &prompt,
            )
            .await?;

        let analysis: ReviewAnalysis = serde_json::from_str(&content).map_err(|e| {
            log::error!("Malformed review analysis from model: {}", e);
            ApiError::ExternalApiError(format!("Parse error: {}", e))
        })?;

        Ok(analysis.normalized())
    }

    /// Interpret a natural-language search query into intent and filters
    pub async fn extract_search_intent(
        &self,
        query: &str,
        context: &Value,
    ) -> Result<SearchIntent, ApiError> {
        let prompt = format!(
            r#"The user typed this natural-language search on a local business directory: "{query}"

Request context: {context}

Understand what the user wants and respond with a JSON object:
{{
  "interpretation": "what the user is looking for",
  "intent": "find_restaurant|find_cafe|find_service|compare_options|check_hours|other",
  "search_terms": ["key", "words"],
  "filters": {{
    "category": "category or null",
    "open_now": true/false/null,
    "price_range": ["BUDGET","MODERATE","EXPENSIVE","LUXURY"] or null,
    "min_rating": number or null,
    "radius_km": number or null
  }},
  "suggestions": ["alternative searches"],
  "confidence": 0-1
}}

Examples:
- "çok acıktım hızlıca bir şeyler yemek istiyorum" -> intent find_restaurant, open_now true
- "romantik bir akşam yemeği için güzel bir yer" -> price_range ["EXPENSIVE","LUXURY"]
- "sabah kahvesi içebileceğim yakın kafe" -> intent find_cafe, radius_km small"#
        );

        let content = self
            .complete_json(
                "search_intent",
                "You extract structured search intent from natural-language queries and answer only with JSON.",
                &prompt,
            )
            .await?;

        let mut intent: SearchIntent = serde_json::from_str(&content).map_err(|e| {
            log::error!("Malformed search intent from model: {}", e);
            ApiError::ExternalApiError(format!("Parse error: {}", e))
        })?;

        intent.confidence = intent.confidence.clamp(0.0, 1.0);
        Ok(intent)
    }

    /// Expand a keyword query with synonyms and related searches
    pub async fn expand_query(&self, query: &str) -> Result<QueryExpansion, ApiError> {
        let prompt = format!(
            r#"Expand this local-business search query with synonyms so a keyword matcher finds more relevant results. Keep the language of the query.

Query: "{query}"

Respond with a JSON object:
{{
  "enhanced_query": "original terms plus synonyms, space separated",
  "related_searches": ["up to 5 related search strings"]
}}"#
        );

        let content = self
            .complete_json(
                "expand_query",
                "You expand search queries for a business directory and answer only with JSON.",
                &prompt,
            )
            .await?;

        serde_json::from_str(&content).map_err(|e| {
            log::error!("Malformed query expansion from model: {}", e);
            ApiError::ExternalApiError(format!("Parse error: {}", e))
        })
    }

    /// One-paragraph digest of recent reviews for a business listing
    pub async fn summarize_reviews(
        &self,
        business_name: &str,
        review_texts: &[String],
    ) -> Result<String, ApiError> {
        let joined = review_texts.join("\n---\n");
        let prompt = format!(
            r#"Recent customer reviews for "{business_name}":

{joined}

Write a neutral one-paragraph digest (Turkish) of what customers praise and criticize. Respond with a JSON object: {{"summary": "..."}}"#
        );

        let content = self
            .complete_json(
                "summarize_reviews",
                "You summarize customer reviews for business listings and answer only with JSON.",
                &prompt,
            )
            .await?;

        #[derive(Deserialize)]
        struct Summary {
            summary: String,
        }

        let parsed: Summary = serde_json::from_str(&content).map_err(|e| {
            log::error!("Malformed review summary from model: {}", e);
            ApiError::ExternalApiError(format!("Parse error: {}", e))
        })?;

        Ok(parsed.summary)
    }

    /// Short personalized strategy note for a recommendation batch
    pub async fn recommendation_note(
        &self,
        profile: &Value,
        recommendation_type: &str,
    ) -> Result<String, ApiError> {
        let prompt = format!(
            r#"User taste profile: {profile}
Recommendation type: {recommendation_type}

Write one short, friendly sentence (Turkish) explaining what these recommendations focus on for this user. Respond with a JSON object: {{"note": "..."}}"#
        );

        let content = self
            .complete_json(
                "recommendation_note",
                "You write one-line personalization notes for a business directory and answer only with JSON.",
                &prompt,
            )
            .await?;

        #[derive(Deserialize)]
        struct Note {
            note: String,
        }

        let parsed: Note = serde_json::from_str(&content).map_err(|e| {
            log::error!("Malformed recommendation note from model: {}", e);
            ApiError::ExternalApiError(format!("Parse error: {}", e))
        })?;

        Ok(parsed.note)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_analysis_parsing() {
        let content = r#"{
            "sentiment": "POSITIVE",
            "score": 7.5,
            "categories": {"taste": 8, "service": 7, "cleanliness": 9, "price": 6, "atmosphere": 7},
            "summary": "Customers praise the food and the quick service.",
            "tags": ["taste", "service"],
            "confidence": 0.9
        }"#;

        let analysis: ReviewAnalysis = serde_json::from_str(content).unwrap();
        let analysis = analysis.normalized();
        assert_eq!(analysis.sentiment, "POSITIVE");
        assert_eq!(analysis.categories.cleanliness, 9.0);
        assert_eq!(analysis.tags.len(), 2);
    }

    #[test]
    fn test_search_intent_parsing_with_missing_fields() {
        // Models routinely omit nullable fields; defaults must absorb that
        let content = r#"{
            "interpretation": "user wants a nearby open cafe",
            "intent": "find_cafe",
            "filters": {"open_now": true}
        }"#;

        let intent: SearchIntent = serde_json::from_str(content).unwrap();
        assert_eq!(intent.intent, "find_cafe");
        assert_eq!(intent.filters.open_now, Some(true));
        assert!(intent.filters.category.is_none());
        assert!(intent.search_terms.is_empty());
        assert_eq!(intent.confidence, 0.5);
    }

    #[test]
    fn test_unconfigured_client() {
        let client = OpenAiClient::new(String::new(), "gpt-4-turbo-preview".to_string());
        assert!(!client.is_configured());
    }
}
