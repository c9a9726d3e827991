//! Completion engine: cache lookup, model call, usage logging
//!
//! The engine never propagates provider failures to callers; they are
//! converted into a safe fallback outcome. Cache keys are content hashes of
//! the rendered prompt text (system prompt included), so identical prompts
//! share one entry across requests.

use std::sync::Arc;
use std::time::Instant;

use sha2::Digest;
use sha2::Sha256;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::config::AppConfig;
use crate::database::UsageSink;
use crate::models::RecordUsageRequest;
use crate::Result;

pub mod cache;
pub mod provider;

pub use cache::CachedCompletion;
pub use cache::CompletionCache;
pub use provider::ChatMessage;
pub use provider::HttpModelProvider;
pub use provider::ModelProvider;

/// Fixed answer returned when no model credential is configured
const UNAVAILABLE_ANSWER: &str = "AI service is currently unavailable.";

/// Fixed user-safe answer returned on provider failure
const FALLBACK_ANSWER: &str = "Sorry, I encountered an error processing your request.";

/// A fully assembled completion request
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Rendered user-role prompt
    pub prompt: String,
    /// Rendered system prompt
    pub system_prompt: String,
    /// Sampling temperature; falls back to the configured default
    pub temperature: Option<f32>,
    /// Token limit; falls back to the configured default
    pub max_tokens: Option<u32>,
    pub use_cache: bool,
    /// Opaque caller session id, stored on usage records
    pub session_id: String,
    /// Free-form metadata stored on usage records
    pub metadata: serde_json::Value,
}

/// Result of a completion call; failures are folded in rather than raised
#[derive(Debug, Clone)]
pub struct CompletionOutcome {
    pub answer: String,
    pub tokens_used: i64,
    pub cost_usd: f64,
    pub duration_seconds: f64,
    pub cached: bool,
    /// Operator-facing error description; `None` on success
    pub error: Option<String>,
}

impl CompletionOutcome {
    fn unavailable() -> Self {
        Self {
            answer: UNAVAILABLE_ANSWER.to_string(),
            tokens_used: 0,
            cost_usd: 0.0,
            duration_seconds: 0.0,
            cached: false,
            error: Some("model credential not configured".to_string()),
        }
    }

    fn failed(error: String) -> Self {
        Self {
            answer: FALLBACK_ANSWER.to_string(),
            tokens_used: 0,
            cost_usd: 0.0,
            duration_seconds: 0.0,
            cached: false,
            error: Some(error),
        }
    }

    fn from_cached(completion: CachedCompletion) -> Self {
        Self {
            answer: completion.answer,
            tokens_used: completion.tokens_used,
            cost_usd: completion.cost_usd,
            duration_seconds: completion.duration_seconds,
            cached: true,
            error: None,
        }
    }
}

/// Completion engine with caching and usage logging
pub struct LlmService {
    provider: Option<Arc<dyn ModelProvider>>,
    cache: CompletionCache,
    usage: Arc<dyn UsageSink>,
    model: String,
    default_temperature: f32,
    default_max_tokens: u32,
    cost_per_token: f64,
}

impl LlmService {
    /// Create the engine from configuration.
    ///
    /// A missing API key is not an error: the engine is constructed without
    /// a provider and every call short-circuits to an unavailable result.
    pub fn new(config: &AppConfig, usage: Arc<dyn UsageSink>) -> Result<Self> {
        let provider: Option<Arc<dyn ModelProvider>> = if config.llm_configured() {
            Some(Arc::new(HttpModelProvider::new(&config.llm)?))
        } else {
            warn!("No model API key configured; completions will be unavailable");
            None
        };

        Ok(Self {
            provider,
            cache: CompletionCache::with_config(config.cache.clone()),
            usage,
            model: config.llm.model.clone(),
            default_temperature: config.llm.temperature,
            default_max_tokens: config.llm.max_tokens,
            cost_per_token: config.llm.cost_per_token_usd,
        })
    }

    /// Create the engine from explicit parts (tests, custom wiring)
    pub fn from_parts(
        provider: Option<Arc<dyn ModelProvider>>,
        cache: CompletionCache,
        usage: Arc<dyn UsageSink>,
        model: impl Into<String>,
        cost_per_token: f64,
    ) -> Self {
        Self {
            provider,
            cache,
            usage,
            model: model.into(),
            default_temperature: 0.7,
            default_max_tokens: 1000,
            cost_per_token,
        }
    }

    /// Cache statistics for monitoring
    pub async fn cache_stats(&self) -> cache::CacheStats {
        self.cache.stats().await
    }

    /// Execute a completion request.
    ///
    /// Cache hit: returns the stored result with `cached = true` and makes
    /// no external call. Cache miss: calls the provider, stores the result,
    /// and appends a usage record. Provider failures become a fallback
    /// outcome; nothing is cached or logged for them.
    pub async fn complete(&self, request: CompletionRequest) -> CompletionOutcome {
        let Some(provider) = &self.provider else {
            return CompletionOutcome::unavailable();
        };

        let key = cache_key(&request.system_prompt, &request.prompt);

        if request.use_cache {
            if let Some(hit) = self.cache.get(&key).await {
                return CompletionOutcome::from_cached(hit);
            }
        }

        let temperature = request.temperature.unwrap_or(self.default_temperature);
        let max_tokens = request.max_tokens.unwrap_or(self.default_max_tokens);
        let messages = [
            ChatMessage::system(request.system_prompt.as_str()),
            ChatMessage::user(request.prompt.as_str()),
        ];

        let start = Instant::now();
        let response = match provider.chat(&messages, temperature, max_tokens).await {
            Ok(response) => response,
            Err(e) => {
                error!("Model provider call failed: {}", e);
                return CompletionOutcome::failed(e.to_string());
            }
        };
        let duration_seconds = start.elapsed().as_secs_f64();

        let tokens_used = response.total_tokens;
        let cost_usd = tokens_used as f64 * self.cost_per_token;
        info!(
            "Completion generated: {} tokens in {:.2}s (${:.6})",
            tokens_used, duration_seconds, cost_usd
        );

        let completion = CachedCompletion {
            answer: response.content,
            tokens_used,
            cost_usd,
            duration_seconds,
        };

        if request.use_cache {
            self.cache.set(key, completion.clone()).await;
        }

        let usage_request = RecordUsageRequest {
            session_id: request.session_id,
            prompt_text: request.prompt,
            response_text: completion.answer.clone(),
            model_used: self.model.clone(),
            tokens_used,
            cost_usd,
            duration_seconds,
            metadata: request.metadata,
        };
        // A failed log write must not fail the request
        if let Err(e) = self.usage.record_usage(usage_request).await {
            error!("Failed to record usage: {}", e);
        }

        CompletionOutcome {
            answer: completion.answer,
            tokens_used,
            cost_usd,
            duration_seconds,
            cached: false,
            error: None,
        }
    }
}

/// Content-addressed cache key over both prompt roles.
///
/// The system prompt is folded into the hash so two requests with identical
/// user text but different safety/context framing never share an entry.
pub fn cache_key(system_prompt: &str, prompt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(system_prompt.as_bytes());
    hasher.update(b"\n\x00\n");
    hasher.update(prompt.as_bytes());
    hex::encode(hasher.finalize())
}
