//! API request and response types

use serde::Deserialize;
use serde::Serialize;

use crate::models::ConversationTurn;
use crate::models::SourceRef;
use crate::models::Tone;
use crate::prompts::ContextType;

/// Standard API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Chat request
#[derive(Debug, Deserialize)]
pub struct ChatApiRequest {
    pub message: String,
    #[serde(default)]
    pub tone: Tone,
    /// Explicit country focus (alpha-3), overrides detection
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default = "default_use_rag")]
    pub use_rag: bool,
    #[serde(default)]
    pub conversation_history: Vec<ConversationTurn>,
    /// System-prompt context variant; defaults to base
    #[serde(default)]
    pub context: ContextType,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

fn default_use_rag() -> bool {
    true
}

/// Chat response, shaped for client display
#[derive(Debug, Serialize)]
pub struct ChatApiResponse {
    pub response: String,
    pub tone: String,
    pub sources: Vec<SourceRef>,
    pub countries_detected: Vec<String>,
    pub focused_country: Option<String>,
    pub cached: bool,
}

/// Country comparison request
#[derive(Debug, Deserialize)]
pub struct CompareApiRequest {
    /// Left country code
    pub left: String,
    /// Right country code
    pub right: String,
    #[serde(default = "default_metrics")]
    pub metrics: Vec<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

fn default_metrics() -> Vec<String> {
    vec![
        "cost".to_string(),
        "pr_time".to_string(),
        "job_market".to_string(),
        "quality_of_life".to_string(),
    ]
}

/// Country comparison response
#[derive(Debug, Serialize)]
pub struct CompareApiResponse {
    pub answer: String,
    pub sources: Vec<SourceRef>,
    pub cached: bool,
}

/// Document listing query parameters
#[derive(Debug, Deserialize)]
pub struct DocumentListQuery {
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    20
}

/// Service statistics
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_hit_rate: f64,
    pub total_requests: i64,
    pub total_cost_usd: f64,
}
