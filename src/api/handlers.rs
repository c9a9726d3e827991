//! API handlers

use std::sync::Arc;

use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use tracing::error;
use tracing::info;

use crate::api::types::*;
use crate::database::Database;
use crate::database::DocumentStore;
use crate::models::DocumentFilter;
use crate::models::DocumentView;
use crate::models::Topic;
use crate::rag::ChatRequest;
use crate::rag::ChatService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub chat_service: Arc<ChatService>,
    pub database: Arc<Database>,
}

/// Health check
pub async fn health() -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::success(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

/// Chat with the assistant
pub async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatApiRequest>,
) -> Result<Json<ApiResponse<ChatApiResponse>>, StatusCode> {
    info!("POST /api/chat: {}", req.message);

    let tone = req.tone;
    let request = ChatRequest {
        message: req.message,
        tone,
        explicit_country: req.country_code,
        use_rag: req.use_rag,
        conversation_history: req.conversation_history,
        context_type: req.context,
        session_id: req.session_id.unwrap_or_default(),
        temperature: req.temperature,
        max_tokens: req.max_tokens,
    };

    match state.chat_service.chat(request).await {
        Ok(response) => Ok(Json(ApiResponse::success(ChatApiResponse {
            response: response.answer,
            tone: tone.as_str().to_string(),
            sources: response.sources,
            countries_detected: response.countries_detected,
            focused_country: response.focused_country,
            cached: response.cached,
        }))),
        Err(e) => {
            error!("Error processing chat request: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Compare two countries
pub async fn compare(
    State(state): State<AppState>,
    Json(req): Json<CompareApiRequest>,
) -> Result<Json<ApiResponse<CompareApiResponse>>, StatusCode> {
    info!("POST /api/compare: {} vs {}", req.left, req.right);

    let session_id = req.session_id.unwrap_or_default();
    match state
        .chat_service
        .compare(&req.left, &req.right, &req.metrics, session_id)
        .await
    {
        Ok(response) => Ok(Json(ApiResponse::success(CompareApiResponse {
            answer: response.answer,
            sources: response.sources,
            cached: response.cached,
        }))),
        Err(e) => {
            error!("Error processing comparison: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// List stored documents, optionally filtered by country and topic
pub async fn list_documents(
    State(state): State<AppState>,
    Query(query): Query<DocumentListQuery>,
) -> Result<Json<ApiResponse<Vec<DocumentView>>>, (StatusCode, Json<ApiResponse<Vec<DocumentView>>>)>
{
    let topics = match query.topic.as_deref() {
        None => Vec::new(),
        Some(raw) => match Topic::parse(raw) {
            Some(topic) => vec![topic],
            None => {
                return Err((
                    StatusCode::BAD_REQUEST,
                    Json(ApiResponse::error(format!("unknown topic: {raw}"))),
                ))
            }
        },
    };

    let filter = DocumentFilter {
        countries: query.country.into_iter().collect(),
        topics,
    };

    match state.database.query_documents(&filter).await {
        Ok(documents) => {
            let views: Vec<DocumentView> = documents
                .into_iter()
                .take(query.limit)
                .map(|doc| DocumentView {
                    country_code: doc.country_code,
                    country_name: doc.country_name,
                    topic: doc.topic,
                    title: doc.title,
                    content: crate::rag::context::truncate_chars(&doc.content, 500),
                    confidence: doc.confidence,
                    source: doc.source.unwrap_or_else(|| "Unknown".to_string()),
                    last_updated: doc.updated_at,
                })
                .collect();
            Ok(Json(ApiResponse::success(views)))
        }
        Err(e) => {
            error!("Error listing documents: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("failed to list documents")),
            ))
        }
    }
}

/// Cache and usage statistics
pub async fn stats(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<StatsResponse>>, StatusCode> {
    let cache = state.chat_service.cache_stats().await;

    match state.database.usage_totals().await {
        Ok((total_requests, total_cost_usd)) => Ok(Json(ApiResponse::success(StatsResponse {
            cache_hits: cache.hits,
            cache_misses: cache.misses,
            cache_hit_rate: cache.hit_rate(),
            total_requests,
            total_cost_usd,
        }))),
        Err(e) => {
            error!("Error reading usage totals: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
