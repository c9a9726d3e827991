//! Shared test fixtures: in-memory store, usage sink, and a counting
//! mock provider


use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::DocumentStore;
use crate::database::UsageSink;
use crate::llm::provider::ChatMessage;
use crate::llm::provider::ModelProvider;
use crate::llm::provider::ProviderResponse;
use crate::models::Confidence;
use crate::models::CountryDocument;
use crate::models::DocumentFilter;
use crate::models::RecordUsageRequest;
use crate::models::Topic;
use crate::MigRagError;
use crate::Result;

/// Build a test document
pub fn doc(
    country: &str,
    topic: Topic,
    confidence: Confidence,
    needs_review: bool,
    updated_at: DateTime<Utc>,
) -> CountryDocument {
    CountryDocument {
        id: Uuid::new_v4(),
        country_code: country.to_string(),
        country_name: crate::countries::name_for_code(country)
            .unwrap_or(country)
            .to_string(),
        topic,
        title: format!("{country} guide: {}", topic.as_str()),
        content: format!("Official {} information for {country}.", topic.as_str()),
        source: Some("Official portal".to_string()),
        confidence,
        needs_review,
        updated_at,
    }
}

/// In-memory document store with the same filter semantics as the
/// Postgres implementation
pub struct MemoryDocumentStore {
    documents: Vec<CountryDocument>,
}

impl MemoryDocumentStore {
    pub fn new(documents: Vec<CountryDocument>) -> Self {
        Self { documents }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn query_documents(&self, filter: &DocumentFilter) -> Result<Vec<CountryDocument>> {
        Ok(self
            .documents
            .iter()
            .filter(|doc| {
                (filter.countries.is_empty() || filter.countries.contains(&doc.country_code))
                    && (filter.topics.is_empty() || filter.topics.contains(&doc.topic))
            })
            .cloned()
            .collect())
    }
}

/// Usage sink that captures records in memory
pub struct MemoryUsageSink {
    records: RwLock<Vec<RecordUsageRequest>>,
}

impl MemoryUsageSink {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }

    pub async fn records(&self) -> Vec<RecordUsageRequest> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl UsageSink for MemoryUsageSink {
    async fn record_usage(&self, request: RecordUsageRequest) -> Result<()> {
        self.records.write().await.push(request);
        Ok(())
    }
}

/// Mock provider that counts calls and captures the prompts it was given
pub struct CountingProvider {
    calls: AtomicUsize,
    answer: String,
    tokens: i64,
    failure: Option<String>,
    captured: Mutex<Vec<(String, String)>>,
}

impl CountingProvider {
    /// Provider that always succeeds with a fixed answer
    pub fn ok(answer: &str, tokens: i64) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            answer: answer.to_string(),
            tokens,
            failure: None,
            captured: Mutex::new(Vec::new()),
        }
    }

    /// Provider that always fails
    pub fn failing(message: &str) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            answer: String::new(),
            tokens: 0,
            failure: Some(message.to_string()),
            captured: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// (system, user) prompt pairs from each call, in order
    pub fn captured_prompts(&self) -> Vec<(String, String)> {
        self.captured.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelProvider for CountingProvider {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        _temperature: f32,
        _max_tokens: u32,
    ) -> Result<ProviderResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let system = messages
            .iter()
            .find(|m| m.role == "system")
            .map(|m| m.content.clone())
            .unwrap_or_default();
        let user = messages
            .iter()
            .find(|m| m.role == "user")
            .map(|m| m.content.clone())
            .unwrap_or_default();
        self.captured.lock().unwrap().push((system, user));

        match &self.failure {
            Some(message) => Err(MigRagError::Provider(message.clone())),
            None => Ok(ProviderResponse {
                content: self.answer.clone(),
                total_tokens: self.tokens,
            }),
        }
    }
}

/// Wire a chat service from in-memory parts
pub fn chat_service(
    store: Arc<MemoryDocumentStore>,
    provider: Option<Arc<CountingProvider>>,
    usage: Arc<MemoryUsageSink>,
) -> crate::rag::ChatService {
    let config = crate::config::AppConfig::default();
    let llm = crate::llm::LlmService::from_parts(
        provider.map(|p| p as Arc<dyn ModelProvider>),
        crate::llm::CompletionCache::new(),
        usage,
        "test-model",
        0.000_001,
    );
    crate::rag::ChatService::new(store, llm, &config)
}
