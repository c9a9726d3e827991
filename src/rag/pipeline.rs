//! Conversation orchestration: extraction -> retrieval -> prompt assembly
//! -> completion

use std::sync::Arc;

use serde_json::json;
use tracing::debug;
use tracing::info;

use crate::config::AppConfig;
use crate::countries;
use crate::database::DocumentStore;
use crate::extract;
use crate::llm::CompletionRequest;
use crate::llm::LlmService;
use crate::models::Confidence;
use crate::models::ConversationTurn;
use crate::models::DocumentView;
use crate::models::SourceRef;
use crate::models::Tone;
use crate::prompts;
use crate::prompts::ChatPromptContext;
use crate::prompts::ContextType;
use crate::rag::ContextAssembler;
use crate::rag::Retriever;
use crate::Result;

/// How many trailing history turns are scanned for focus candidates
const HISTORY_SCAN_WINDOW: usize = 6;

/// Probe message used when retrieving per-country context for comparisons
const COMPARISON_PROBE: &str = "general overview work study immigration";

/// One chat request against the orchestrator
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub message: String,
    pub tone: Tone,
    /// Explicit country override; takes precedence over detection
    pub explicit_country: Option<String>,
    pub use_rag: bool,
    pub conversation_history: Vec<ConversationTurn>,
    pub context_type: ContextType,
    pub session_id: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            tone: Tone::Helpful,
            explicit_country: None,
            use_rag: true,
            conversation_history: Vec::new(),
            context_type: ContextType::Base,
            session_id: String::new(),
            temperature: None,
            max_tokens: None,
        }
    }
}

/// Answer plus provenance for a chat turn
#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub answer: String,
    pub sources: Vec<SourceRef>,
    pub countries_detected: Vec<String>,
    pub focused_country: Option<String>,
    pub cached: bool,
    pub error: Option<String>,
}

/// Country comparison result
#[derive(Debug, Clone)]
pub struct CompareResponse {
    pub answer: String,
    pub sources: Vec<SourceRef>,
    pub cached: bool,
    pub error: Option<String>,
}

/// Top-level conversation orchestrator
pub struct ChatService {
    retriever: Retriever,
    assembler: ContextAssembler,
    llm: LlmService,
    max_documents: usize,
}

impl ChatService {
    /// Create the orchestrator from its parts
    pub fn new(store: Arc<dyn DocumentStore>, llm: LlmService, config: &AppConfig) -> Self {
        Self {
            retriever: Retriever::new(store, config.retrieval.content_budget),
            assembler: ContextAssembler::default(),
            llm,
            max_documents: config.retrieval.max_documents,
        }
    }

    /// Retriever reference (document listing, comparisons)
    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Handle one chat turn.
    ///
    /// This is a read path: the exchange itself is not persisted here
    /// (usage logging inside the completion engine is separate).
    pub async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        info!("Processing chat message: {}", request.message);

        let current_countries = extract::extract_countries(&request.message);
        let (history_countries, history_focus) =
            scan_history(&request.conversation_history);

        let focused_country = request
            .explicit_country
            .clone()
            .or_else(|| current_countries.first().cloned())
            .or(history_focus);

        debug!(
            "Focus resolution: explicit={:?} current={:?} history={:?} -> {:?}",
            request.explicit_country, current_countries, history_countries, focused_country
        );

        let documents = if request.use_rag {
            self.retriever
                .retrieve(
                    &request.message,
                    focused_country.as_deref(),
                    self.max_documents,
                )
                .await?
        } else {
            Vec::new()
        };

        let sources = self.assembler.sources(&documents);
        let document_context = self.assembler.render_documents(&documents);
        let conversation_context = self
            .assembler
            .render_conversation(&request.conversation_history);

        let focus_name = focused_country
            .as_deref()
            .and_then(countries::name_for_code);
        let data_confidence = focus_confidence(focused_country.as_deref(), &documents);

        let system_prompt =
            prompts::system_prompt(request.context_type, focus_name, data_confidence)?;
        let prompt = prompts::build_chat_prompt(&ChatPromptContext {
            tone: request.tone,
            message: request.message.clone(),
            conversation_context,
            document_context,
            focused_country: focused_country.clone(),
        })?;

        let outcome = self
            .llm
            .complete(CompletionRequest {
                prompt,
                system_prompt,
                temperature: request.temperature,
                max_tokens: request.max_tokens,
                use_cache: true,
                session_id: request.session_id,
                metadata: json!({
                    "tone": request.tone.as_str(),
                    "focused_country": focused_country.clone(),
                    "use_rag": request.use_rag,
                    "documents_retrieved": documents.len(),
                }),
            })
            .await;

        let countries_detected = merge_detected(
            request.explicit_country.as_deref(),
            &current_countries,
            &history_countries,
        );

        Ok(ChatResponse {
            answer: outcome.answer,
            sources,
            countries_detected,
            focused_country,
            cached: outcome.cached,
            error: outcome.error,
        })
    }

    /// Compare two countries using retrieved context for both sides
    pub async fn compare(
        &self,
        left: &str,
        right: &str,
        metrics: &[String],
        session_id: String,
    ) -> Result<CompareResponse> {
        info!("Comparing countries: {} vs {}", left, right);

        let left_docs = self
            .retriever
            .retrieve(COMPARISON_PROBE, Some(left), 3)
            .await?;
        let right_docs = self
            .retriever
            .retrieve(COMPARISON_PROBE, Some(right), 3)
            .await?;

        let prompt = prompts::build_comparison_prompt(
            left,
            right,
            &comparison_context(&left_docs),
            &comparison_context(&right_docs),
            metrics,
        )?;
        let system_prompt = prompts::system_prompt(ContextType::Base, None, None)?;

        let outcome = self
            .llm
            .complete(CompletionRequest {
                prompt,
                system_prompt,
                temperature: None,
                max_tokens: None,
                use_cache: true,
                session_id,
                metadata: json!({
                    "comparison": [left, right],
                    "metrics": metrics,
                }),
            })
            .await;

        let mut sources = self.assembler.sources(&left_docs);
        sources.extend(self.assembler.sources(&right_docs));

        Ok(CompareResponse {
            answer: outcome.answer,
            sources,
            cached: outcome.cached,
            error: outcome.error,
        })
    }

    /// Cache statistics passthrough for monitoring
    pub async fn cache_stats(&self) -> crate::llm::cache::CacheStats {
        self.llm.cache_stats().await
    }
}

/// Scan the trailing history window in chronological order.
///
/// Returns every country mentioned (first-mention order) and the fallback
/// focus: the first-mentioned country of the most recent turn that mentions
/// any country.
fn scan_history(history: &[ConversationTurn]) -> (Vec<String>, Option<String>) {
    let start = history.len().saturating_sub(HISTORY_SCAN_WINDOW);
    let mut mentioned = Vec::new();
    let mut focus = None;

    for turn in &history[start..] {
        if turn.content.is_empty() {
            continue;
        }
        let turn_countries = extract::extract_countries(&turn.content);
        if let Some(first) = turn_countries.first() {
            // Later turns override earlier ones
            focus = Some(first.clone());
        }
        for code in turn_countries {
            if !mentioned.contains(&code) {
                mentioned.push(code);
            }
        }
    }

    (mentioned, focus)
}

/// Detected-country list for client display: explicit override first, then
/// the current message, then history, de-duplicated
fn merge_detected(
    explicit: Option<&str>,
    current: &[String],
    history: &[String],
) -> Vec<String> {
    let mut detected = Vec::new();
    if let Some(code) = explicit {
        detected.push(code.to_string());
    }
    for code in current.iter().chain(history) {
        if !detected.contains(code) {
            detected.push(code.clone());
        }
    }
    detected
}

/// Highest confidence among documents for the focus country
fn focus_confidence(focus: Option<&str>, documents: &[DocumentView]) -> Option<Confidence> {
    let focus = focus?;
    documents
        .iter()
        .filter(|doc| doc.country_code == focus)
        .map(|doc| doc.confidence)
        .max()
}

/// Comparison context: titled excerpts, or a fixed no-data line
fn comparison_context(documents: &[DocumentView]) -> String {
    if documents.is_empty() {
        return "No detailed information available.".to_string();
    }
    documents
        .iter()
        .map(|doc| {
            format!(
                "**{}** ({})\n{}",
                doc.title,
                doc.source,
                crate::rag::context::truncate_chars(&doc.content, 2000)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_history_prefers_most_recent_turn() {
        let history = vec![
            ConversationTurn::user("Tell me about Canada"),
            ConversationTurn::assistant("Canada is popular for skilled workers."),
            ConversationTurn::user("What about Germany?"),
        ];
        let (mentioned, focus) = scan_history(&history);
        assert_eq!(mentioned, vec!["CAN".to_string(), "DEU".to_string()]);
        assert_eq!(focus, Some("DEU".to_string()));
    }

    #[test]
    fn test_scan_history_window_bounds() {
        // Seven turns; the first mention falls outside the six-turn window
        let mut history = vec![ConversationTurn::user("Thinking about Japan")];
        for _ in 0..6 {
            history.push(ConversationTurn::assistant("Sure, tell me more."));
        }
        let (mentioned, focus) = scan_history(&history);
        assert!(mentioned.is_empty());
        assert_eq!(focus, None);
    }

    #[test]
    fn test_merge_detected_order() {
        let current = vec!["USA".to_string()];
        let history = vec!["CAN".to_string(), "USA".to_string()];
        let detected = merge_detected(Some("DEU"), &current, &history);
        assert_eq!(
            detected,
            vec!["DEU".to_string(), "USA".to_string(), "CAN".to_string()]
        );
    }

    #[test]
    fn test_focus_confidence_ignores_other_countries() {
        use crate::models::Topic;
        use chrono::Utc;

        let views = vec![
            DocumentView {
                country_code: "CAN".to_string(),
                country_name: "Canada".to_string(),
                topic: Topic::Work,
                title: "t".to_string(),
                content: "c".to_string(),
                confidence: Confidence::Medium,
                source: "s".to_string(),
                last_updated: Utc::now(),
            },
            DocumentView {
                country_code: "DEU".to_string(),
                country_name: "Germany".to_string(),
                topic: Topic::Work,
                title: "t".to_string(),
                content: "c".to_string(),
                confidence: Confidence::High,
                source: "s".to_string(),
                last_updated: Utc::now(),
            },
        ];

        assert_eq!(focus_confidence(Some("CAN"), &views), Some(Confidence::Medium));
        assert_eq!(focus_confidence(Some("NGA"), &views), None);
        assert_eq!(focus_confidence(None, &views), None);
    }
}
