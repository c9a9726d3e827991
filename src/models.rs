use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Document topics covered by the country knowledge base
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    Overview,
    Visas,
    Work,
    Study,
    Family,
    Citizenship,
    Asylum,
}

impl Topic {
    /// All topics, in display order
    pub const ALL: [Topic; 7] = [
        Topic::Overview,
        Topic::Visas,
        Topic::Work,
        Topic::Study,
        Topic::Family,
        Topic::Citizenship,
        Topic::Asylum,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Topic::Overview => "overview",
            Topic::Visas => "visas",
            Topic::Work => "work",
            Topic::Study => "study",
            Topic::Family => "family",
            Topic::Citizenship => "citizenship",
            Topic::Asylum => "asylum",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "overview" => Some(Topic::Overview),
            "visas" => Some(Topic::Visas),
            "work" => Some(Topic::Work),
            "study" => Some(Topic::Study),
            "family" => Some(Topic::Family),
            "citizenship" => Some(Topic::Citizenship),
            "asylum" => Some(Topic::Asylum),
            _ => None,
        }
    }
}

/// Tri-level trust rating attached to stored documents.
///
/// Ordering is total: `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn as_str(self) -> &'static str {
        match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        }
    }
}

impl From<String> for Confidence {
    fn from(value: String) -> Self {
        match value.as_str() {
            "medium" => Confidence::Medium,
            "high" => Confidence::High,
            // Unknown ratings are treated with maximum caution
            _ => Confidence::Low,
        }
    }
}

/// Personality tone for generated responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", rename_all = "snake_case")]
pub enum Tone {
    Helpful,
    UncleJapa,
    Bestie,
    StrictOfficer,
    HypeMan,
    Therapist,
}

impl Tone {
    pub fn as_str(self) -> &'static str {
        match self {
            Tone::Helpful => "helpful",
            Tone::UncleJapa => "uncle_japa",
            Tone::Bestie => "bestie",
            Tone::StrictOfficer => "strict_officer",
            Tone::HypeMan => "hype_man",
            Tone::Therapist => "therapist",
        }
    }
}

impl From<String> for Tone {
    fn from(value: String) -> Self {
        match value.as_str() {
            "uncle_japa" => Tone::UncleJapa,
            "bestie" => Tone::Bestie,
            "strict_officer" => Tone::StrictOfficer,
            "hype_man" => Tone::HypeMan,
            "therapist" => Tone::Therapist,
            // Closed set: anything unrecognized falls back to helpful
            _ => Tone::Helpful,
        }
    }
}

impl Default for Tone {
    fn default() -> Self {
        Tone::Helpful
    }
}

/// Role of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    /// Title-cased label used when rendering history into prompts
    pub fn label(self) -> &'static str {
        match self {
            ChatRole::User => "User",
            ChatRole::Assistant => "Assistant",
        }
    }
}

impl From<String> for ChatRole {
    fn from(value: String) -> Self {
        match value.as_str() {
            "assistant" => ChatRole::Assistant,
            _ => ChatRole::User,
        }
    }
}

/// One turn of caller-supplied conversation history (read-only)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Country-scoped immigration document as stored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountryDocument {
    pub id: Uuid,
    pub country_code: String,
    pub country_name: String,
    pub topic: Topic,
    pub title: String,
    pub content: String,
    pub source: Option<String>,
    pub confidence: Confidence,
    pub needs_review: bool,
    pub updated_at: DateTime<Utc>,
}

/// Document store query filters
#[derive(Debug, Clone, Default)]
pub struct DocumentFilter {
    /// Country codes to match; empty means no country restriction
    pub countries: Vec<String>,
    /// Topics to match; empty means no topic restriction
    pub topics: Vec<Topic>,
}

/// Bounded projection of a stored document, sized for prompt injection
#[derive(Debug, Clone, Serialize)]
pub struct DocumentView {
    pub country_code: String,
    pub country_name: String,
    pub topic: Topic,
    pub title: String,
    pub content: String,
    pub confidence: Confidence,
    pub source: String,
    pub last_updated: DateTime<Utc>,
}

/// Provenance reference returned alongside generated answers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub country: String,
    pub title: String,
    pub source: String,
}

/// Append-only log entry for a completed model call
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UsageRecord {
    pub id: Uuid,
    pub session_id: String,
    pub prompt_text: String,
    pub response_text: String,
    pub model_used: String,
    pub tokens_used: i64,
    pub cost_usd: f64,
    pub duration_seconds: f64,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Record usage request, as produced by the completion engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordUsageRequest {
    pub session_id: String,
    pub prompt_text: String,
    pub response_text: String,
    pub model_used: String,
    pub tokens_used: i64,
    pub cost_usd: f64,
    pub duration_seconds: f64,
    pub metadata: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tone_fallback_to_helpful() {
        assert_eq!(Tone::from("uncle_japa".to_string()), Tone::UncleJapa);
        assert_eq!(Tone::from("pirate".to_string()), Tone::Helpful);
        assert_eq!(Tone::from(String::new()), Tone::Helpful);
    }

    #[test]
    fn test_confidence_ordering() {
        assert!(Confidence::Low < Confidence::Medium);
        assert!(Confidence::Medium < Confidence::High);
        assert_eq!(Confidence::from("verified".to_string()), Confidence::Low);
    }

    #[test]
    fn test_topic_parse_roundtrip() {
        for topic in Topic::ALL {
            assert_eq!(Topic::parse(topic.as_str()), Some(topic));
        }
        assert_eq!(Topic::parse("weather"), None);
    }

    #[test]
    fn test_chat_role_from_unknown_defaults_to_user() {
        assert_eq!(ChatRole::from("assistant".to_string()), ChatRole::Assistant);
        assert_eq!(ChatRole::from("system".to_string()), ChatRole::User);
    }
}
