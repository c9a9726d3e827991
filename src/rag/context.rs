//! Context assembly from retrieved documents and conversation history

use crate::models::ConversationTurn;
use crate::models::DocumentView;
use crate::models::SourceRef;

/// Truncate a string to at most `max` characters, respecting char boundaries
pub fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}

/// Assembler for creating prompt context from retrieved documents and
/// caller-supplied conversation history
pub struct ContextAssembler {
    /// How many trailing turns of history are rendered
    conversation_window: usize,
    /// Per-message character budget when rendering history
    message_budget: usize,
}

impl ContextAssembler {
    #[must_use]
    pub const fn new(conversation_window: usize, message_budget: usize) -> Self {
        Self {
            conversation_window,
            message_budget,
        }
    }

    /// Render retrieved documents as labeled blocks with a clear separator.
    ///
    /// Returns an empty string when nothing was retrieved; the chat template
    /// switches to its "no grounding data" branch in that case.
    #[must_use]
    pub fn render_documents(&self, documents: &[DocumentView]) -> String {
        documents
            .iter()
            .map(|doc| {
                format!(
                    "**{} - {}** (Source: {}, Confidence: {})\n\n{}",
                    doc.country_name,
                    doc.title,
                    doc.source,
                    doc.confidence.as_str(),
                    doc.content
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n---\n\n")
    }

    /// Render the last few turns of conversation as "Role: content" lines
    #[must_use]
    pub fn render_conversation(&self, history: &[ConversationTurn]) -> String {
        let start = history.len().saturating_sub(self.conversation_window);
        history[start..]
            .iter()
            .filter(|turn| !turn.content.is_empty())
            .map(|turn| {
                format!(
                    "{}: {}",
                    turn.role.label(),
                    truncate_chars(&turn.content, self.message_budget)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Provenance references for the retrieved documents
    #[must_use]
    pub fn sources(&self, documents: &[DocumentView]) -> Vec<SourceRef> {
        documents
            .iter()
            .map(|doc| SourceRef {
                country: doc.country_name.clone(),
                title: doc.title.clone(),
                source: doc.source.clone(),
            })
            .collect()
    }
}

impl Default for ContextAssembler {
    fn default() -> Self {
        // Last 4 turns, 500 chars per message
        Self::new(4, 500)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChatRole;
    use crate::models::Confidence;
    use crate::models::Topic;
    use chrono::Utc;

    fn view(country: &str, title: &str) -> DocumentView {
        DocumentView {
            country_code: "CAN".to_string(),
            country_name: country.to_string(),
            topic: Topic::Work,
            title: title.to_string(),
            content: "Work permit details".to_string(),
            confidence: Confidence::High,
            source: "IRCC".to_string(),
            last_updated: Utc::now(),
        }
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello", 3), "hel");
        // Multi-byte characters count as single chars
        assert_eq!(truncate_chars("héllo", 2), "hé");
    }

    #[test]
    fn test_render_documents() {
        let assembler = ContextAssembler::default();
        let rendered =
            assembler.render_documents(&[view("Canada", "Work permits"), view("Canada", "Visas")]);
        assert!(rendered.contains("**Canada - Work permits** (Source: IRCC, Confidence: high)"));
        assert!(rendered.contains("\n\n---\n\n"));
    }

    #[test]
    fn test_render_documents_empty() {
        let assembler = ContextAssembler::default();
        assert_eq!(assembler.render_documents(&[]), "");
    }

    #[test]
    fn test_render_conversation_window_and_budget() {
        let assembler = ContextAssembler::new(2, 10);
        let history = vec![
            ConversationTurn::user("first message"),
            ConversationTurn::assistant("second message"),
            ConversationTurn::user("a third message that is quite long"),
        ];
        let rendered = assembler.render_conversation(&history);
        // Only the trailing window is rendered
        assert!(!rendered.contains("first message"));
        assert!(rendered.starts_with("Assistant: second mes"));
        assert!(rendered.contains("User: a third me"));
    }

    #[test]
    fn test_render_conversation_skips_empty_turns() {
        let assembler = ContextAssembler::default();
        let history = vec![
            ConversationTurn {
                role: ChatRole::User,
                content: String::new(),
            },
            ConversationTurn::user("hello"),
        ];
        assert_eq!(assembler.render_conversation(&history), "User: hello");
    }

    #[test]
    fn test_sources() {
        let assembler = ContextAssembler::default();
        let sources = assembler.sources(&[view("Canada", "Work permits")]);
        assert_eq!(
            sources,
            vec![SourceRef {
                country: "Canada".to_string(),
                title: "Work permits".to_string(),
                source: "IRCC".to_string(),
            }]
        );
    }
}
