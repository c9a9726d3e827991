//! Document retrieval: filter resolution, ranking, projection

use std::sync::Arc;

use tracing::debug;

use crate::countries;
use crate::database::DocumentStore;
use crate::extract;
use crate::models::CountryDocument;
use crate::models::DocumentFilter;
use crate::models::DocumentView;
use crate::rag::context::truncate_chars;
use crate::Result;

/// Retriever over the document store
pub struct Retriever {
    store: Arc<dyn DocumentStore>,
    /// Per-document content budget for prompt injection
    content_budget: usize,
}

impl Retriever {
    pub fn new(store: Arc<dyn DocumentStore>, content_budget: usize) -> Self {
        Self {
            store,
            content_budget,
        }
    }

    /// Retrieve ranked documents relevant to a message.
    ///
    /// The explicit country override takes precedence over extraction; an
    /// empty country or topic set means that predicate is not applied.
    pub async fn retrieve(
        &self,
        message: &str,
        explicit_country: Option<&str>,
        max_results: usize,
    ) -> Result<Vec<DocumentView>> {
        let filter = self.resolve_filter(message, explicit_country);
        debug!(
            "Retrieving documents: countries={:?} topics={:?} limit={}",
            filter.countries, filter.topics, max_results
        );

        let documents = self.store.query_documents(&filter).await?;
        let ranked = rank_documents(documents);

        Ok(ranked
            .into_iter()
            .take(max_results)
            .map(|doc| self.project(doc))
            .collect())
    }

    /// Resolve country and topic filters from the message and the override
    pub fn resolve_filter(&self, message: &str, explicit_country: Option<&str>) -> DocumentFilter {
        let countries = match explicit_country {
            Some(code) => vec![code.to_string()],
            None => extract::extract_countries(message),
        };
        let topics = extract::extract_topics(message);

        DocumentFilter { countries, topics }
    }

    /// Project a stored document to its bounded prompt-injection view
    fn project(&self, doc: CountryDocument) -> DocumentView {
        let country_name = if doc.country_name.is_empty() {
            countries::name_for_code(&doc.country_code)
                .unwrap_or(doc.country_code.as_str())
                .to_string()
        } else {
            doc.country_name
        };

        DocumentView {
            country_code: doc.country_code,
            country_name,
            topic: doc.topic,
            title: doc.title,
            content: truncate_chars(&doc.content, self.content_budget),
            confidence: doc.confidence,
            source: doc.source.unwrap_or_else(|| "Unknown".to_string()),
            last_updated: doc.updated_at,
        }
    }
}

/// Rank documents: reviewed before unreviewed, then higher confidence,
/// then most recently updated
pub fn rank_documents(mut documents: Vec<CountryDocument>) -> Vec<CountryDocument> {
    documents.sort_by(|a, b| {
        a.needs_review
            .cmp(&b.needs_review)
            .then(b.confidence.cmp(&a.confidence))
            .then(b.updated_at.cmp(&a.updated_at))
    });
    documents
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Confidence;
    use crate::models::Topic;
    use crate::tests::doc;
    use crate::tests::MemoryDocumentStore;
    use chrono::Duration;
    use chrono::Utc;

    #[test]
    fn test_ranking_order() {
        let now = Utc::now();
        let reviewed_low = doc("CAN", Topic::Work, Confidence::Low, false, now);
        let reviewed_high_old =
            doc("CAN", Topic::Work, Confidence::High, false, now - Duration::days(30));
        let reviewed_high_new = doc("CAN", Topic::Work, Confidence::High, false, now);
        let unreviewed_high = doc("CAN", Topic::Work, Confidence::High, true, now);

        let ranked = rank_documents(vec![
            unreviewed_high.clone(),
            reviewed_low.clone(),
            reviewed_high_old.clone(),
            reviewed_high_new.clone(),
        ]);

        let ids: Vec<_> = ranked.iter().map(|d| d.id).collect();
        assert_eq!(
            ids,
            vec![
                reviewed_high_new.id,
                reviewed_high_old.id,
                reviewed_low.id,
                unreviewed_high.id
            ]
        );
    }

    #[tokio::test]
    async fn test_explicit_country_overrides_extraction() {
        let now = Utc::now();
        let store = Arc::new(MemoryDocumentStore::new(vec![
            doc("CAN", Topic::Visas, Confidence::High, false, now),
            doc("DEU", Topic::Visas, Confidence::High, false, now),
        ]));
        let retriever = Retriever::new(store, 3000);

        // Message mentions Canada, but the explicit override wins
        let views = retriever
            .retrieve("Visa requirements for Canada?", Some("DEU"), 5)
            .await
            .unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].country_code, "DEU");
    }

    #[tokio::test]
    async fn test_country_filter_from_message() {
        let now = Utc::now();
        let store = Arc::new(MemoryDocumentStore::new(vec![
            doc("USA", Topic::Visas, Confidence::High, false, now),
            doc("CAN", Topic::Visas, Confidence::High, false, now),
        ]));
        let retriever = Retriever::new(store, 3000);

        let views = retriever
            .retrieve("What are the visa requirements for USA?", None, 5)
            .await
            .unwrap();
        assert!(!views.is_empty());
        assert!(views.iter().all(|v| v.country_code == "USA"));
    }

    #[tokio::test]
    async fn test_no_country_means_no_country_filter() {
        let now = Utc::now();
        let store = Arc::new(MemoryDocumentStore::new(vec![
            doc("USA", Topic::Work, Confidence::High, false, now),
            doc("CAN", Topic::Work, Confidence::High, false, now),
        ]));
        let retriever = Retriever::new(store, 3000);

        let views = retriever.retrieve("How do I find a job abroad?", None, 5).await.unwrap();
        assert_eq!(views.len(), 2);
    }

    #[tokio::test]
    async fn test_retrieval_is_idempotent() {
        let now = Utc::now();
        let store = Arc::new(MemoryDocumentStore::new(vec![
            doc("CAN", Topic::Work, Confidence::High, false, now - Duration::days(1)),
            doc("CAN", Topic::Work, Confidence::Medium, false, now),
            doc("CAN", Topic::Work, Confidence::Low, true, now),
        ]));
        let retriever = Retriever::new(store, 3000);

        let first = retriever.retrieve("Work in Canada", None, 5).await.unwrap();
        let second = retriever.retrieve("Work in Canada", None, 5).await.unwrap();
        let first_ids: Vec<_> = first.iter().map(|v| v.title.clone()).collect();
        let second_ids: Vec<_> = second.iter().map(|v| v.title.clone()).collect();
        assert_eq!(first_ids, second_ids);
    }

    #[tokio::test]
    async fn test_truncation_and_source_fallback() {
        let now = Utc::now();
        let mut long_doc = doc("CAN", Topic::Work, Confidence::High, false, now);
        long_doc.content = "x".repeat(5000);
        long_doc.source = None;
        let store = Arc::new(MemoryDocumentStore::new(vec![long_doc]));
        let retriever = Retriever::new(store, 3000);

        let views = retriever.retrieve("Work in Canada", None, 5).await.unwrap();
        assert_eq!(views[0].content.chars().count(), 3000);
        assert_eq!(views[0].source, "Unknown");
    }

    #[tokio::test]
    async fn test_max_results_truncation() {
        let now = Utc::now();
        let docs: Vec<_> = (0..10i64)
            .map(|i| doc("CAN", Topic::Work, Confidence::High, false, now - Duration::hours(i)))
            .collect();
        let store = Arc::new(MemoryDocumentStore::new(docs));
        let retriever = Retriever::new(store, 3000);

        let views = retriever.retrieve("Work in Canada", None, 5).await.unwrap();
        assert_eq!(views.len(), 5);
    }
}
