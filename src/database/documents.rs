//! Country document queries

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use tracing::warn;
use uuid::Uuid;

use super::Database;
use crate::models::{Confidence, CountryDocument, DocumentFilter, Topic};
use crate::Result;

/// Read surface of the document store, as consumed by the retriever.
///
/// Implementations return documents matching the filter; ranking and
/// truncation are the retriever's responsibility.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn query_documents(&self, filter: &DocumentFilter) -> Result<Vec<CountryDocument>>;
}

/// Raw row shape; topic and confidence are stored as text and converted
/// with fallback on the way out
#[derive(Debug, FromRow)]
struct DocumentRow {
    id: Uuid,
    country_code: String,
    country_name: String,
    topic: String,
    title: String,
    content: String,
    source: Option<String>,
    confidence: String,
    needs_review: bool,
    updated_at: DateTime<Utc>,
}

impl DocumentRow {
    fn into_document(self) -> Option<CountryDocument> {
        let Some(topic) = Topic::parse(&self.topic) else {
            warn!(
                "Skipping document {} with unknown topic {:?}",
                self.id, self.topic
            );
            return None;
        };

        Some(CountryDocument {
            id: self.id,
            country_code: self.country_code,
            country_name: self.country_name,
            topic,
            title: self.title,
            content: self.content,
            source: self.source,
            confidence: Confidence::from(self.confidence),
            needs_review: self.needs_review,
            updated_at: self.updated_at,
        })
    }
}

#[async_trait]
impl DocumentStore for Database {
    async fn query_documents(&self, filter: &DocumentFilter) -> Result<Vec<CountryDocument>> {
        let topics: Vec<String> = filter
            .topics
            .iter()
            .map(|topic| topic.as_str().to_string())
            .collect();

        // Empty filter arrays mean "no restriction" for that predicate.
        // Reviewed-first ordering here matches the retriever's ranking; the
        // retriever's in-memory sort stays authoritative.
        let rows = sqlx::query_as::<_, DocumentRow>(
            r"
            SELECT id, country_code, country_name, topic, title, content,
                   source, confidence, needs_review, updated_at
            FROM country_documents
            WHERE (cardinality($1::text[]) = 0 OR country_code = ANY($1))
              AND (cardinality($2::text[]) = 0 OR topic = ANY($2))
            ORDER BY needs_review ASC,
                     CASE confidence
                         WHEN 'high' THEN 2
                         WHEN 'medium' THEN 1
                         ELSE 0
                     END DESC,
                     updated_at DESC
            ",
        )
        .bind(&filter.countries)
        .bind(&topics)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(DocumentRow::into_document)
            .collect())
    }
}

impl Database {
    /// Insert or replace a country document (seeding and tests)
    pub async fn upsert_document(&self, document: &CountryDocument) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO country_documents (
                id, country_code, country_name, topic, title, content,
                source, confidence, needs_review, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (id)
            DO UPDATE SET
                country_code = EXCLUDED.country_code,
                country_name = EXCLUDED.country_name,
                topic = EXCLUDED.topic,
                title = EXCLUDED.title,
                content = EXCLUDED.content,
                source = EXCLUDED.source,
                confidence = EXCLUDED.confidence,
                needs_review = EXCLUDED.needs_review,
                updated_at = EXCLUDED.updated_at
            ",
        )
        .bind(document.id)
        .bind(&document.country_code)
        .bind(&document.country_name)
        .bind(document.topic.as_str())
        .bind(&document.title)
        .bind(&document.content)
        .bind(&document.source)
        .bind(document.confidence.as_str())
        .bind(document.needs_review)
        .bind(document.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
