//! Append-only usage log

use async_trait::async_trait;

use super::Database;
use crate::models::RecordUsageRequest;
use crate::models::UsageRecord;
use crate::Result;

/// Sink for usage records produced by the completion engine.
///
/// One append per completed model call; records are never mutated or
/// deleted here (cleanup is an operational concern).
#[async_trait]
pub trait UsageSink: Send + Sync {
    async fn record_usage(&self, request: RecordUsageRequest) -> Result<()>;
}

#[async_trait]
impl UsageSink for Database {
    async fn record_usage(&self, request: RecordUsageRequest) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO ai_usage_log (
                session_id, prompt_text, response_text, model_used,
                tokens_used, cost_usd, duration_seconds, metadata
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ",
        )
        .bind(&request.session_id)
        .bind(&request.prompt_text)
        .bind(&request.response_text)
        .bind(&request.model_used)
        .bind(request.tokens_used)
        .bind(request.cost_usd)
        .bind(request.duration_seconds)
        .bind(&request.metadata)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

impl Database {
    /// Most recent usage records, newest first
    pub async fn recent_usage(&self, limit: i64) -> Result<Vec<UsageRecord>> {
        let records = sqlx::query_as::<_, UsageRecord>(
            r"
            SELECT id, session_id, prompt_text, response_text, model_used,
                   tokens_used, cost_usd, duration_seconds, metadata, created_at
            FROM ai_usage_log
            ORDER BY created_at DESC
            LIMIT $1
            ",
        )
        .bind(limit)
        .fetch_all(self.pool())
        .await?;

        Ok(records)
    }

    /// Total request count and accumulated cost across the log
    pub async fn usage_totals(&self) -> Result<(i64, f64)> {
        let totals: (i64, Option<f64>) = sqlx::query_as(
            "SELECT COUNT(*), SUM(cost_usd) FROM ai_usage_log",
        )
        .fetch_one(self.pool())
        .await?;

        Ok((totals.0, totals.1.unwrap_or(0.0)))
    }
}
