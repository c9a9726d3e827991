//! Schema management

use super::Database;
use crate::MigRagError;
use crate::Result;

impl Database {
    /// Check if database schema is initialized
    pub async fn is_schema_initialized(&self) -> Result<bool> {
        let required_tables = ["country_documents", "ai_usage_log"];

        for table_name in required_tables {
            let exists = sqlx::query_scalar::<_, bool>(
                r"
                SELECT EXISTS (
                    SELECT FROM information_schema.tables
                    WHERE table_schema = 'public'
                    AND table_name = $1
                )
                ",
            )
            .bind(table_name)
            .fetch_one(self.pool())
            .await?;

            if !exists {
                tracing::debug!("Missing required table: {}", table_name);
                return Ok(false);
            }
        }

        Ok(true)
    }

    /// Verify database schema or return helpful error
    pub async fn verify_schema_or_error(&self) -> Result<()> {
        if !self.is_schema_initialized().await? {
            return Err(MigRagError::Custom(
                "Database schema not initialized. Run `migrag init` first.".to_string(),
            ));
        }
        Ok(())
    }

    /// Initialize database schema
    pub async fn init_schema(&self) -> Result<()> {
        // Country documents table
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS country_documents (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                country_code VARCHAR(8) NOT NULL,
                country_name VARCHAR(255) NOT NULL,
                topic VARCHAR(32) NOT NULL,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                source VARCHAR(255),
                confidence VARCHAR(16) NOT NULL DEFAULT 'low',
                needs_review BOOLEAN NOT NULL DEFAULT TRUE,
                updated_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
            )
            ",
        )
        .execute(self.pool())
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_country_documents_country
             ON country_documents (country_code)",
        )
        .execute(self.pool())
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_country_documents_topic
             ON country_documents (topic)",
        )
        .execute(self.pool())
        .await?;

        // Usage log table
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS ai_usage_log (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                session_id VARCHAR(255) NOT NULL DEFAULT '',
                prompt_text TEXT NOT NULL,
                response_text TEXT NOT NULL,
                model_used VARCHAR(64) NOT NULL,
                tokens_used BIGINT NOT NULL,
                cost_usd DOUBLE PRECISION NOT NULL,
                duration_seconds DOUBLE PRECISION NOT NULL,
                metadata JSONB NOT NULL DEFAULT '{}',
                created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
            )
            ",
        )
        .execute(self.pool())
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_ai_usage_log_session
             ON ai_usage_log (session_id)",
        )
        .execute(self.pool())
        .await?;

        tracing::info!("Database schema initialized");
        Ok(())
    }
}
