//! HTTP server implementation

use std::sync::Arc;

use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::Any;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::handlers::AppState;
use crate::api::routes;
use crate::config::AppConfig;
use crate::database::Database;
use crate::llm::LlmService;
use crate::rag::ChatService;
use crate::Result;

/// Start the API server
pub async fn serve_api(
    config: &AppConfig,
    host: String,
    port: u16,
    enable_cors: bool,
) -> Result<()> {
    info!("🚀 Starting migrag API server...");

    // Initialize services; the database doubles as document store and
    // usage sink
    let database = Arc::new(Database::from_config(config).await?);
    database.verify_schema_or_error().await?;

    let llm_service = LlmService::new(config, database.clone())?;
    let chat_service = Arc::new(ChatService::new(database.clone(), llm_service, config));

    let state = AppState {
        chat_service,
        database,
    };

    let api_router = routes::api_routes(state);

    let mut app = Router::new()
        .nest("/api", api_router)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new());

    // Add CORS if enabled
    if enable_cors {
        info!("✅ CORS enabled");
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    // Start server
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("🌐 API server listening on http://{}", addr);
    info!("Available endpoints:");
    info!("  GET  /api/health     - Health check");
    info!("  POST /api/chat       - Chat with RAG and personality support");
    info!("  POST /api/compare    - Compare two countries");
    info!("  GET  /api/documents  - List stored documents");
    info!("  GET  /api/stats      - Cache and usage statistics");

    axum::serve(listener, app).await?;

    Ok(())
}
