//! RAG (Retrieval-Augmented Generation) module
//!
//! End-to-end pipeline for grounded migration guidance:
//! - Entity-driven document retrieval and ranking
//! - Context assembly from retrieved documents and conversation history
//! - Prompt assembly with safety rules and tone profiles
//! - Cached completion with usage logging
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use migrag::config::AppConfig;
//! use migrag::database::Database;
//! use migrag::llm::LlmService;
//! use migrag::rag::{ChatRequest, ChatService};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let database = Arc::new(Database::from_config(&config).await?);
//!     let llm = LlmService::new(&config, database.clone())?;
//!     let service = ChatService::new(database, llm, &config);
//!
//!     let response = service
//!         .chat(ChatRequest::new("How can I work in Canada?"))
//!         .await?;
//!     println!("Answer: {}", response.answer);
//!     println!("Sources: {} documents", response.sources.len());
//!
//!     Ok(())
//! }
//! ```

pub mod context;
pub mod pipeline;
pub mod retriever;

pub use context::ContextAssembler;
pub use pipeline::ChatRequest;
pub use pipeline::ChatResponse;
pub use pipeline::ChatService;
pub use pipeline::CompareResponse;
pub use retriever::Retriever;
