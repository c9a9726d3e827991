use std::sync::Arc;

use clap::Parser;
use clap::Subcommand;
use migrag::config::AppConfig;
use migrag::database::Database;
use migrag::extract;
use migrag::llm::LlmService;
use migrag::models::Tone;
use migrag::rag::ChatRequest;
use migrag::rag::ChatService;
use migrag::Result;

#[derive(Parser)]
#[command(name = "migrag")]
#[command(about = "Migration-guidance RAG service CLI")]
#[command(version)]
struct Cli {
    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema
    Init,
    /// Start the HTTP API server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        /// Port to bind to
        #[arg(short, long, default_value = "8080")]
        port: u16,
        /// Enable permissive CORS headers
        #[arg(long)]
        cors: bool,
    },
    /// Ask a one-shot question from the terminal
    Ask {
        /// The question to ask
        message: String,
        /// Personality tone
        #[arg(short, long, default_value = "helpful")]
        tone: String,
        /// Explicit country focus (alpha-3 code)
        #[arg(short, long)]
        country: Option<String>,
        /// Disable document retrieval
        #[arg(long)]
        no_rag: bool,
    },
    /// Show countries and topics detected in a message
    Extract {
        /// The message to analyze
        message: String,
    },
    /// Show recent model usage
    Usage {
        /// Maximum records to show
        #[arg(short, long, default_value = "10")]
        limit: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;

    if cli.verbose {
        migrag::logging::init_simple_logging()?;
    } else {
        migrag::logging::init_logging_with_config(Some(&config))?;
    }

    match cli.command {
        Commands::Init => {
            let database = Database::from_config(&config).await?;
            database.init_schema().await?;
            println!("Database schema initialized.");
        }
        Commands::Serve { host, port, cors } => {
            migrag::api::serve_api(&config, host, port, cors).await?;
        }
        Commands::Ask {
            message,
            tone,
            country,
            no_rag,
        } => {
            let database = Arc::new(Database::from_config(&config).await?);
            database.verify_schema_or_error().await?;
            let llm = LlmService::new(&config, database.clone())?;
            let service = ChatService::new(database, llm, &config);

            let mut request = ChatRequest::new(message);
            request.tone = Tone::from(tone);
            request.explicit_country = country;
            request.use_rag = !no_rag;

            let response = service.chat(request).await?;

            println!("{}", response.answer);
            if let Some(country) = &response.focused_country {
                println!("\nFocused country: {country}");
            }
            if !response.sources.is_empty() {
                println!("\nSources:");
                for source in &response.sources {
                    println!("  - {}: {} ({})", source.country, source.title, source.source);
                }
            }
        }
        Commands::Usage { limit } => {
            let database = Database::from_config(&config).await?;
            database.verify_schema_or_error().await?;

            let records = database.recent_usage(limit).await?;
            if records.is_empty() {
                println!("No usage recorded yet.");
            }
            for record in records {
                println!(
                    "{}  {}  {} tokens  ${:.6}  {:.2}s",
                    record.created_at.format("%Y-%m-%d %H:%M:%S"),
                    record.model_used,
                    record.tokens_used,
                    record.cost_usd,
                    record.duration_seconds
                );
            }
        }
        Commands::Extract { message } => {
            let extraction = extract::extract(&message);
            println!("Countries: {:?}", extraction.countries);
            println!(
                "Topics: {:?}",
                extraction
                    .topics
                    .iter()
                    .map(|topic| topic.as_str())
                    .collect::<Vec<_>>()
            );
        }
    }

    Ok(())
}
