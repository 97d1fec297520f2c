//! LinguaChat API server binary.

use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::{info, warn};

use lingua_api::config::ApiConfig;
use lingua_core::llm::OpenAiChatModel;

/// CLI arguments for the API server.
#[derive(Parser, Debug)]
#[command(name = "lingua_server", about = "LinguaChat API server")]
struct Args {
    /// Address to bind the HTTP listener.
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:3200")]
    bind_addr: String,

    /// PostgreSQL connection URL.
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "postgres://localhost:5432/lingua"
    )]
    database_url: String,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,lingua_api=debug,lingua_core=debug".parse().unwrap()),
        )
        .init();

    let args = Args::parse();

    info!(database_url = %args.database_url, bind_addr = %args.bind_addr, "starting lingua_server");

    let pool = PgPoolOptions::new()
        .max_connections(args.max_connections)
        .acquire_timeout(std::time::Duration::from_secs(30))
        .connect(&args.database_url)
        .await?;

    info!("running database migrations");
    lingua_api::migrate(&pool).await?;

    let mut config = ApiConfig::from_env();
    config.bind_addr = args.bind_addr;
    config.pg_connection_url = args.database_url;

    if config.openai_api_key.is_empty() {
        warn!("OPENAI_API_KEY is not set; message turns will fail at the provider");
    }
    info!(persona = %config.persona, "chat persona configured");

    let llm = OpenAiChatModel::new(
        config.openai_api_key.clone(),
        config.chat_model.clone(),
        config.openai_base_url.clone(),
    )?;

    let state = lingua_api::AppState {
        pool,
        config: config.clone(),
        llm: Arc::new(llm),
    };

    let app = lingua_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "REST API listening");

    axum::serve(listener, app).await?;

    Ok(())
}
