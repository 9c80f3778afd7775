//! Document Q&A server binary
//!
//! Run with: cargo run -p gemdoc-rag --bin gemdoc-server -- --config gemdoc.toml

use clap::Parser;
use gemdoc_rag::{config::RagConfig, server::RagServer};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Upload PDF/DOCX documents and ask questions about them
#[derive(Parser, Debug)]
#[command(name = "gemdoc-server", version, about)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "GEMDOC_CONFIG")]
    config: Option<PathBuf>,

    /// Bind address (overrides config and GEMDOC_HOST)
    #[arg(long)]
    host: Option<String>,

    /// Port (overrides config and GEMDOC_PORT)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gemdoc_rag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut config = RagConfig::load(args.config.as_deref())?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    tracing::info!("Configuration loaded");
    tracing::info!("  - Embedder: {:?}", config.embeddings.backend);
    tracing::info!("  - LLM: {:?}", config.llm.backend);
    tracing::info!(
        "  - Chunking: {} chars, {} overlap",
        config.chunking.chunk_size,
        config.chunking.chunk_overlap
    );
    tracing::info!("  - Default top_k: {}", config.retrieval.default_top_k);

    let server = RagServer::new(config).await?;

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("\nEndpoints:");
    println!("  POST /upload  - Upload a PDF or DOCX (multipart field 'file')");
    println!("  POST /ask     - Ask a question (JSON or form: query, top_k)");
    println!("  GET  /status  - Index status");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
