use anyhow::Result;
use axum::Router;
use clap::Parser;
use search_core::ingest::load_documents;
use search_core::SearchEngine;
use search_server::{build_app, AppConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Documents to preload (.json/.jsonl file or directory)
    #[arg(long)]
    input: Option<PathBuf>,
    /// Space-separated stop words
    #[arg(long, default_value = "")]
    stop_words: String,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let mut engine = SearchEngine::from_stop_words_text(&args.stop_words)?;
    if let Some(input) = &args.input {
        let added = load_documents(&mut engine, input)?;
        tracing::info!(documents = added, input = %input.display(), "preloaded documents");
    }
    let app: Router = build_app(engine, AppConfig::from_env())?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
