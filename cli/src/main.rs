use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use search_core::ingest::load_documents;
use search_core::{
    paginate, process_queries, process_queries_joined, remove_duplicates, DocId, DocumentStatus, ExecutionMode,
    SearchEngine,
};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "search")]
#[command(about = "Query an in-memory TF-IDF index built from JSON/JSONL documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct IndexArgs {
    /// Input path (file or directory of .json/.jsonl documents)
    #[arg(long)]
    input: PathBuf,
    /// Space-separated stop words
    #[arg(long, default_value = "")]
    stop_words: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the top documents for a query
    Query {
        #[command(flatten)]
        index: IndexArgs,
        query: String,
        /// Only documents with this status (actual, irrelevant, banned, removed)
        #[arg(long, default_value = "actual")]
        status: DocumentStatus,
        /// Accumulate relevance on the thread pool
        #[arg(long, default_value_t = false)]
        parallel: bool,
        #[arg(long, default_value_t = 2)]
        page_size: usize,
    },
    /// Print the query words found in one document
    Match {
        #[command(flatten)]
        index: IndexArgs,
        query: String,
        #[arg(long)]
        id: DocId,
    },
    /// Remove documents whose word sets repeat an earlier document
    Dedup {
        #[command(flatten)]
        index: IndexArgs,
    },
    /// Run one query per line of a file
    Batch {
        #[command(flatten)]
        index: IndexArgs,
        #[arg(long)]
        queries: PathBuf,
        /// Print one concatenated result list instead of one list per query
        #[arg(long, default_value_t = false)]
        joined: bool,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Query { index, query, status, parallel, page_size } => {
            let engine = open(&index)?;
            let mode = if parallel { ExecutionMode::Parallel } else { ExecutionMode::Sequential };
            let found = engine.find_top_documents_in(mode, &query, |_, s, _| s == status)?;
            for page in paginate(&found, page_size) {
                println!("{page}");
                println!("Page break");
            }
            Ok(())
        }
        Commands::Match { index, query, id } => {
            let engine = open(&index)?;
            let (words, status) = engine.match_document(&query, id)?;
            let words: Vec<&str> = words.iter().map(|w| w.as_str()).collect();
            println!("{{ document_id = {id}, status = {status:?}, words = {} }}", words.join(" "));
            Ok(())
        }
        Commands::Dedup { index } => {
            let mut engine = open(&index)?;
            let removed = remove_duplicates(&mut engine);
            for id in &removed {
                println!("Found duplicate document id {id}");
            }
            println!("{} documents remain", engine.document_count());
            Ok(())
        }
        Commands::Batch { index, queries, joined } => {
            let engine = open(&index)?;
            let text = fs::read_to_string(&queries).with_context(|| format!("reading {}", queries.display()))?;
            let queries: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
            if joined {
                for document in process_queries_joined(&engine, &queries[..])? {
                    println!("{document}");
                }
            } else {
                for (query, documents) in queries.iter().zip(process_queries(&engine, &queries[..])?) {
                    println!("{} documents for query [{query}]", documents.len());
                    for document in documents {
                        println!("  {document}");
                    }
                }
            }
            Ok(())
        }
    }
}

fn open(args: &IndexArgs) -> Result<SearchEngine> {
    let mut engine = SearchEngine::from_stop_words_text(&args.stop_words)?;
    let added = load_documents(&mut engine, &args.input)?;
    tracing::info!(documents = added, input = %args.input.display(), "index built");
    Ok(engine)
}
