mod api_error;
mod backends;
mod pipeline;
mod server;

use anyhow::Context;
use backends::{process_env, EmbedderKind, LiveBackends, StoreKind};
use chrono::Utc;
use clap::{Parser, Subcommand};
use pdf_qa_core::{ErrorClass, PipelineError, ResetOutcome, DEFAULT_COLLECTION};
use pipeline::Pipeline;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "pdf-qa", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Vector store collection
    #[arg(long, global = true, env = "COLLECTION_NAME", default_value = DEFAULT_COLLECTION)]
    collection: String,

    /// Vector store backend
    #[arg(long, global = true, value_enum, default_value_t = StoreKind::Qdrant)]
    store: StoreKind,

    /// Embedding backend
    #[arg(long, global = true, value_enum, default_value_t = EmbedderKind::Http)]
    embedder: EmbedderKind,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API and the dashboard.
    Serve {
        /// Address to listen on.
        #[arg(long, env = "API_ADDRESS", default_value = "127.0.0.1:8000")]
        bind: String,
    },
    /// Load, split, embed and store a PDF file or a folder of PDFs.
    Ingest {
        #[arg(long)]
        file: PathBuf,
    },
    /// Answer a question from the stored chunks.
    Ask {
        #[arg(long)]
        question: String,
    },
    /// Delete the whole collection.
    Reset,
    /// Ingest the documents under DOCUMENTS_PATH, then answer a question.
    Batch {
        #[arg(long)]
        question: String,
    },
}

fn describe(err: PipelineError) -> anyhow::Error {
    let hint = match err.class() {
        ErrorClass::Configuration => "missing configuration, check the environment or .env file",
        ErrorClass::Input => "invalid input",
        ErrorClass::NoCorpus => "nothing ingested yet, run `pdf-qa ingest --file <pdf>` first",
        ErrorClass::Provider => "backend request failed",
    };
    anyhow::Error::new(err).context(hint)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_file(true).with_line_number(true))
        .init();

    let cli = Cli::parse();
    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        collection = %cli.collection,
        store = ?cli.store,
        embedder = ?cli.embedder,
        "pdf-qa boot"
    );

    let backends = Arc::new(LiveBackends::new(cli.store, cli.embedder, &cli.collection));
    let pipeline = Pipeline::new(backends, process_env());

    match cli.command {
        Command::Serve { bind } => server::run_server(&bind, pipeline).await?,
        Command::Ingest { file } => {
            let report = pipeline.ingest(&file).await.map_err(describe)?;
            println!(
                "{} pages, {} chunks ingested into '{}' at {}",
                report.pages,
                report.chunks,
                cli.collection,
                report.ingested_at.to_rfc3339()
            );
        }
        Command::Ask { question } => {
            let answer = pipeline.ask(&question).await.map_err(describe)?;
            println!("{}", answer.answer);
        }
        Command::Reset => match pipeline.reset().await.map_err(describe)? {
            ResetOutcome::Deleted => println!("collection '{}' deleted", cli.collection),
            ResetOutcome::NothingToDelete => {
                println!("collection '{}' is already empty or does not exist", cli.collection)
            }
        },
        Command::Batch { question } => {
            let folder = pipeline
                .documents_path()
                .context("the batch run reads its documents from DOCUMENTS_PATH")?;
            let report = pipeline
                .ingest(Path::new(&folder))
                .await
                .map_err(describe)?;
            info!(folder = %folder, chunks = report.chunks, "batch ingestion finished");

            let answer = pipeline.ask(&question).await.map_err(describe)?;
            println!("question: {}", answer.question);
            println!("answer: {}", answer.answer);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_target_qdrant_rag_collection() {
        let cli = Cli::try_parse_from(["pdf-qa", "ask", "--question", "Who is Mike?"]).unwrap();
        assert_eq!(cli.collection, "rag");
        assert_eq!(cli.store, StoreKind::Qdrant);
        assert_eq!(cli.embedder, EmbedderKind::Http);
        assert!(matches!(cli.command, Command::Ask { ref question } if question == "Who is Mike?"));
    }

    #[test]
    fn backends_are_selectable_after_the_subcommand() {
        let cli = Cli::try_parse_from(["pdf-qa", "reset", "--store", "memory", "--embedder", "hashed"])
            .unwrap();
        assert_eq!(cli.store, StoreKind::Memory);
        assert_eq!(cli.embedder, EmbedderKind::Hashed);
        assert!(matches!(cli.command, Command::Reset));
    }

    #[test]
    fn missing_corpus_hint_points_to_ingest() {
        let err = describe(PipelineError::NoDocuments("collection 'rag' does not exist".to_string()));
        assert!(err.to_string().contains("pdf-qa ingest"));
    }
}
