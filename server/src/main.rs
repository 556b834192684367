use anyhow::Result;
use axum::Router;
use clap::{Args, Parser, Subcommand};
use search_core::evaluation::{evaluate, load_judgments};
use search_core::{DocType, EngineConfig, SearchEngine, SortOrder};
use server::build_app;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "server")]
#[command(about = "Answer French natural-language queries over the bulletin index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct DataArgs {
    /// Directory holding the index and lexicon files
    #[arg(long, default_value = search_core::config::DEFAULT_DATA_DIR)]
    data: PathBuf,
    /// Optional JSON engine configuration; overrides --data
    #[arg(long)]
    config: Option<PathBuf>,
}

impl DataArgs {
    fn engine_config(&self) -> Result<EngineConfig> {
        Ok(match &self.config {
            Some(path) => EngineConfig::from_json_file(path)?,
            None => EngineConfig::with_data_dir(&self.data),
        })
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API
    Serve {
        #[command(flatten)]
        data: DataArgs,
        /// Host to bind
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
        /// Port to bind
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
    /// Run one query and print the result set
    Query {
        #[command(flatten)]
        data: DataArgs,
        /// The query, in French
        text: String,
        /// Order article ids by publication date (`asc` or `desc`)
        #[arg(long)]
        sort: Option<SortOrder>,
    },
    /// Score the engine against relevance judgments
    Evaluate {
        #[command(flatten)]
        data: DataArgs,
        /// JSON array of {"query": ..., "relevant": [...]}
        #[arg(long)]
        judgments: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { data, host, port } => {
            let app: Router = build_app(data.engine_config()?)?;
            let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
            let listener = TcpListener::bind(addr).await?;
            tracing::info!(%addr, "server listening");
            axum::serve(listener, app).await?;
        }
        Commands::Query { data, text, sort } => {
            let engine = SearchEngine::open(&data.engine_config()?)?;
            let result = tokio::task::spawn_blocking(move || -> search_core::Result<serde_json::Value> {
                let result = engine.search(&text)?;
                Ok(match (&result.ids, sort) {
                    (Some(ids), Some(order)) if result.doc_type == DocType::Article => serde_json::json!({
                        "doc_type": result.doc_type,
                        "ids": engine.sort_by_date(ids, order),
                    }),
                    _ => serde_json::to_value(&result)?,
                })
            })
            .await??;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Evaluate { data, judgments } => {
            let engine = SearchEngine::open(&data.engine_config()?)?;
            let judgments = load_judgments(&judgments)?;
            let report = evaluate(&engine, &judgments)?;
            for q in &report.queries {
                println!(
                    "{:.2}\t{:.2}\t{:.2}\t{:.1}ms\t{}",
                    q.precision, q.recall, q.f_measure, q.elapsed_ms, q.query
                );
            }
            println!(
                "mean\tprecision {:.2}\trecall {:.2}\tf-measure {:.2}",
                report.mean_precision, report.mean_recall, report.mean_f_measure
            );
        }
    }
    Ok(())
}
