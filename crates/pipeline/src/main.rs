mod commands;
mod config;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::PipelineConfig;

#[derive(Parser)]
#[command(name = "pipeline", about = "Validate and merge knowledge-graph extraction data")]
struct Cli {
    /// JSON config file; built-in defaults when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate the configured schema and print its vocabulary
    CheckConfig,
    /// Load a graph file, re-running every validation check
    ValidateGraph { file: PathBuf },
    /// Merge extraction files into a graph
    Merge {
        /// Existing graph to grow; starts empty when omitted
        #[arg(long)]
        graph: Option<PathBuf>,
        #[arg(long)]
        out: PathBuf,
        extractions: Vec<PathBuf>,
    },
    /// Print the extraction prompt for one chunk of text
    RenderPrompt { text_file: PathBuf },
    /// Report gaps and repeats in chunk positions per article
    CheckChunks { file: PathBuf },
    /// Summarize a batch of scrape outcomes
    CheckScrape { file: PathBuf },
}

fn init_tracing(config: &PipelineConfig) -> Result<()> {
    let level = config.log_level()?;
    let builder = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr);

    if config.logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = PipelineConfig::load_or_default(cli.config.as_deref())?;
    init_tracing(&config)?;

    match cli.command {
        Command::CheckConfig => {
            commands::check_config(&config)?;
        }
        Command::ValidateGraph { file } => {
            commands::validate_graph(&file)?;
        }
        Command::Merge {
            graph,
            out,
            extractions,
        } => {
            let outcome = commands::merge(&config, graph.as_deref(), &extractions, &out).await?;
            if !outcome.report.rejected.is_empty() || !outcome.unreadable.is_empty() {
                tracing::warn!(
                    rejected = outcome.report.rejected.len(),
                    unreadable = outcome.unreadable.len(),
                    "Some extractions were not merged"
                );
            }
        }
        Command::RenderPrompt { text_file } => {
            commands::render_prompt(&config, &text_file)?;
        }
        Command::CheckChunks { file } => {
            commands::check_chunks(&file)?;
        }
        Command::CheckScrape { file } => {
            commands::check_scrape(&file)?;
        }
    }

    Ok(())
}
