use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use extract::GraphExtraction;
use graph::{GraphData, GraphMerger, MergeReport, MergeReportSummary};
use ingest::{FailureLog, ScrapeOutcome, TextChunk};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::config::PipelineConfig;

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path).context(format!("Failed to read file: {:?}", path))?;
    serde_json::from_str(&raw).context(format!("Invalid data in {:?}", path))
}

/// An extraction item that never reached the merge task.
#[derive(Debug, Clone, Serialize)]
pub struct UnreadableExtraction {
    pub file: PathBuf,
    /// Position in an array file; `None` for a single-object file or a file
    /// that could not be read at all.
    pub index: Option<usize>,
    pub chunk_id: Option<String>,
    pub error: String,
}

impl UnreadableExtraction {
    fn new(file: &Path, index: Option<usize>, item: Option<&Value>, error: String) -> Self {
        let chunk_id = item
            .and_then(|item| item.get("chunk_id"))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string);
        Self {
            file: file.to_path_buf(),
            index,
            chunk_id,
            error,
        }
    }
}

/// A file may hold one extraction or an array of them. Each array item is
/// validated on its own so one bad item does not sink the rest of the file.
fn read_extractions(path: &Path) -> (Vec<GraphExtraction>, Vec<UnreadableExtraction>) {
    let value: Value = match read_json(path) {
        Ok(value) => value,
        Err(e) => {
            let error = format!("{:#}", e);
            return (Vec::new(), vec![UnreadableExtraction::new(path, None, None, error)]);
        }
    };

    let items: Vec<(Option<usize>, Value)> = match value {
        Value::Array(items) => items.into_iter().enumerate().map(|(i, v)| (Some(i), v)).collect(),
        one => vec![(None, one)],
    };

    let mut extractions = Vec::with_capacity(items.len());
    let mut unreadable = Vec::new();
    for (index, item) in items {
        match GraphExtraction::deserialize(&item) {
            Ok(extraction) => extractions.push(extraction),
            Err(e) => unreadable.push(UnreadableExtraction::new(path, index, Some(&item), e.to_string())),
        }
    }
    (extractions, unreadable)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct SchemaReport {
    pub entity_types: Vec<String>,
    pub relationship_types: Vec<String>,
    pub custom_prompt: bool,
}

pub fn check_config(config: &PipelineConfig) -> Result<SchemaReport> {
    let schema = config.to_schema()?;
    let report = SchemaReport {
        entity_types: schema.entity_types().to_vec(),
        relationship_types: schema.relationship_types().to_vec(),
        custom_prompt: config.schema.extraction_prompt.is_some(),
    };
    print_json(&report)?;
    Ok(report)
}

#[derive(Debug, Serialize)]
pub struct GraphCounts {
    pub entities: usize,
    pub relationships: usize,
    pub metadata_keys: usize,
}

pub fn validate_graph(path: &Path) -> Result<GraphCounts> {
    let graph: GraphData = read_json(path)?;
    let counts = GraphCounts {
        entities: graph.entity_count(),
        relationships: graph.relationship_count(),
        metadata_keys: graph.metadata().len(),
    };
    info!(file = ?path, entities = counts.entities, relationships = counts.relationships, "Graph is valid");
    print_json(&counts)?;
    Ok(counts)
}

pub fn render_prompt(config: &PipelineConfig, text_file: &Path) -> Result<String> {
    let schema = config.to_schema()?;
    let text = std::fs::read_to_string(text_file)
        .context(format!("Failed to read file: {:?}", text_file))?;
    let prompt = schema.render_prompt(text.trim());
    println!("{}", prompt);
    Ok(prompt)
}

#[derive(Debug)]
pub struct MergeOutcome {
    pub report: MergeReport,
    pub unreadable: Vec<UnreadableExtraction>,
}

#[derive(Debug, Serialize)]
struct RejectedChunk<'a> {
    chunk_id: &'a str,
    error: String,
}

#[derive(Debug, Serialize)]
struct MergeOutput<'a> {
    #[serde(flatten)]
    summary: MergeReportSummary,
    rejected_chunks: Vec<RejectedChunk<'a>>,
    unreadable: &'a [UnreadableExtraction],
}

impl MergeOutcome {
    fn output(&self) -> MergeOutput<'_> {
        MergeOutput {
            summary: self.report.summary(),
            rejected_chunks: self
                .report
                .rejected
                .iter()
                .map(|r| RejectedChunk {
                    chunk_id: &r.chunk_id,
                    error: r.error.to_string(),
                })
                .collect(),
            unreadable: &self.unreadable,
        }
    }
}

/// Feed every extraction file through the merge task and write the result.
///
/// Unreadable items and rejected extractions are logged and reported; the
/// rest of the batch still merges.
pub async fn merge(
    config: &PipelineConfig,
    graph_file: Option<&Path>,
    extraction_files: &[PathBuf],
    out: &Path,
) -> Result<MergeOutcome> {
    let graph = match graph_file {
        Some(path) => read_json(path)?,
        None => GraphData::empty(),
    };

    let (sender, handle) = GraphMerger::spawn(graph, config.merge.channel_capacity);
    let mut unreadable = Vec::new();

    for path in extraction_files {
        let (extractions, failures) = read_extractions(path);
        for failure in &failures {
            warn!(
                file = ?failure.file,
                index = ?failure.index,
                chunk_id = ?failure.chunk_id,
                error = %failure.error,
                "Skipping unreadable extraction"
            );
        }
        unreadable.extend(failures);

        for extraction in extractions {
            sender
                .submit(extraction)
                .await
                .context("Merge task stopped unexpectedly")?;
        }
    }
    drop(sender);

    let metrics = handle.metrics().clone();
    let report = handle.finish().await.context("Merge task panicked")?;

    let json = serde_json::to_string_pretty(&report.graph)?;
    std::fs::write(out, json).context(format!("Failed to write graph: {:?}", out))?;

    info!(
        out = ?out,
        unreadable = unreadable.len(),
        "Merged graph written"
    );

    let outcome = MergeOutcome { report, unreadable };
    print_json(&outcome.output())?;
    print_json(&metrics.snapshot())?;

    Ok(outcome)
}

#[derive(Debug, Default, Serialize)]
pub struct ChunkReport {
    pub chunks: usize,
    pub articles: usize,
    /// source_url -> inclusive `(start, end)` runs missing from its 0-based sequence
    pub gaps: BTreeMap<String, Vec<(usize, usize)>>,
    /// source_url -> positions used more than once
    pub repeated: BTreeMap<String, Vec<usize>>,
}

/// Check the chunker's sequencing obligation. Problems are reported, not fixed.
pub fn check_chunks(path: &Path) -> Result<ChunkReport> {
    let chunks: Vec<TextChunk> = read_json(path)?;
    let report = chunk_report(&chunks);

    for (url, missing) in &report.gaps {
        warn!(source_url = %url, missing = ?missing, "Chunk positions have gaps");
    }
    for (url, repeated) in &report.repeated {
        warn!(source_url = %url, repeated = ?repeated, "Chunk positions repeat");
    }
    print_json(&report)?;
    Ok(report)
}

fn chunk_report(chunks: &[TextChunk]) -> ChunkReport {
    let mut positions: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for chunk in chunks {
        positions.entry(chunk.source_url()).or_default().push(chunk.position());
    }

    let mut report = ChunkReport {
        chunks: chunks.len(),
        articles: positions.len(),
        ..Default::default()
    };

    for (url, mut seen) in positions {
        seen.sort_unstable();
        let mut repeated = Vec::new();
        let mut missing = Vec::new();
        let mut expected = 0;
        for (i, &pos) in seen.iter().enumerate() {
            if i > 0 && seen[i - 1] == pos {
                repeated.push(pos);
                continue;
            }
            if pos > expected {
                missing.push((expected, pos - 1));
            }
            expected = pos.saturating_add(1);
        }

        if !missing.is_empty() {
            report.gaps.insert(url.to_string(), missing);
        }
        if !repeated.is_empty() {
            repeated.dedup();
            report.repeated.insert(url.to_string(), repeated);
        }
    }

    report
}

#[derive(Debug, Serialize)]
pub struct ScrapeReport {
    pub scraped: usize,
    pub failed: usize,
    pub failures_by_domain: BTreeMap<String, usize>,
}

pub fn check_scrape(path: &Path) -> Result<ScrapeReport> {
    let outcomes: Vec<ScrapeOutcome> = read_json(path)?;
    let mut log = FailureLog::new();
    let articles = log.collect(outcomes);

    let report = ScrapeReport {
        scraped: articles.len(),
        failed: log.len(),
        failures_by_domain: log
            .by_domain()
            .into_iter()
            .map(|(domain, count)| (domain.to_string(), count))
            .collect(),
    };
    print_json(&report)?;
    Ok(report)
}
