use std::sync::Arc;
use std::time::Instant;

use extract::GraphExtraction;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tracing::{info, warn};
use validation::ValidationError;

use crate::graph_data::GraphData;
use crate::metrics::MergeMetrics;

/// An extraction the merge task refused, with the reason.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedExtraction {
    pub chunk_id: String,
    pub error: ValidationError,
}

#[derive(Debug)]
pub struct MergeReport {
    pub graph: GraphData,
    pub merged: usize,
    pub rejected: Vec<RejectedExtraction>,
}

#[derive(Debug, Serialize)]
pub struct MergeReportSummary {
    pub entities: usize,
    pub relationships: usize,
    pub merged: usize,
    pub rejected: usize,
}

impl MergeReport {
    pub fn summary(&self) -> MergeReportSummary {
        MergeReportSummary {
            entities: self.graph.entity_count(),
            relationships: self.graph.relationship_count(),
            merged: self.merged,
            rejected: self.rejected.len(),
        }
    }
}

/// Producer side of the merge queue. Cheap to clone, one per extraction worker.
#[derive(Clone)]
pub struct MergeSender {
    tx: mpsc::Sender<GraphExtraction>,
}

impl MergeSender {
    /// Waits for queue space. Fails only if the merge task is gone.
    pub async fn submit(
        &self,
        extraction: GraphExtraction,
    ) -> Result<(), mpsc::error::SendError<GraphExtraction>> {
        self.tx.send(extraction).await
    }
}

pub struct MergeHandle {
    join: JoinHandle<MergeReport>,
    metrics: Arc<MergeMetrics>,
}

impl MergeHandle {
    pub fn metrics(&self) -> &Arc<MergeMetrics> {
        &self.metrics
    }

    /// Resolves once every `MergeSender` has been dropped and the queue is drained.
    pub async fn finish(self) -> Result<MergeReport, JoinError> {
        self.join.await
    }
}

/// Owns a `GraphData` on a single task so merges never race.
pub struct GraphMerger;

impl GraphMerger {
    pub fn spawn(graph: GraphData, capacity: usize) -> (MergeSender, MergeHandle) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let metrics = MergeMetrics::new();
        let join = tokio::spawn(run(graph, rx, Arc::clone(&metrics)));

        (MergeSender { tx }, MergeHandle { join, metrics })
    }
}

async fn run(
    mut graph: GraphData,
    mut rx: mpsc::Receiver<GraphExtraction>,
    metrics: Arc<MergeMetrics>,
) -> MergeReport {
    let mut merged = 0;
    let mut rejected = Vec::new();

    while let Some(extraction) = rx.recv().await {
        let chunk_id = extraction.chunk_id().to_string();
        let started = Instant::now();

        match graph.merge_extraction(extraction) {
            Ok(summary) => {
                metrics.record_merge(started.elapsed(), &summary);
                merged += 1;
            }
            Err(error) => {
                metrics.record_rejection(started.elapsed());
                warn!(chunk_id = %chunk_id, error = %error, "Rejected extraction");
                rejected.push(RejectedExtraction { chunk_id, error });
            }
        }
    }

    info!(
        merged = merged,
        rejected = rejected.len(),
        entities = graph.entity_count(),
        relationships = graph.relationship_count(),
        "Merge queue drained"
    );

    MergeReport {
        graph,
        merged,
        rejected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use extract::{Entity, Relationship};
    use validation::Properties;

    fn worker_extraction(worker: usize) -> GraphExtraction {
        let a = format!("w{worker}-a");
        let b = format!("w{worker}-b");
        GraphExtraction::new(
            format!("chunk-{worker}"),
            vec![
                Entity::with_id(&a, format!("Alpha {worker}"), "CONCEPT").unwrap(),
                Entity::with_id(&b, format!("Beta {worker}"), "CONCEPT").unwrap(),
            ],
            vec![
                Relationship::new(&a, &b, "CONTAINS").unwrap(),
                Relationship::new(&a, "root", "MENTIONS").unwrap(),
            ],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_concurrent_producers() {
        let root = Entity::with_id("root", "Root", "CONCEPT").unwrap();
        let graph = GraphData::new(vec![root], vec![], Properties::new()).unwrap();
        let (sender, handle) = GraphMerger::spawn(graph, 4);

        let mut workers = Vec::new();
        for worker in 0..8 {
            let sender = sender.clone();
            workers.push(tokio::spawn(async move {
                sender.submit(worker_extraction(worker)).await.unwrap();
            }));
        }
        for worker in workers {
            worker.await.unwrap();
        }
        drop(sender);

        let metrics = Arc::clone(handle.metrics());
        let report = handle.finish().await.unwrap();
        assert_eq!(report.merged, 8);
        assert!(report.rejected.is_empty());
        assert_eq!(report.graph.entity_count(), 17);
        assert_eq!(report.graph.relationship_count(), 16);
        assert_eq!(metrics.snapshot().entities_added, 16);
    }

    #[tokio::test]
    async fn test_rejections_do_not_stop_the_task() {
        let (sender, handle) = GraphMerger::spawn(GraphData::empty(), 2);

        // "root" does not exist in an empty graph.
        sender.submit(worker_extraction(1)).await.unwrap();
        let dangling = GraphExtraction::new(
            "bad-chunk",
            vec![],
            vec![Relationship::new("w1-a", "missing", "USES").unwrap()],
        )
        .unwrap();
        sender.submit(dangling).await.unwrap();
        let good = GraphExtraction::new(
            "good-chunk",
            vec![Entity::with_id("solo", "Solo", "EVENT").unwrap()],
            vec![],
        )
        .unwrap();
        sender.submit(good).await.unwrap();
        drop(sender);

        let report = handle.finish().await.unwrap();
        assert_eq!(report.merged, 1);
        assert_eq!(report.rejected.len(), 2);
        assert_eq!(report.rejected[0].chunk_id, "chunk-1");
        assert_eq!(report.rejected[1].chunk_id, "bad-chunk");
        assert!(matches!(report.rejected[1].error, ValidationError::DanglingReference { .. }));
        assert_eq!(report.graph.entity_count(), 1);

        let summary = report.summary();
        assert_eq!(summary.rejected, 2);
        assert_eq!(summary.entities, 1);
    }
}
