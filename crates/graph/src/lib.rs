pub mod graph_data;
pub mod merger;
pub mod metrics;

pub use graph_data::{GraphData, MergeSummary};
pub use merger::{
    GraphMerger, MergeHandle, MergeReport, MergeReportSummary, MergeSender, RejectedExtraction,
};
pub use metrics::{MergeMetrics, MergeMetricsSnapshot};
