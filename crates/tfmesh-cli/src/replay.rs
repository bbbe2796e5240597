//! Replay of rosbridge JSON-lines captures into a [`TransformNode`].

use std::path::Path;
use std::time::Duration;

use tfmesh_middleware::FeedStatsSnapshot;
use tfmesh_runtime::TransformNode;
use tfmesh_types::TfError;
use tracing::warn;

/// How long one published frame may take to reach the graph.
const SETTLE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Default)]
pub struct ReplayReport {
    pub lines: usize,
    /// Frames that reached at least one feed.
    pub delivered: usize,
    /// Rejected lines as `(line number, error)`.
    pub errors: Vec<(usize, TfError)>,
    pub stats: FeedStatsSnapshot,
}

/// Feed every line of `path` through the node's rosbridge ingest.
///
/// Each frame is fully handled by the feeds before the next one is
/// published, so replay never overruns the listener queues.
pub async fn replay_file(node: &TransformNode, path: &Path) -> Result<ReplayReport, String> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;

    let ingest = node.rosbridge();
    let mut report = ReplayReport::default();
    let mut expected = node.stats().batches;

    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        report.lines += 1;

        match ingest.ingest_text(line) {
            Ok(0) => {}
            Ok(reached) => {
                report.delivered += 1;
                expected += reached as u64;
                if !node.settle(expected, SETTLE_TIMEOUT).await {
                    warn!(line = index + 1, "feeds did not keep up with replay");
                }
            }
            Err(e) => {
                warn!(line = index + 1, error = %e, "skipping capture line");
                report.errors.push((index + 1, e));
            }
        }
    }

    report.stats = node.stats();
    Ok(report)
}
