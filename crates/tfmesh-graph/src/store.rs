//! [`FrameGraph`] – the live graph of coordinate frames.
//!
//! Frames are created implicitly by the first [`TransformRecord`] that names
//! them.  Every directed parent → child pair owns an [`EdgeHistory`];
//! reachability is evaluated on the *undirected* adjacency, so an edge
//! `A → B` also lets a lookup walk `B → A` through the inverse transform.
//! Disconnected forests and cycles are both allowed.
//!
//! # Locking
//!
//! * Each edge history sits behind its own [`RwLock`] inside a [`DashMap`],
//!   so producers updating different edges never contend.
//! * The frame adjacency sits behind one coarse [`RwLock`], taken for writing
//!   only when an update introduces a brand-new edge.  The edge and its first
//!   record are published under that lock, so a frame is never reachable
//!   before its edge holds data.
//!
//! A lookup reads the adjacency for path discovery, releases it, and then
//! read-locks each edge on the path in turn, so it never observes a
//! half-inserted record.  Edges are never removed.
//!
//! # Example
//!
//! ```rust
//! use tfmesh_graph::{FrameGraph, GraphOptions};
//! use tfmesh_types::{Quaternion, Stamp, TransformRecord, Vec3};
//!
//! let graph = FrameGraph::new(GraphOptions::default());
//! let t = Stamp::from_millis(1000);
//! graph.update(TransformRecord::new("map", "robot", Vec3::new(1.0, 0.0, 0.0), Quaternion::identity(), t).unwrap());
//! graph.update(TransformRecord::new("robot", "camera", Vec3::new(0.0, 0.0, 1.0), Quaternion::identity(), t).unwrap());
//!
//! let tf = graph.lookup("map", "camera", t).unwrap();
//! assert!((tf.translation.x - 1.0).abs() < 1e-9);
//! assert!((tf.translation.z - 1.0).abs() < 1e-9);
//! ```

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tfmesh_types::{RecordSink, Stamp, Transform3D, TransformRecord};
use tracing::{debug, trace};

use crate::history::{DEFAULT_HISTORY_CAPACITY, EdgeHistory, ResolutionPolicy};

/// Default staleness window: a query may reach 1 s past an edge's newest record.
pub const DEFAULT_MAX_STALENESS_MS: u64 = 1_000;

// ────────────────────────────────────────────────────────────────────────────
// Options & errors
// ────────────────────────────────────────────────────────────────────────────

/// Tuning knobs for a [`FrameGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphOptions {
    /// Records retained per directed edge.
    pub history_capacity: usize,
    /// How query times between two records are answered.
    pub policy: ResolutionPolicy,
    /// How far (ms) past an edge's newest record a query may still use it.
    /// `None` accepts records of any age.
    pub max_staleness_ms: Option<u64>,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            policy: ResolutionPolicy::default(),
            max_staleness_ms: Some(DEFAULT_MAX_STALENESS_MS),
        }
    }
}

/// Why a lookup could not be answered.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("frame '{0}' does not exist")]
    UnknownFrame(String),

    #[error("no path connects '{from}' and '{to}'")]
    NoPath { from: String, to: String },

    #[error("edge '{parent}' -> '{child}' has no data usable at {stamp}")]
    NoDataAtTime {
        parent: String,
        child: String,
        stamp: Stamp,
    },
}

/// One step along a resolved path.
///
/// The edge is always named in its stored direction; `inverted` is set when
/// the path walks it from child to parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hop {
    pub parent: String,
    pub child: String,
    pub inverted: bool,
}

type EdgeKey = (String, String);

// ────────────────────────────────────────────────────────────────────────────
// FrameGraph
// ────────────────────────────────────────────────────────────────────────────

/// Concurrent store of frames and their time-varying edges.
pub struct FrameGraph {
    options: GraphOptions,
    /// Undirected neighbour sets; sorted so path discovery is deterministic.
    adjacency: RwLock<HashMap<String, BTreeSet<String>>>,
    edges: DashMap<EdgeKey, Arc<RwLock<EdgeHistory>>>,
    /// Number of records accepted so far.
    revision: AtomicU64,
}

impl FrameGraph {
    pub fn new(options: GraphOptions) -> Self {
        Self {
            options,
            adjacency: RwLock::new(HashMap::new()),
            edges: DashMap::new(),
            revision: AtomicU64::new(0),
        }
    }

    pub fn options(&self) -> &GraphOptions {
        &self.options
    }

    /// Insert `record` into its edge history, creating frames on first sight.
    pub fn update(&self, record: TransformRecord) {
        trace!(
            parent = record.parent(),
            child = record.child(),
            stamp = %record.stamp(),
            "tf update"
        );

        match self.history(record.parent(), record.child()) {
            Some(history) => history.write().insert(record),
            None => self.insert_edge(record),
        }

        self.revision.fetch_add(1, Ordering::Release);
    }

    /// Compose the transform giving `target`'s pose in `source` at `stamp`.
    pub fn lookup(
        &self,
        source: &str,
        target: &str,
        stamp: Stamp,
    ) -> Result<Transform3D, GraphError> {
        if source == target {
            return Ok(Transform3D::identity());
        }

        let hops = self.path(source, target)?;
        hops.iter().try_fold(Transform3D::identity(), |acc, hop| {
            Ok(acc.compose(self.resolve_hop(hop, stamp)?))
        })
    }

    /// `true` when [`FrameGraph::lookup`] would succeed.
    pub fn can_transform(&self, source: &str, target: &str, stamp: Stamp) -> bool {
        self.lookup(source, target, stamp).is_ok()
    }

    /// The newest stamp at which every edge between `source` and `target`
    /// has data: the minimum over the path of each edge's newest stamp.
    ///
    /// Static edges hold at any time and do not constrain the result.
    /// Returns [`Stamp::ZERO`] for `source == target` and for all-static
    /// paths.
    pub fn latest_common_stamp(&self, source: &str, target: &str) -> Result<Stamp, GraphError> {
        if source == target {
            return Ok(Stamp::ZERO);
        }

        let mut latest: Option<Stamp> = None;
        for hop in self.path(source, target)? {
            let history = self.history(&hop.parent, &hop.child);
            let newest = history.as_ref().and_then(|h| {
                let h = h.read();
                let newest = h.newest().map(|r| (r.stamp(), h.is_static()));
                newest
            });
            match newest {
                Some((_, true)) => {}
                Some((stamp, false)) => latest = Some(latest.map_or(stamp, |l| l.min(stamp))),
                None => {
                    return Err(GraphError::NoDataAtTime {
                        parent: hop.parent,
                        child: hop.child,
                        stamp: Stamp::ZERO,
                    });
                }
            }
        }
        Ok(latest.unwrap_or(Stamp::ZERO))
    }

    /// Shortest hop sequence from `source` to `target` (breadth-first over
    /// the undirected adjacency; time plays no part).
    pub fn path(&self, source: &str, target: &str) -> Result<Vec<Hop>, GraphError> {
        let nodes = {
            let adjacency = self.adjacency.read();
            for frame in [source, target] {
                if !adjacency.contains_key(frame) {
                    return Err(GraphError::UnknownFrame(frame.to_string()));
                }
            }
            bfs(&adjacency, source, target).ok_or_else(|| GraphError::NoPath {
                from: source.to_string(),
                to: target.to_string(),
            })?
        };

        Ok(nodes
            .windows(2)
            .map(|pair| {
                let (from, to) = (&pair[0], &pair[1]);
                if self.edges.contains_key(&(from.clone(), to.clone())) {
                    Hop {
                        parent: from.clone(),
                        child: to.clone(),
                        inverted: false,
                    }
                } else {
                    Hop {
                        parent: to.clone(),
                        child: from.clone(),
                        inverted: true,
                    }
                }
            })
            .collect())
    }

    /// All frames seen so far, sorted by name.
    pub fn frames(&self) -> Vec<String> {
        let mut frames: Vec<String> = self.adjacency.read().keys().cloned().collect();
        frames.sort();
        frames
    }

    /// Number of directed edges with at least one record.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Number of records accepted so far; doubles as a logical version.
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }

    /// Snapshot of one edge's retained records, oldest first.
    pub fn edge_records(&self, parent: &str, child: &str) -> Vec<TransformRecord> {
        self.history(parent, child)
            .map(|h| h.read().iter().cloned().collect())
            .unwrap_or_default()
    }

    // ────────────────────────────────────────────────────────────────────────
    // Internal helpers
    // ────────────────────────────────────────────────────────────────────────

    fn history(&self, parent: &str, child: &str) -> Option<Arc<RwLock<EdgeHistory>>> {
        self.edges
            .get(&(parent.to_string(), child.to_string()))
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Publish a brand-new edge together with its first record.
    ///
    /// Runs under the adjacency write lock, so a lookup sees the edge either
    /// not at all or already holding data.
    fn insert_edge(&self, record: TransformRecord) {
        let mut adjacency = self.adjacency.write();

        // Another producer may have created the edge while we waited.
        if let Some(history) = self.history(record.parent(), record.child()) {
            history.write().insert(record);
            return;
        }

        let (parent, child) = (record.parent().to_string(), record.child().to_string());
        debug!(parent = %parent, child = %child, "new frame edge");

        let mut history = EdgeHistory::with_capacity(self.options.history_capacity);
        history.insert(record);
        self.edges
            .insert((parent.clone(), child.clone()), Arc::new(RwLock::new(history)));

        adjacency
            .entry(parent.clone())
            .or_default()
            .insert(child.clone());
        adjacency.entry(child).or_default().insert(parent);
    }

    fn resolve_hop(&self, hop: &Hop, stamp: Stamp) -> Result<Transform3D, GraphError> {
        let no_data = || GraphError::NoDataAtTime {
            parent: hop.parent.clone(),
            child: hop.child.clone(),
            stamp,
        };
        let max_staleness = self
            .options
            .max_staleness_ms
            .map(|ms| Stamp::from_millis(ms).as_nanos());

        let history = self.history(&hop.parent, &hop.child).ok_or_else(no_data)?;
        let edge = history
            .read()
            .resolve(stamp, self.options.policy, max_staleness)
            .ok_or_else(no_data)?;

        Ok(if hop.inverted { edge.inverse() } else { edge })
    }
}

impl Default for FrameGraph {
    fn default() -> Self {
        Self::new(GraphOptions::default())
    }
}

impl RecordSink for FrameGraph {
    fn update(&self, records: Vec<TransformRecord>) {
        for record in records {
            FrameGraph::update(self, record);
        }
    }
}

/// Breadth-first search returning the node sequence `source ..= target`.
fn bfs(
    adjacency: &HashMap<String, BTreeSet<String>>,
    source: &str,
    target: &str,
) -> Option<Vec<String>> {
    let mut came_from: HashMap<&str, &str> = HashMap::new();
    let mut queue: VecDeque<&str> = VecDeque::new();
    queue.push_back(source);
    came_from.insert(source, source);

    while let Some(current) = queue.pop_front() {
        if current == target {
            let mut path = vec![target.to_string()];
            let mut node = target;
            while node != source {
                node = came_from[node];
                path.push(node.to_string());
            }
            path.reverse();
            return Some(path);
        }
        for next in adjacency.get(current).into_iter().flatten() {
            let next = next.as_str();
            if !came_from.contains_key(next) {
                came_from.insert(next, current);
                queue.push_back(next);
            }
        }
    }
    None
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;
    use std::thread;
    use tfmesh_types::{Quaternion, Vec3};

    const EPS: f64 = 1e-9;

    fn rec(parent: &str, child: &str, ms: u64, t: Vec3, q: Quaternion) -> TransformRecord {
        TransformRecord::new(parent, child, t, q, Stamp::from_millis(ms)).unwrap()
    }

    fn translation(graph: &FrameGraph, from: &str, to: &str, ms: u64) -> Vec3 {
        graph
            .lookup(from, to, Stamp::from_millis(ms))
            .unwrap()
            .translation
    }

    #[test]
    fn lookup_same_frame_returns_identity() {
        let graph = FrameGraph::default();
        let t = graph.lookup("world", "world", Stamp::ZERO).unwrap();
        assert_eq!(t, Transform3D::identity());
    }

    #[test]
    fn lookup_composed_chain() {
        let graph = FrameGraph::default();
        graph.update(rec("map", "robot", 1000, Vec3::new(1.0, 0.0, 0.0), Quaternion::identity()));
        graph.update(rec("robot", "camera", 1000, Vec3::new(0.0, 0.0, 1.0), Quaternion::identity()));

        let t = graph.lookup("map", "camera", Stamp::from_millis(1000)).unwrap();
        assert!((t.translation.x - 1.0).abs() < EPS);
        assert!(t.translation.y.abs() < EPS);
        assert!((t.translation.z - 1.0).abs() < EPS);
        assert!(t.rotation.dot(Quaternion::identity()).abs() > 1.0 - EPS);
    }

    #[test]
    fn lookup_walks_edges_backwards_through_inverse() {
        let graph = FrameGraph::default();
        graph.update(rec("map", "robot", 1000, Vec3::new(1.0, 0.0, 0.0), Quaternion::from_yaw(FRAC_PI_2)));

        let forward = graph.lookup("map", "robot", Stamp::from_millis(1000)).unwrap();
        let backward = graph.lookup("robot", "map", Stamp::from_millis(1000)).unwrap();
        assert!(forward.inverse().approx_eq(&backward, EPS));
        // map origin seen from robot: rotate -90° the vector (-1, 0, 0) → (0, 1, 0).
        assert!(backward.translation.x.abs() < EPS);
        assert!((backward.translation.y - 1.0).abs() < EPS);
    }

    #[test]
    fn lookup_between_siblings_goes_through_common_parent() {
        let graph = FrameGraph::default();
        graph.update(rec("base", "left", 0, Vec3::new(0.0, 1.0, 0.0), Quaternion::identity()));
        graph.update(rec("base", "right", 0, Vec3::new(0.0, -1.0, 0.0), Quaternion::identity()));

        let t = translation(&graph, "left", "right", 0);
        assert!((t.y + 2.0).abs() < EPS);
        let hops = graph.path("left", "right").unwrap();
        assert_eq!(hops.len(), 2);
        assert!(hops[0].inverted);
        assert!(!hops[1].inverted);
    }

    #[test]
    fn lookup_prefers_shortest_path_in_a_cycle() {
        let graph = FrameGraph::default();
        graph.update(rec("a", "b", 0, Vec3::new(1.0, 0.0, 0.0), Quaternion::identity()));
        graph.update(rec("b", "c", 0, Vec3::new(1.0, 0.0, 0.0), Quaternion::identity()));
        graph.update(rec("a", "c", 0, Vec3::new(5.0, 0.0, 0.0), Quaternion::identity()));

        assert_eq!(graph.path("a", "c").unwrap().len(), 1);
        assert!((translation(&graph, "a", "c", 0).x - 5.0).abs() < EPS);
    }

    #[test]
    fn disconnected_forests_fail_with_both_names() {
        let graph = FrameGraph::default();
        graph.update(rec("map", "robot", 0, Vec3::zero(), Quaternion::identity()));
        graph.update(rec("odom", "base", 0, Vec3::zero(), Quaternion::identity()));

        let err = graph.lookup("map", "base", Stamp::ZERO).unwrap_err();
        assert_eq!(
            err,
            GraphError::NoPath {
                from: "map".to_string(),
                to: "base".to_string()
            }
        );
        assert!(err.to_string().contains("map") && err.to_string().contains("base"));
    }

    #[test]
    fn unknown_frame_is_reported() {
        let graph = FrameGraph::default();
        graph.update(rec("map", "robot", 0, Vec3::zero(), Quaternion::identity()));
        assert_eq!(
            graph.lookup("map", "ghost", Stamp::ZERO).unwrap_err(),
            GraphError::UnknownFrame("ghost".to_string())
        );
    }

    #[test]
    fn lookup_before_first_record_fails() {
        let graph = FrameGraph::default();
        graph.update(rec("map", "robot", 1000, Vec3::zero(), Quaternion::identity()));
        graph.update(rec("robot", "camera", 2000, Vec3::zero(), Quaternion::identity()));

        let err = graph.lookup("map", "camera", Stamp::from_millis(1500)).unwrap_err();
        assert!(matches!(
            err,
            GraphError::NoDataAtTime { ref parent, ref child, .. } if parent == "robot" && child == "camera"
        ));
    }

    #[test]
    fn lookup_interpolates_dynamic_edge() {
        let graph = FrameGraph::default();
        graph.update(rec("odom", "base", 1000, Vec3::new(0.0, 0.0, 0.0), Quaternion::identity()));
        graph.update(rec("odom", "base", 2000, Vec3::new(4.0, 0.0, 0.0), Quaternion::identity()));
        assert!((translation(&graph, "odom", "base", 1500).x - 2.0).abs() < EPS);
    }

    #[test]
    fn nearest_policy_snaps_to_closest_record() {
        let graph = FrameGraph::new(GraphOptions {
            policy: ResolutionPolicy::Nearest,
            ..GraphOptions::default()
        });
        graph.update(rec("odom", "base", 1000, Vec3::new(0.0, 0.0, 0.0), Quaternion::identity()));
        graph.update(rec("odom", "base", 2000, Vec3::new(4.0, 0.0, 0.0), Quaternion::identity()));
        assert!((translation(&graph, "odom", "base", 1800).x - 4.0).abs() < EPS);
    }

    #[test]
    fn staleness_window_bounds_latest_record() {
        let graph = FrameGraph::new(GraphOptions {
            max_staleness_ms: Some(50),
            ..GraphOptions::default()
        });
        graph.update(rec("odom", "base", 1000, Vec3::zero(), Quaternion::identity()));
        assert!(graph.can_transform("odom", "base", Stamp::from_millis(1050)));
        assert!(!graph.can_transform("odom", "base", Stamp::from_millis(1051)));
    }

    #[test]
    fn out_of_order_updates_match_in_order_updates() {
        let records: Vec<TransformRecord> = (0..6)
            .map(|i| {
                rec(
                    "odom",
                    "base",
                    1000 + i * 100,
                    Vec3::new(i as f64, (i * i) as f64, 0.0),
                    Quaternion::from_yaw(i as f64 * 0.1),
                )
            })
            .collect();

        let ordered = FrameGraph::default();
        for r in &records {
            ordered.update(r.clone());
        }
        let shuffled = FrameGraph::default();
        for i in [3, 0, 5, 1, 4, 2] {
            shuffled.update(records[i].clone());
        }

        for ms in [1000, 1050, 1230, 1499] {
            let a = ordered.lookup("odom", "base", Stamp::from_millis(ms)).unwrap();
            let b = shuffled.lookup("odom", "base", Stamp::from_millis(ms)).unwrap();
            assert!(a.approx_eq(&b, EPS), "mismatch at {ms} ms");
        }
    }

    #[test]
    fn latest_common_stamp_is_minimum_of_newest() {
        let graph = FrameGraph::default();
        graph.update(rec("map", "odom", 3000, Vec3::zero(), Quaternion::identity()));
        graph.update(rec("odom", "base", 1000, Vec3::zero(), Quaternion::identity()));
        graph.update(rec("odom", "base", 2000, Vec3::zero(), Quaternion::identity()));
        assert_eq!(
            graph.latest_common_stamp("map", "base").unwrap(),
            Stamp::from_millis(2000)
        );
        assert_eq!(graph.latest_common_stamp("map", "map").unwrap(), Stamp::ZERO);
    }

    #[test]
    fn static_mount_chains_with_dynamic_edge_over_time() {
        let graph = FrameGraph::default();
        graph.update(rec("base", "laser", 0, Vec3::new(0.0, 0.0, 0.5), Quaternion::identity()).into_static());
        for sec in 1..=5 {
            graph.update(rec("odom", "base", sec * 1000, Vec3::new(sec as f64, 0.0, 0.0), Quaternion::identity()));
        }

        let t = translation(&graph, "odom", "laser", 3000);
        assert!((t.x - 3.0).abs() < EPS);
        assert!((t.z - 0.5).abs() < EPS);

        assert_eq!(
            graph.latest_common_stamp("odom", "laser").unwrap(),
            Stamp::from_millis(5000)
        );
        assert_eq!(graph.latest_common_stamp("base", "laser").unwrap(), Stamp::ZERO);
        assert!(graph.can_transform("base", "laser", Stamp::ZERO));
        assert!(graph.can_transform("laser", "base", Stamp::from_millis(3_600_000)));
    }

    #[test]
    fn frames_revision_and_edges_are_tracked() {
        let graph = FrameGraph::default();
        assert_eq!(graph.revision(), 0);
        graph.update(rec("map", "robot", 0, Vec3::zero(), Quaternion::identity()));
        graph.update(rec("map", "robot", 10, Vec3::zero(), Quaternion::identity()));
        graph.update(rec("robot", "camera", 0, Vec3::zero(), Quaternion::identity()));

        assert_eq!(graph.frames(), vec!["camera", "map", "robot"]);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.revision(), 3);
        assert_eq!(graph.edge_records("map", "robot").len(), 2);
        assert!(graph.edge_records("robot", "map").is_empty());
    }

    #[test]
    fn concurrent_producers_and_consumers() {
        let graph = Arc::new(FrameGraph::default());
        FrameGraph::update(&graph, rec("map", "odom", 0, Vec3::new(1.0, 0.0, 0.0), Quaternion::identity()));

        let producers: Vec<_> = (0..4)
            .map(|p| {
                let graph = Arc::clone(&graph);
                thread::spawn(move || {
                    let child = format!("sensor_{p}");
                    for i in 0..200u64 {
                        FrameGraph::update(&graph, rec("odom", &child, i, Vec3::new(0.0, 1.0, 0.0), Quaternion::identity()));
                    }
                })
            })
            .collect();

        let consumer = {
            let graph = Arc::clone(&graph);
            thread::spawn(move || {
                for _ in 0..200 {
                    if let Ok(t) = graph.lookup("map", "sensor_0", Stamp::from_millis(0)) {
                        assert!((t.translation.x - 1.0).abs() < EPS);
                        assert!((t.translation.y - 1.0).abs() < EPS);
                    }
                }
            })
        };

        for handle in producers {
            handle.join().unwrap();
        }
        consumer.join().unwrap();

        assert_eq!(graph.revision(), 1 + 4 * 200);
        for p in 0..4 {
            let stamps: Vec<Stamp> = graph
                .edge_records("odom", &format!("sensor_{p}"))
                .iter()
                .map(TransformRecord::stamp)
                .collect();
            assert!(stamps.windows(2).all(|w| w[0] <= w[1]));
        }
    }

    #[test]
    fn racing_producers_share_one_new_edge() {
        let graph = Arc::new(FrameGraph::new(GraphOptions {
            history_capacity: 1000,
            ..GraphOptions::default()
        }));
        let barrier = Arc::new(std::sync::Barrier::new(2));

        let producers: Vec<_> = (0..2u64)
            .map(|p| {
                let graph = Arc::clone(&graph);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    for i in 0..100u64 {
                        FrameGraph::update(&graph, rec("map", "robot", i * 2 + p, Vec3::zero(), Quaternion::identity()));
                    }
                })
            })
            .collect();
        for handle in producers {
            handle.join().unwrap();
        }

        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.edge_records("map", "robot").len(), 200);
        assert_eq!(graph.frames(), vec!["map", "robot"]);
        assert_eq!(graph.path("robot", "map").unwrap().len(), 1);
    }

    #[test]
    fn new_edge_is_reachable_once_it_holds_data() {
        let graph = Arc::new(FrameGraph::default());
        FrameGraph::update(&graph, rec("map", "odom", 0, Vec3::zero(), Quaternion::identity()));

        let producer = {
            let graph = Arc::clone(&graph);
            thread::spawn(move || {
                for i in 0..200 {
                    FrameGraph::update(&graph, rec("odom", &format!("sensor_{i}"), 0, Vec3::zero(), Quaternion::identity()));
                }
            })
        };

        for i in 0..200 {
            let child = format!("sensor_{i}");
            while graph.edge_records("odom", &child).is_empty() {
                thread::yield_now();
            }
            assert!(graph.lookup("map", &child, Stamp::ZERO).is_ok(), "{child} not reachable");
        }
        producer.join().unwrap();
    }
}
