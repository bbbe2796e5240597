//! [`TransformService`] – the public face of the frame graph.
//!
//! Callers speak milliseconds and frame names and get back a
//! [`GeometricTransform`] or a [`TfError::TransformNotFound`]; the graph's
//! own time base and error type stay behind this boundary.
//!
//! # Example
//!
//! ```rust
//! use tfmesh_runtime::service::TransformService;
//! use tfmesh_types::{Quaternion, Stamp, TransformRecord, Vec3};
//!
//! let service = TransformService::default();
//! let t = Stamp::from_millis(1000);
//! service.update(vec![
//!     TransformRecord::new("map", "robot", Vec3::new(1.0, 0.0, 0.0), Quaternion::identity(), t).unwrap(),
//!     TransformRecord::new("robot", "camera", Vec3::new(0.0, 0.0, 1.0), Quaternion::identity(), t).unwrap(),
//! ]);
//!
//! let tf = service.lookup("map", "camera", 1000).unwrap();
//! assert!((tf.translation.x - 1.0).abs() < 1e-9);
//! assert!((tf.translation.z - 1.0).abs() < 1e-9);
//! ```

use std::sync::Arc;

use serde::Serialize;
use tfmesh_graph::{FrameGraph, GraphError, GraphOptions};
use tfmesh_types::{Quaternion, RecordSink, Stamp, TfError, Transform3D, TransformRecord, Vec3};
use tracing::{debug, instrument};

use crate::config::TfConfig;

/// A composed transform as handed to callers.
///
/// `translation`/`rotation` give the pose of `target` expressed in `source`;
/// [`GeometricTransform::transform_point`] maps `target` coordinates into
/// `source` coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeometricTransform {
    pub source: String,
    pub target: String,
    /// Query time the transform was resolved for.
    pub time_ms: u64,
    pub translation: Vec3,
    pub rotation: Quaternion,
    /// Graph revision observed when the lookup ran.
    pub sequence: u64,
}

impl GeometricTransform {
    pub fn transform(&self) -> Transform3D {
        Transform3D::new(self.translation, self.rotation)
    }

    /// Row-major 4×4 homogeneous matrix.
    pub fn to_matrix(&self) -> [[f64; 4]; 4] {
        self.transform().to_matrix()
    }

    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.transform().transform_point(point)
    }
}

/// Thread-safe facade over a shared [`FrameGraph`].
pub struct TransformService {
    graph: Arc<FrameGraph>,
}

impl TransformService {
    pub fn new(options: GraphOptions) -> Self {
        Self {
            graph: Arc::new(FrameGraph::new(options)),
        }
    }

    pub fn from_config(config: &TfConfig) -> Self {
        Self::new(config.graph_options())
    }

    /// Insert a batch of records.
    pub fn update(&self, records: Vec<TransformRecord>) {
        RecordSink::update(self.graph.as_ref(), records);
    }

    /// Transform from `source` to `target` at `time_ms`.
    #[instrument(level = "debug", skip(self))]
    pub fn lookup(
        &self,
        source: &str,
        target: &str,
        time_ms: u64,
    ) -> Result<GeometricTransform, TfError> {
        self.lookup_at(source, target, Stamp::from_millis(time_ms))
    }

    /// Transform from `source` to `target` at the newest time every edge on
    /// the path has data for.
    ///
    /// Resolved at the exact common stamp; `time_ms` of the result is that
    /// stamp rounded down.
    #[instrument(level = "debug", skip(self))]
    pub fn lookup_latest(&self, source: &str, target: &str) -> Result<GeometricTransform, TfError> {
        let stamp = self
            .graph
            .latest_common_stamp(source, target)
            .map_err(|e| not_found(source, target, 0, &e))?;
        self.lookup_at(source, target, stamp)
    }

    fn lookup_at(
        &self,
        source: &str,
        target: &str,
        stamp: Stamp,
    ) -> Result<GeometricTransform, TfError> {
        let sequence = self.graph.revision();
        let time_ms = stamp.as_millis();

        match self.graph.lookup(source, target, stamp) {
            Ok(tf) => {
                debug!(sequence, %stamp, "transform resolved");
                Ok(GeometricTransform {
                    source: source.to_string(),
                    target: target.to_string(),
                    time_ms,
                    translation: tf.translation,
                    rotation: tf.rotation,
                    sequence,
                })
            }
            Err(e) => {
                debug!(error = %e, "transform not found");
                Err(not_found(source, target, time_ms, &e))
            }
        }
    }

    pub fn can_transform(&self, source: &str, target: &str, time_ms: u64) -> bool {
        self.graph
            .can_transform(source, target, Stamp::from_millis(time_ms))
    }

    /// All frames seen so far, sorted by name.
    pub fn known_frames(&self) -> Vec<String> {
        self.graph.frames()
    }

    /// Shared handle to the underlying graph.
    pub fn graph(&self) -> &Arc<FrameGraph> {
        &self.graph
    }
}

impl Default for TransformService {
    fn default() -> Self {
        Self::new(GraphOptions::default())
    }
}

impl RecordSink for TransformService {
    fn update(&self, records: Vec<TransformRecord>) {
        TransformService::update(self, records);
    }
}

fn not_found(source: &str, target: &str, time_ms: u64, cause: &GraphError) -> TfError {
    TfError::TransformNotFound {
        source_frame: source.to_string(),
        target_frame: target.to_string(),
        time_ms,
        reason: cause.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(parent: &str, child: &str, ms: u64, t: Vec3, q: Quaternion) -> TransformRecord {
        TransformRecord::new(parent, child, t, q, Stamp::from_millis(ms)).unwrap()
    }

    #[test]
    fn lookup_reports_frames_time_and_sequence() {
        let service = TransformService::default();
        service.update(vec![record(
            "odom",
            "base",
            500,
            Vec3::new(2.0, 0.0, 0.0),
            Quaternion::identity(),
        )]);

        let tf = service.lookup("odom", "base", 500).unwrap();
        assert_eq!(tf.source, "odom");
        assert_eq!(tf.target, "base");
        assert_eq!(tf.time_ms, 500);
        assert_eq!(tf.sequence, 1);
        assert_eq!(tf.to_matrix()[0][3], 2.0);
    }

    #[test]
    fn failures_map_to_transform_not_found() {
        let service = TransformService::default();
        service.update(vec![record(
            "a",
            "b",
            1000,
            Vec3::zero(),
            Quaternion::identity(),
        )]);

        let err = service.lookup("a", "z", 1000).unwrap_err();
        match err {
            TfError::TransformNotFound {
                source_frame,
                target_frame,
                time_ms,
                ..
            } => {
                assert_eq!(source_frame, "a");
                assert_eq!(target_frame, "z");
                assert_eq!(time_ms, 1000);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!service.can_transform("a", "b", 999));
        assert!(service.can_transform("a", "b", 1000));
    }

    #[test]
    fn lookup_latest_uses_common_stamp() {
        let service = TransformService::default();
        service.update(vec![
            record("map", "odom", 1000, Vec3::new(1.0, 0.0, 0.0), Quaternion::identity()),
            record("map", "odom", 3000, Vec3::new(3.0, 0.0, 0.0), Quaternion::identity()),
            record("odom", "base", 2000, Vec3::new(0.0, 1.0, 0.0), Quaternion::identity()),
        ]);

        let tf = service.lookup_latest("map", "base").unwrap();
        assert_eq!(tf.time_ms, 2000);
        assert!((tf.translation.x - 2.0).abs() < 1e-9);
        assert!((tf.translation.y - 1.0).abs() < 1e-9);
    }

    #[test]
    fn lookup_latest_resolves_sub_millisecond_stamps_exactly() {
        let service = TransformService::default();
        let stamp = Stamp::from_secs_nanos(1, 500_000);
        service.update(vec![
            TransformRecord::new("map", "robot", Vec3::new(1.0, 0.0, 0.0), Quaternion::identity(), stamp)
                .unwrap(),
        ]);

        let tf = service.lookup_latest("map", "robot").unwrap();
        assert_eq!(tf.time_ms, 1000);
        assert!((tf.translation.x - 1.0).abs() < 1e-9);
    }

    #[test]
    fn lookup_latest_ignores_static_mounts() {
        let service = TransformService::default();
        service.update(vec![
            record("base", "laser", 0, Vec3::new(0.0, 0.0, 0.5), Quaternion::identity()).into_static(),
            record("odom", "base", 4000, Vec3::new(4.0, 0.0, 0.0), Quaternion::identity()),
            record("odom", "base", 5000, Vec3::new(5.0, 0.0, 0.0), Quaternion::identity()),
        ]);

        let tf = service.lookup_latest("odom", "laser").unwrap();
        assert_eq!(tf.time_ms, 5000);
        assert!((tf.translation.x - 5.0).abs() < 1e-9);
        assert!((tf.translation.z - 0.5).abs() < 1e-9);
    }

    #[test]
    fn transform_point_maps_target_into_source() {
        let service = TransformService::default();
        service.update(vec![record(
            "world",
            "sensor",
            0,
            Vec3::new(0.0, 0.0, 1.0),
            Quaternion::from_yaw(std::f64::consts::FRAC_PI_2),
        )]);

        let tf = service.lookup("world", "sensor", 0).unwrap();
        let p = tf.transform_point(Vec3::new(1.0, 0.0, 0.0));
        assert!(p.x.abs() < 1e-9);
        assert!((p.y - 1.0).abs() < 1e-9);
        assert!((p.z - 1.0).abs() < 1e-9);
    }

    #[test]
    fn known_frames_are_sorted() {
        let service = TransformService::default();
        service.update(vec![
            record("map", "robot", 0, Vec3::zero(), Quaternion::identity()),
            record("robot", "camera", 0, Vec3::zero(), Quaternion::identity()),
        ]);
        assert_eq!(service.known_frames(), vec!["camera", "map", "robot"]);
    }
}
