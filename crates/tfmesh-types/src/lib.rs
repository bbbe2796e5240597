//! `tfmesh-types` – shared vocabulary of the transform service.
//!
//! # Modules
//!
//! - [`geometry`] – [`Vec3`], [`Quaternion`] and [`Transform3D`] with
//!   composition, inversion and interpolation.
//! - [`stamp`] – [`Stamp`], the nanosecond time base of the frame graph.
//! - [`record`] – [`TransformRecord`], the validated unit of ingestion.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod geometry;
pub mod record;
pub mod stamp;

pub use geometry::{Quaternion, Transform3D, Vec3};
pub use record::TransformRecord;
pub use stamp::Stamp;

/// Anything that accepts batches of [`TransformRecord`]s.
///
/// Feed normalizers forward into a `RecordSink` from the transport's delivery
/// thread, so implementations must not block.
pub trait RecordSink: Send + Sync {
    fn update(&self, records: Vec<TransformRecord>);
}

impl<T: RecordSink + ?Sized> RecordSink for Arc<T> {
    fn update(&self, records: Vec<TransformRecord>) {
        (**self).update(records)
    }
}

/// Error type shared by every tfmesh crate.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TfError {
    #[error("Feed {feed} unavailable on {topic}: {reason}")]
    FeedUnavailable {
        feed: String,
        topic: String,
        reason: String,
    },

    #[error("No transform from '{source_frame}' to '{target_frame}' at {time_ms} ms: {reason}")]
    TransformNotFound {
        source_frame: String,
        target_frame: String,
        time_ms: u64,
        reason: String,
    },

    #[error("Malformed transform {parent} -> {child}: {reason}")]
    MalformedRecord {
        parent: String,
        child: String,
        reason: String,
    },

    #[error("Subscription Error: {0}")]
    Subscription(String),

    #[error("Serialization Error: {0}")]
    Serialization(String),

    #[error("Configuration Error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CollectingSink(Mutex<Vec<TransformRecord>>);

    impl RecordSink for CollectingSink {
        fn update(&self, records: Vec<TransformRecord>) {
            self.0.lock().unwrap().extend(records);
        }
    }

    #[test]
    fn arc_sink_forwards_to_inner() {
        let sink = Arc::new(CollectingSink::default());
        let as_dyn: Arc<dyn RecordSink> = sink.clone();
        let record =
            TransformRecord::new("a", "b", Vec3::zero(), Quaternion::identity(), Stamp::ZERO)
                .unwrap();
        as_dyn.update(vec![record]);
        assert_eq!(sink.0.lock().unwrap().len(), 1);
    }

    #[test]
    fn transform_not_found_display_names_both_frames() {
        let err = TfError::TransformNotFound {
            source_frame: "map".to_string(),
            target_frame: "camera".to_string(),
            time_ms: 1000,
            reason: "no path".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("map") && text.contains("camera") && text.contains("1000"));
    }

    #[test]
    fn tf_error_roundtrip() {
        let err = TfError::FeedUnavailable {
            feed: "legacy".to_string(),
            topic: "/tf".to_string(),
            reason: "type mismatch".to_string(),
        };
        let json = serde_json::to_string(&err).unwrap();
        let back: TfError = serde_json::from_str(&json).unwrap();
        assert_eq!(err, back);
    }
}
