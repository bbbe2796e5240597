//! Wire types of the two transform feed dialects.
//!
//! Both dialects carry the same `TransformStamped` entries; they only differ
//! in the message type they are advertised under:
//!
//! | Dialect | Type name | Topics |
//! |---|---|---|
//! | legacy  | `tf/tfMessage` | `/tf` |
//! | current | `tf2_msgs/TFMessage` | `/tf` (dynamic), `/tf_static` (static) |
//!
//! The serde layout follows the rosbridge JSON encoding, accepting both the
//! ROS 1 (`secs`/`nsecs`) and ROS 2 (`sec`/`nanosec`) stamp field names.

use serde::{Deserialize, Serialize};
use tfmesh_types::{Quaternion, Stamp, TfError, TransformRecord, Vec3};

/// Message type name of the legacy feed.
pub const LEGACY_TF_TYPE: &str = "tf/tfMessage";
/// Message type name of the current feed.
pub const TF2_TYPE: &str = "tf2_msgs/TFMessage";

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RosTime {
    #[serde(alias = "secs")]
    pub sec: u32,
    #[serde(alias = "nsecs", alias = "nanosec")]
    pub nsec: u32,
}

impl From<RosTime> for Stamp {
    fn from(time: RosTime) -> Self {
        Stamp::from_secs_nanos(time.sec, time.nsec)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Header {
    pub stamp: RosTime,
    pub frame_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WireTransform {
    pub translation: Vec3,
    pub rotation: Quaternion,
}

/// One parent → child transform as published on a feed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TransformStamped {
    pub header: Header,
    pub child_frame_id: String,
    pub transform: WireTransform,
}

impl TransformStamped {
    pub fn new(
        parent: impl Into<String>,
        child: impl Into<String>,
        stamp: RosTime,
        translation: Vec3,
        rotation: Quaternion,
    ) -> Self {
        Self {
            header: Header {
                stamp,
                frame_id: parent.into(),
            },
            child_frame_id: child.into(),
            transform: WireTransform {
                translation,
                rotation,
            },
        }
    }

    /// Validate and convert into a [`TransformRecord`].
    ///
    /// A leading `/` on frame ids is dropped, so `/map` from an old
    /// publisher and `map` from a new one name the same frame.
    pub fn to_record(&self) -> Result<TransformRecord, TfError> {
        TransformRecord::new(
            normalize_frame_id(&self.header.frame_id),
            normalize_frame_id(&self.child_frame_id),
            self.transform.translation,
            self.transform.rotation,
            self.header.stamp.into(),
        )
    }
}

fn normalize_frame_id(frame_id: &str) -> &str {
    frame_id.strip_prefix('/').unwrap_or(frame_id)
}

/// Legacy single-channel message (`tf/tfMessage`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LegacyTfMessage {
    pub transforms: Vec<TransformStamped>,
}

/// Current message (`tf2_msgs/TFMessage`), used on both dynamic and static
/// channels.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TfMessage {
    pub transforms: Vec<TransformStamped>,
}

/// Anything that can travel on the transform bus.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedMessage {
    Legacy(LegacyTfMessage),
    Current(TfMessage),
}

impl FeedMessage {
    /// The message type name this value is published under.
    pub fn type_name(&self) -> &'static str {
        match self {
            FeedMessage::Legacy(_) => LEGACY_TF_TYPE,
            FeedMessage::Current(_) => TF2_TYPE,
        }
    }

    pub fn transforms(&self) -> &[TransformStamped] {
        match self {
            FeedMessage::Legacy(m) => &m.transforms,
            FeedMessage::Current(m) => &m.transforms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_record_strips_leading_slash() {
        let ts = TransformStamped::new(
            "/map",
            "/robot",
            RosTime { sec: 1, nsec: 0 },
            Vec3::new(1.0, 0.0, 0.0),
            Quaternion::identity(),
        );
        let record = ts.to_record().unwrap();
        assert_eq!(record.parent(), "map");
        assert_eq!(record.child(), "robot");
        assert_eq!(record.stamp(), Stamp::from_millis(1000));
    }

    #[test]
    fn to_record_rejects_nan() {
        let ts = TransformStamped::new(
            "map",
            "robot",
            RosTime::default(),
            Vec3::new(0.0, f64::NAN, 0.0),
            Quaternion::identity(),
        );
        assert!(matches!(ts.to_record(), Err(TfError::MalformedRecord { .. })));
    }

    #[test]
    fn ros1_json_stamp_fields_are_accepted() {
        let json = r#"{
            "header": {"seq": 4, "stamp": {"secs": 2, "nsecs": 500000000}, "frame_id": "odom"},
            "child_frame_id": "base_link",
            "transform": {
                "translation": {"x": 1.0, "y": 2.0, "z": 0.0},
                "rotation": {"x": 0.0, "y": 0.0, "z": 0.0, "w": 1.0}
            }
        }"#;
        let ts: TransformStamped = serde_json::from_str(json).unwrap();
        assert_eq!(ts.header.stamp, RosTime { sec: 2, nsec: 500_000_000 });
        assert_eq!(ts.to_record().unwrap().stamp(), Stamp::from_millis(2500));
    }

    #[test]
    fn ros2_json_stamp_fields_are_accepted() {
        let json = r#"{"sec": 3, "nanosec": 7}"#;
        let t: RosTime = serde_json::from_str(json).unwrap();
        assert_eq!(t, RosTime { sec: 3, nsec: 7 });
    }

    #[test]
    fn feed_message_reports_type_name() {
        assert_eq!(FeedMessage::Legacy(LegacyTfMessage::default()).type_name(), LEGACY_TF_TYPE);
        assert_eq!(FeedMessage::Current(TfMessage::default()).type_name(), TF2_TYPE);
    }
}
