//! Rosbridge JSON ingest.
//!
//! Turns rosbridge `publish` frames such as
//!
//! ```json
//! {"op": "publish", "topic": "/tf", "msg": {"transforms": [ ... ]}}
//! ```
//!
//! into [`FeedMessage`]s on the [`TransformBus`].  Only transform topics are
//! considered: those already bound on the bus plus the ingest's configured
//! transform topics.  The dialect is the type already bound to the topic; for
//! an unbound topic the frame's optional `"type"` field decides, falling back
//! to `tf2_msgs/TFMessage`.
//!
//! Frames that are not transform publications (other ops, other topics,
//! unknown types) are ignored.  A frame that claims to be a transform publication but does
//! not parse is a [`TfError::Serialization`].

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tfmesh_types::TfError;
use tracing::{debug, trace};

use crate::bus::TransformBus;
use crate::feed::{DEFAULT_TF_STATIC_TOPIC, DEFAULT_TF_TOPIC};
use crate::messages::{FeedMessage, LEGACY_TF_TYPE, LegacyTfMessage, TF2_TYPE, TfMessage};

#[derive(Debug, Deserialize)]
struct PublishFrame {
    op: String,
    #[serde(default)]
    topic: String,
    #[serde(default, rename = "type")]
    type_name: Option<String>,
    #[serde(default)]
    msg: Value,
}

/// Feeds rosbridge text frames into a [`TransformBus`].
#[derive(Clone)]
pub struct RosbridgeIngest {
    bus: Arc<TransformBus>,
    topics: Vec<String>,
}

impl RosbridgeIngest {
    /// Ingest accepting the default `/tf` and `/tf_static` topics.
    pub fn new(bus: Arc<TransformBus>) -> Self {
        Self::with_topics(bus, [DEFAULT_TF_TOPIC, DEFAULT_TF_STATIC_TOPIC])
    }

    /// Ingest accepting publications on `topics` and on any topic already
    /// bound on `bus`.
    pub fn with_topics<I, S>(bus: Arc<TransformBus>, topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut topics: Vec<String> = topics.into_iter().map(Into::into).collect();
        topics.sort();
        topics.dedup();
        Self { bus, topics }
    }

    /// The configured transform topics.
    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    pub fn bus(&self) -> &Arc<TransformBus> {
        &self.bus
    }

    /// Parse one rosbridge frame and publish it.
    ///
    /// Returns the number of subscribers reached, `0` for ignored frames.
    pub fn ingest_text(&self, text: &str) -> Result<usize, TfError> {
        let frame: PublishFrame = serde_json::from_str(text)
            .map_err(|e| TfError::Serialization(format!("rosbridge frame: {e}")))?;

        if frame.op != "publish" {
            trace!(op = %frame.op, "ignoring rosbridge op");
            return Ok(0);
        }

        let type_name = match self.bus.topic_type(&frame.topic) {
            Some(bound) => Some(bound),
            None if self.topics.contains(&frame.topic) => match frame.type_name.as_deref() {
                Some(name) => known_type(name),
                None => Some(TF2_TYPE),
            },
            None => None,
        };

        let Some(type_name) = type_name else {
            debug!(topic = %frame.topic, msg_type = ?frame.type_name, "ignoring non-transform publication");
            return Ok(0);
        };

        let message = decode(type_name, frame.msg)?;
        self.bus.publish(&frame.topic, message)
    }

    /// Ingest every non-empty line of `text`, stopping at the first error.
    ///
    /// Returns the number of frames published.
    pub fn ingest_lines(&self, text: &str) -> Result<usize, TfError> {
        let mut published = 0;
        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            self.ingest_text(line)?;
            published += 1;
        }
        Ok(published)
    }
}

fn known_type(name: &str) -> Option<&'static str> {
    match name {
        LEGACY_TF_TYPE => Some(LEGACY_TF_TYPE),
        TF2_TYPE => Some(TF2_TYPE),
        _ => None,
    }
}

fn decode(type_name: &'static str, msg: Value) -> Result<FeedMessage, TfError> {
    let err = |e: serde_json::Error| TfError::Serialization(format!("{type_name}: {e}"));
    if type_name == LEGACY_TF_TYPE {
        serde_json::from_value::<LegacyTfMessage>(msg)
            .map(FeedMessage::Legacy)
            .map_err(err)
    } else {
        serde_json::from_value::<TfMessage>(msg)
            .map(FeedMessage::Current)
            .map_err(err)
    }
}
