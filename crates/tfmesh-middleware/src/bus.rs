//! In-process, typed, topic-based transport for transform feeds.
//!
//! Every topic is bound to exactly one message type (the first advertiser or
//! subscriber decides).  Subscribing with a different type fails, which is
//! how a feed discovers that its dialect is not spoken on a topic.
//!
//! Each subscription owns its own [`tokio::sync::broadcast`] channel sized to
//! the requested queue depth.  A slow subscriber therefore only ever loses
//! its *own* oldest messages, and a depth-1 subscriber always sees the most
//! recent one.
//!
//! # Example
//!
//! ```rust
//! use tfmesh_middleware::bus::TransformBus;
//! use tfmesh_middleware::messages::{FeedMessage, TfMessage, TF2_TYPE};
//!
//! let bus = TransformBus::new();
//! let mut rx = bus.subscribe("/tf_static", TF2_TYPE, 1).unwrap();
//! bus.publish("/tf_static", FeedMessage::Current(TfMessage::default())).unwrap();
//! assert!(rx.try_recv().is_ok());
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tfmesh_types::TfError;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::messages::FeedMessage;

/// Receiving end of one subscription.
pub type FeedReceiver = broadcast::Receiver<Arc<FeedMessage>>;

struct TopicState {
    type_name: &'static str,
    subscribers: Vec<broadcast::Sender<Arc<FeedMessage>>>,
}

/// Shared transport.  Wrap it in an [`Arc`] to hand it to several feeds.
#[derive(Default)]
pub struct TransformBus {
    topics: RwLock<HashMap<String, TopicState>>,
}

impl TransformBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `topic` to `type_name`.
    ///
    /// Re-advertising with the same type is a no-op; a different type is
    /// rejected with [`TfError::Subscription`].
    pub fn advertise(&self, topic: &str, type_name: &'static str) -> Result<(), TfError> {
        let mut topics = self.topics.write();
        let state = topics.entry(topic.to_string()).or_insert_with(|| TopicState {
            type_name,
            subscribers: Vec::new(),
        });
        check_type(topic, state.type_name, type_name)
    }

    /// The message type bound to `topic`, if any.
    pub fn topic_type(&self, topic: &str) -> Option<&'static str> {
        self.topics.read().get(topic).map(|s| s.type_name)
    }

    /// Open a subscription on `topic` expecting `type_name`, buffering at
    /// most `queue_depth` undelivered messages (min 1).
    pub fn subscribe(
        &self,
        topic: &str,
        type_name: &'static str,
        queue_depth: usize,
    ) -> Result<FeedReceiver, TfError> {
        let mut topics = self.topics.write();
        let state = topics.entry(topic.to_string()).or_insert_with(|| TopicState {
            type_name,
            subscribers: Vec::new(),
        });
        check_type(topic, state.type_name, type_name)?;

        let (sender, receiver) = broadcast::channel(queue_depth.max(1));
        state.subscribers.push(sender);
        debug!(topic, type_name, queue_depth, "subscribed");
        Ok(receiver)
    }

    /// Deliver `message` to every live subscriber of `topic`.
    ///
    /// Publishing to an unknown topic advertises it with the message's type.
    /// Returns the number of subscribers reached; `Ok(0)` is normal when
    /// nobody listens.
    pub fn publish(&self, topic: &str, message: FeedMessage) -> Result<usize, TfError> {
        let type_name = message.type_name();
        let mut topics = self.topics.write();
        let state = topics.entry(topic.to_string()).or_insert_with(|| TopicState {
            type_name,
            subscribers: Vec::new(),
        });
        check_type(topic, state.type_name, type_name)?;

        let message = Arc::new(message);
        // A failed send means the receiver is gone; forget that subscriber.
        state
            .subscribers
            .retain(|sender| sender.send(Arc::clone(&message)).is_ok());
        Ok(state.subscribers.len())
    }

    /// Number of live subscriptions on `topic`.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics
            .read()
            .get(topic)
            .map(|s| s.subscribers.iter().filter(|tx| tx.receiver_count() > 0).count())
            .unwrap_or(0)
    }
}

fn check_type(topic: &str, bound: &'static str, requested: &'static str) -> Result<(), TfError> {
    if bound == requested {
        Ok(())
    } else {
        Err(TfError::Subscription(format!(
            "topic {topic} carries {bound}, not {requested}"
        )))
    }
}

// ---------------------------------------------------------------------------
// Listener pump
// ---------------------------------------------------------------------------

/// A running listener task.  Dropping it stops delivery.
pub struct Subscription {
    topic: String,
    handle: JoinHandle<()>,
}

impl Subscription {
    /// Spawn a task on the current Tokio runtime that hands every message
    /// received on `receiver` to `listener`.
    ///
    /// `listener` runs on the runtime's worker thread and must not block.
    /// Fails with [`TfError::Subscription`] outside a Tokio runtime.
    pub fn spawn<F>(topic: &str, mut receiver: FeedReceiver, listener: F) -> Result<Self, TfError>
    where
        F: Fn(&FeedMessage) + Send + Sync + 'static,
    {
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            TfError::Subscription(format!("cannot listen on {topic}: {e}"))
        })?;

        let task_topic = topic.to_string();
        let handle = runtime.spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(message) => listener(message.as_ref()),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        // Oldest messages were overwritten; keep going with the rest.
                        warn!(topic = %task_topic, lagged_by = n, "transform listener lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        Ok(Self {
            topic: topic.to_string(),
            handle,
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Stop delivering messages.
    pub fn shutdown(&self) {
        self.handle.abort();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
