//! Feed normalizers: turn transform feed messages into [`TransformRecord`]s.
//!
//! Two dialects exist on the wire and both may be active at once:
//!
//! - [`LegacyFeed`] – one `tf/tfMessage` channel.
//! - [`CurrentFeed`] – a dynamic and a static `tf2_msgs/TFMessage` channel.
//!   The static channel is queued at depth 1 since only its latest value
//!   matters, and its records are marked static so the graph treats them as
//!   valid at any time.
//!
//! Every batch is validated entry by entry and forwarded synchronously into
//! one shared [`RecordSink`].  Malformed entries are dropped and counted; the
//! rest of the batch still goes through.
//!
//! A feed whose subscription cannot be established disables itself with a
//! warning and reports [`TfError::FeedUnavailable`].  Nothing else is
//! affected, so a process speaking only one dialect keeps working.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tfmesh_types::{RecordSink, TfError};
use tracing::{debug, info, warn};

use crate::bus::{FeedReceiver, Subscription, TransformBus};
use crate::messages::{FeedMessage, LEGACY_TF_TYPE, TF2_TYPE};

/// Default topic of the dynamic channel (and of the legacy feed).
pub const DEFAULT_TF_TOPIC: &str = "/tf";
/// Default topic of the static channel.
pub const DEFAULT_TF_STATIC_TOPIC: &str = "/tf_static";
/// Default listener queue depth of dynamic channels.
pub const DEFAULT_DYNAMIC_QUEUE_DEPTH: usize = 10;
/// Static channels only ever need the latest message.
pub const DEFAULT_STATIC_QUEUE_DEPTH: usize = 1;

// ────────────────────────────────────────────────────────────────────────────
// Statistics
// ────────────────────────────────────────────────────────────────────────────

/// Live counters of one feed.
#[derive(Debug, Default)]
pub struct FeedStats {
    batches: AtomicU64,
    records_forwarded: AtomicU64,
    records_rejected: AtomicU64,
}

impl FeedStats {
    pub fn snapshot(&self) -> FeedStatsSnapshot {
        FeedStatsSnapshot {
            batches: self.batches.load(Ordering::Acquire),
            records_forwarded: self.records_forwarded.load(Ordering::Acquire),
            records_rejected: self.records_rejected.load(Ordering::Acquire),
        }
    }
}

/// Point-in-time copy of [`FeedStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FeedStatsSnapshot {
    /// Messages fully handled.
    pub batches: u64,
    pub records_forwarded: u64,
    /// Entries dropped by validation.
    pub records_rejected: u64,
}

/// Which channel of a feed a message arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Channel {
    Dynamic,
    Static,
}

/// Validate every entry of `message` and hand the survivors to `sink`.
///
/// The batch counter is bumped last, so once a caller observes it the sink
/// already holds the batch.
fn forward(
    feed: &'static str,
    channel: Channel,
    message: &FeedMessage,
    sink: &dyn RecordSink,
    stats: &FeedStats,
) {
    let entries = message.transforms();
    let mut records = Vec::with_capacity(entries.len());

    for entry in entries {
        match entry.to_record() {
            Ok(record) if channel == Channel::Static => records.push(record.into_static()),
            Ok(record) => records.push(record),
            Err(e) => {
                stats.records_rejected.fetch_add(1, Ordering::AcqRel);
                warn!(feed, error = %e, "dropping malformed transform");
            }
        }
    }

    let accepted = records.len() as u64;
    if !records.is_empty() {
        sink.update(records);
    }
    stats.records_forwarded.fetch_add(accepted, Ordering::AcqRel);
    stats.batches.fetch_add(1, Ordering::AcqRel);
}

fn listen(
    feed: &'static str,
    channel: Channel,
    topic: &str,
    receiver: FeedReceiver,
    sink: &Arc<dyn RecordSink>,
    stats: &Arc<FeedStats>,
) -> Result<Subscription, TfError> {
    let sink = Arc::clone(sink);
    let stats = Arc::clone(stats);
    Subscription::spawn(topic, receiver, move |message| {
        forward(feed, channel, message, sink.as_ref(), &stats)
    })
}

// ────────────────────────────────────────────────────────────────────────────
// TransformFeed
// ────────────────────────────────────────────────────────────────────────────

/// Capability shared by every feed dialect: emit records into a sink.
pub trait TransformFeed {
    /// Short, stable name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Subscribe to the feed's channels on `bus`.
    ///
    /// On failure the feed stays disabled and the error is
    /// [`TfError::FeedUnavailable`].  Attaching an already enabled feed is a
    /// no-op.
    fn attach(&mut self, bus: &TransformBus) -> Result<(), TfError>;

    /// `true` while every channel of the feed is subscribed.
    fn is_enabled(&self) -> bool;

    fn stats(&self) -> FeedStatsSnapshot;

    /// Stop listening.  The feed can be attached again afterwards.
    fn shutdown(&mut self);
}

// ────────────────────────────────────────────────────────────────────────────
// Legacy feed
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyFeedConfig {
    pub topic: String,
    pub queue_depth: usize,
}

impl Default for LegacyFeedConfig {
    fn default() -> Self {
        Self {
            topic: DEFAULT_TF_TOPIC.to_string(),
            queue_depth: DEFAULT_DYNAMIC_QUEUE_DEPTH,
        }
    }
}

/// Normalizer for the single-channel `tf/tfMessage` dialect.
pub struct LegacyFeed {
    config: LegacyFeedConfig,
    sink: Arc<dyn RecordSink>,
    stats: Arc<FeedStats>,
    subscription: Option<Subscription>,
}

impl LegacyFeed {
    pub const NAME: &'static str = "legacy";

    pub fn new(config: LegacyFeedConfig, sink: Arc<dyn RecordSink>) -> Self {
        Self {
            config,
            sink,
            stats: Arc::new(FeedStats::default()),
            subscription: None,
        }
    }

    pub fn config(&self) -> &LegacyFeedConfig {
        &self.config
    }
}

impl TransformFeed for LegacyFeed {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn attach(&mut self, bus: &TransformBus) -> Result<(), TfError> {
        if self.subscription.is_some() {
            return Ok(());
        }

        let topic = self.config.topic.as_str();
        let subscription = bus
            .subscribe(topic, LEGACY_TF_TYPE, self.config.queue_depth)
            .and_then(|rx| listen(Self::NAME, Channel::Dynamic, topic, rx, &self.sink, &self.stats));

        match subscription {
            Ok(sub) => {
                info!(feed = Self::NAME, topic, "subscribed to legacy transform feed");
                self.subscription = Some(sub);
                Ok(())
            }
            Err(e) => {
                warn!(
                    error = %e,
                    "disable legacy tf ({LEGACY_TF_TYPE}) support"
                );
                Err(unavailable(Self::NAME, topic, e))
            }
        }
    }

    fn is_enabled(&self) -> bool {
        self.subscription.is_some()
    }

    fn stats(&self) -> FeedStatsSnapshot {
        self.stats.snapshot()
    }

    fn shutdown(&mut self) {
        if let Some(sub) = self.subscription.take() {
            debug!(feed = Self::NAME, topic = sub.topic(), "unsubscribed");
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Current feed
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentFeedConfig {
    pub dynamic_topic: String,
    pub static_topic: String,
    pub dynamic_queue_depth: usize,
    pub static_queue_depth: usize,
}

impl Default for CurrentFeedConfig {
    fn default() -> Self {
        Self {
            dynamic_topic: DEFAULT_TF_TOPIC.to_string(),
            static_topic: DEFAULT_TF_STATIC_TOPIC.to_string(),
            dynamic_queue_depth: DEFAULT_DYNAMIC_QUEUE_DEPTH,
            static_queue_depth: DEFAULT_STATIC_QUEUE_DEPTH,
        }
    }
}

/// Normalizer for the `tf2_msgs/TFMessage` dialect with its dynamic and
/// static channels.  Both channels feed the same sink.
pub struct CurrentFeed {
    config: CurrentFeedConfig,
    sink: Arc<dyn RecordSink>,
    stats: Arc<FeedStats>,
    subscriptions: Vec<Subscription>,
}

impl CurrentFeed {
    pub const NAME: &'static str = "current";

    pub fn new(config: CurrentFeedConfig, sink: Arc<dyn RecordSink>) -> Self {
        Self {
            config,
            sink,
            stats: Arc::new(FeedStats::default()),
            subscriptions: Vec::with_capacity(2),
        }
    }

    pub fn config(&self) -> &CurrentFeedConfig {
        &self.config
    }

    fn subscribe_channel(
        &self,
        bus: &TransformBus,
        channel: Channel,
        topic: &str,
        depth: usize,
    ) -> Result<Subscription, TfError> {
        bus.subscribe(topic, TF2_TYPE, depth)
            .and_then(|rx| listen(Self::NAME, channel, topic, rx, &self.sink, &self.stats))
            .map_err(|e| {
                warn!(error = %e, topic, "disable tf2 ({TF2_TYPE}) support");
                unavailable(Self::NAME, topic, e)
            })
    }
}

impl TransformFeed for CurrentFeed {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn attach(&mut self, bus: &TransformBus) -> Result<(), TfError> {
        if !self.subscriptions.is_empty() {
            return Ok(());
        }

        let config = &self.config;
        let dynamic = self.subscribe_channel(
            bus,
            Channel::Dynamic,
            &config.dynamic_topic,
            config.dynamic_queue_depth,
        )?;
        // If this fails `dynamic` is dropped and stops listening again.
        let fixed = self.subscribe_channel(
            bus,
            Channel::Static,
            &config.static_topic,
            config.static_queue_depth,
        )?;

        info!(
            feed = Self::NAME,
            dynamic_topic = %config.dynamic_topic,
            static_topic = %config.static_topic,
            "subscribed to transform feed"
        );
        self.subscriptions = vec![dynamic, fixed];
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        !self.subscriptions.is_empty()
    }

    fn stats(&self) -> FeedStatsSnapshot {
        self.stats.snapshot()
    }

    fn shutdown(&mut self) {
        for sub in self.subscriptions.drain(..) {
            debug!(feed = Self::NAME, topic = sub.topic(), "unsubscribed");
        }
    }
}

fn unavailable(feed: &str, topic: &str, cause: TfError) -> TfError {
    TfError::FeedUnavailable {
        feed: feed.to_string(),
        topic: topic.to_string(),
        reason: cause.to_string(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Feed set
// ────────────────────────────────────────────────────────────────────────────

/// The closed set of feed dialects.
pub enum Feed {
    Legacy(LegacyFeed),
    Current(CurrentFeed),
}

impl TransformFeed for Feed {
    fn name(&self) -> &'static str {
        match self {
            Feed::Legacy(f) => f.name(),
            Feed::Current(f) => f.name(),
        }
    }

    fn attach(&mut self, bus: &TransformBus) -> Result<(), TfError> {
        match self {
            Feed::Legacy(f) => f.attach(bus),
            Feed::Current(f) => f.attach(bus),
        }
    }

    fn is_enabled(&self) -> bool {
        match self {
            Feed::Legacy(f) => f.is_enabled(),
            Feed::Current(f) => f.is_enabled(),
        }
    }

    fn stats(&self) -> FeedStatsSnapshot {
        match self {
            Feed::Legacy(f) => f.stats(),
            Feed::Current(f) => f.stats(),
        }
    }

    fn shutdown(&mut self) {
        match self {
            Feed::Legacy(f) => f.shutdown(),
            Feed::Current(f) => f.shutdown(),
        }
    }
}

impl From<LegacyFeed> for Feed {
    fn from(feed: LegacyFeed) -> Self {
        Feed::Legacy(feed)
    }
}

impl From<CurrentFeed> for Feed {
    fn from(feed: CurrentFeed) -> Self {
        Feed::Current(feed)
    }
}

/// Explicitly registered feeds, attached in registration order.
#[derive(Default)]
pub struct FeedSet {
    feeds: Vec<Feed>,
}

impl FeedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, feed: impl Into<Feed>) {
        self.feeds.push(feed.into());
    }

    pub fn len(&self) -> usize {
        self.feeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.feeds.is_empty()
    }

    /// Attach every registered feed to `bus`.
    ///
    /// Feeds that fail are left disabled; their errors are returned so the
    /// caller can report them.  An empty result means every feed is live.
    pub fn start(&mut self, bus: &TransformBus) -> Vec<TfError> {
        let errors: Vec<TfError> = self
            .feeds
            .iter_mut()
            .filter_map(|feed| feed.attach(bus).err())
            .collect();

        if self.active().is_empty() && !self.feeds.is_empty() {
            warn!("no transform feed could be attached");
        }
        errors
    }

    /// Names of the feeds currently enabled.
    pub fn active(&self) -> Vec<&'static str> {
        self.feeds
            .iter()
            .filter(|f| f.is_enabled())
            .map(|f| f.name())
            .collect()
    }

    pub fn stats(&self) -> Vec<(&'static str, FeedStatsSnapshot)> {
        self.feeds.iter().map(|f| (f.name(), f.stats())).collect()
    }

    /// Sum of the stats of every feed.
    pub fn total_stats(&self) -> FeedStatsSnapshot {
        self.feeds
            .iter()
            .map(|f| f.stats())
            .fold(FeedStatsSnapshot::default(), |acc, s| FeedStatsSnapshot {
                batches: acc.batches + s.batches,
                records_forwarded: acc.records_forwarded + s.records_forwarded,
                records_rejected: acc.records_rejected + s.records_rejected,
            })
    }

    pub fn shutdown(&mut self) {
        for feed in &mut self.feeds {
            feed.shutdown();
        }
    }
}
