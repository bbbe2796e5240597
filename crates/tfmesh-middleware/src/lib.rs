//! `tfmesh-middleware` – transport and feed normalization.
//!
//! Nothing in this crate knows about the frame graph.  Feeds forward records
//! into whatever [`RecordSink`][tfmesh_types::RecordSink] they are given.
//!
//! # Modules
//!
//! - [`messages`] – wire types of the legacy and current feed dialects.
//! - [`bus`] – [`TransformBus`][bus::TransformBus], the typed in-process
//!   transport, and [`Subscription`][bus::Subscription] listener tasks.
//! - [`feed`] – [`LegacyFeed`][feed::LegacyFeed],
//!   [`CurrentFeed`][feed::CurrentFeed] and the [`FeedSet`][feed::FeedSet]
//!   that registers them.
//! - [`rosbridge`] – rosbridge JSON frames onto the bus.

pub mod bus;
pub mod feed;
pub mod messages;
pub mod rosbridge;

pub use bus::{FeedReceiver, Subscription, TransformBus};
pub use feed::{
    CurrentFeed, CurrentFeedConfig, Feed, FeedSet, FeedStats, FeedStatsSnapshot, LegacyFeed,
    LegacyFeedConfig, TransformFeed,
};
pub use messages::{
    FeedMessage, LEGACY_TF_TYPE, LegacyTfMessage, RosTime, TF2_TYPE, TfMessage, TransformStamped,
};
pub use rosbridge::RosbridgeIngest;
