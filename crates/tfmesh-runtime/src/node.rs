//! [`TransformNode`] – one transform service process wired together.
//!
//! The node owns the [`TransformBus`], the [`TransformService`] and the
//! enabled feeds.  Feeds are registered current dialect first, so when both
//! dialects are enabled on the same topic the legacy feed is the one that
//! steps aside.  Giving the legacy feed its own topic runs both at once,
//! merged into the same graph.

use std::sync::Arc;
use std::time::Duration;

use tfmesh_middleware::{
    CurrentFeed, FeedSet, FeedStatsSnapshot, LegacyFeed, RosbridgeIngest, TransformBus,
};
use tfmesh_types::{RecordSink, TfError};
use tracing::{info, warn};

use crate::config::TfConfig;
use crate::service::TransformService;

pub struct TransformNode {
    config: TfConfig,
    bus: Arc<TransformBus>,
    service: Arc<TransformService>,
    feeds: FeedSet,
}

impl TransformNode {
    /// Build a node on a fresh bus.  Nothing listens until [`start`](Self::start).
    pub fn new(config: TfConfig) -> Self {
        Self::with_bus(config, Arc::new(TransformBus::new()))
    }

    /// Build a node on an existing bus, e.g. one shared with publishers.
    pub fn with_bus(config: TfConfig, bus: Arc<TransformBus>) -> Self {
        let service = Arc::new(TransformService::from_config(&config));
        let sink: Arc<dyn RecordSink> = service.clone();

        let mut feeds = FeedSet::new();
        if config.current_enabled {
            feeds.register(CurrentFeed::new(config.current_feed(), sink.clone()));
        }
        if config.legacy_enabled {
            feeds.register(LegacyFeed::new(config.legacy_feed(), sink));
        }

        Self {
            config,
            bus,
            service,
            feeds,
        }
    }

    /// Attach every enabled feed.  Must run inside a Tokio runtime.
    ///
    /// Returns the feeds that could not attach; the node keeps running with
    /// the others.
    pub fn start(&mut self) -> Vec<TfError> {
        let errors = self.feeds.start(&self.bus);
        for e in &errors {
            warn!(error = %e, "transform feed disabled");
        }
        info!(
            active = ?self.feeds.active(),
            history_capacity = self.config.history_capacity,
            policy = ?self.config.policy,
            "transform node started"
        );
        errors
    }

    pub fn config(&self) -> &TfConfig {
        &self.config
    }

    pub fn bus(&self) -> &Arc<TransformBus> {
        &self.bus
    }

    pub fn service(&self) -> &Arc<TransformService> {
        &self.service
    }

    pub fn feeds(&self) -> &FeedSet {
        &self.feeds
    }

    /// A rosbridge ingest publishing onto this node's bus, accepting the
    /// topics of the enabled feeds.
    pub fn rosbridge(&self) -> RosbridgeIngest {
        RosbridgeIngest::with_topics(Arc::clone(&self.bus), self.config.transform_topics())
    }

    /// Combined counters of all feeds.
    pub fn stats(&self) -> FeedStatsSnapshot {
        self.feeds.total_stats()
    }

    /// Wait until the feeds have handled at least `batches` messages in
    /// total.  Returns `false` on timeout.
    pub async fn settle(&self, batches: u64, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, async {
            while self.feeds.total_stats().batches < batches {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .is_ok()
    }

    pub fn shutdown(&mut self) {
        self.feeds.shutdown();
        info!("transform node stopped");
    }
}
