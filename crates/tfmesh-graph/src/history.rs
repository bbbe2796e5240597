//! [`EdgeHistory`] – the time-ordered records of one directed frame pair.
//!
//! Records are kept sorted by stamp.  Out-of-order arrivals are inserted in
//! place at their partition point, so ordering never depends on arrival order.
//! Retention is bounded: once the history holds `capacity` records the oldest
//! ones are evicted.  The newest record is never evicted.
//!
//! # Resolution
//!
//! [`EdgeHistory::resolve`] answers "what was this edge at time `t`":
//!
//! | Situation | Result |
//! |---|---|
//! | record at exactly `t` | that record (the latest arrival if several share `t`) |
//! | `t` bracketed by two records | interpolated, or the closer one under [`ResolutionPolicy::Nearest`] |
//! | `t` after the newest record | newest record, if no older than `max_staleness` |
//! | `t` before the oldest record | nothing |
//!
//! A static edge (one fed [`TransformRecord::is_static`] records) keeps only
//! its latest record and answers with it at every time, with no staleness
//! limit.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tfmesh_types::{Stamp, Transform3D, TransformRecord};

/// Records retained per edge unless configured otherwise.
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// How a query time that falls between two records is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionPolicy {
    /// Linear translation and slerp rotation between the bracketing records.
    #[default]
    Interpolate,
    /// The bracketing record closest in time; ties go to the earlier one.
    Nearest,
}

/// Sorted, bounded history of one parent → child edge.
#[derive(Debug, Clone)]
pub struct EdgeHistory {
    records: VecDeque<TransformRecord>,
    capacity: usize,
}

impl EdgeHistory {
    /// Create an empty history keeping at most `capacity` records (min 1).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: VecDeque::with_capacity(capacity.min(DEFAULT_HISTORY_CAPACITY)),
            capacity,
        }
    }

    /// Insert `record` at its time-ordered position, evicting the oldest
    /// records beyond capacity.
    pub fn insert(&mut self, record: TransformRecord) {
        // Switching between static and dynamic data restarts the history.
        if record.is_static() || self.is_static() {
            self.records.clear();
        }
        let pos = self
            .records
            .partition_point(|r| r.stamp() <= record.stamp());
        self.records.insert(pos, record);

        while self.records.len() > self.capacity {
            self.records.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// `true` when the edge holds a fixed relation valid at any time.
    pub fn is_static(&self) -> bool {
        self.newest().is_some_and(TransformRecord::is_static)
    }

    pub fn oldest(&self) -> Option<&TransformRecord> {
        self.records.front()
    }

    pub fn newest(&self) -> Option<&TransformRecord> {
        self.records.back()
    }

    /// Stamps of the oldest and newest retained records.
    pub fn time_range(&self) -> Option<(Stamp, Stamp)> {
        Some((self.oldest()?.stamp(), self.newest()?.stamp()))
    }

    /// Iterate the retained records oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &TransformRecord> {
        self.records.iter()
    }

    /// The edge's transform at `stamp`, or `None` if no retained record may
    /// answer for that time.
    ///
    /// `max_staleness` is in nanoseconds; `None` accepts any age.
    pub fn resolve(
        &self,
        stamp: Stamp,
        policy: ResolutionPolicy,
        max_staleness: Option<u64>,
    ) -> Option<Transform3D> {
        if self.is_static() {
            return self.newest().map(TransformRecord::transform);
        }

        // First index whose stamp is strictly after the query.
        let pos = self.records.partition_point(|r| r.stamp() <= stamp);
        if pos == 0 {
            return None;
        }

        let before = &self.records[pos - 1];
        if before.stamp() == stamp {
            return Some(before.transform());
        }

        let Some(after) = self.records.get(pos) else {
            let age = stamp.nanos_since(before.stamp())?;
            return match max_staleness {
                Some(limit) if age > limit => None,
                _ => Some(before.transform()),
            };
        };

        let span = after.stamp().nanos_since(before.stamp())? as f64;
        let offset = stamp.nanos_since(before.stamp())? as f64;
        let ratio = offset / span;

        match policy {
            ResolutionPolicy::Interpolate => {
                Some(before.transform().interpolate(after.transform(), ratio))
            }
            ResolutionPolicy::Nearest if ratio <= 0.5 => Some(before.transform()),
            ResolutionPolicy::Nearest => Some(after.transform()),
        }
    }
}

impl Default for EdgeHistory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}
