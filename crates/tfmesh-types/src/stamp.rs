//! [`Stamp`] – the store-native point in time.

use serde::{Deserialize, Serialize};
use std::fmt;

const NANOS_PER_MILLI: u64 = 1_000_000;
const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Nanoseconds since an arbitrary (but shared) epoch.
///
/// Callers speak milliseconds, the feeds speak `{sec, nsec}` headers; both
/// are converted into a `Stamp` before they reach the frame graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Stamp(u64);

impl Stamp {
    pub const ZERO: Stamp = Stamp(0);

    pub fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    pub fn from_millis(millis: u64) -> Self {
        Self(millis.saturating_mul(NANOS_PER_MILLI))
    }

    /// Build a stamp from a ROS-style `{sec, nsec}` header pair.
    pub fn from_secs_nanos(sec: u32, nsec: u32) -> Self {
        Self(u64::from(sec) * NANOS_PER_SEC + u64::from(nsec))
    }

    pub fn as_nanos(self) -> u64 {
        self.0
    }

    /// Milliseconds, truncated.
    pub fn as_millis(self) -> u64 {
        self.0 / NANOS_PER_MILLI
    }

    /// `self - earlier` in nanoseconds, or `None` if `earlier` is later.
    pub fn nanos_since(self, earlier: Stamp) -> Option<u64> {
        self.0.checked_sub(earlier.0)
    }
}

impl fmt::Display for Stamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}s", self.0 / NANOS_PER_SEC, self.0 % NANOS_PER_SEC)
    }
}
