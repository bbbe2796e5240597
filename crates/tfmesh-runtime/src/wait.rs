//! Non-blocking "wait until a transform is available" task.
//!
//! [`WaitForTransform`] never sleeps.  An outside scheduler calls
//! [`WaitForTransform::poll`] with the current time, typically every
//! [`POLL_INTERVAL_MS`], until it returns something other than
//! [`NodeStatus::Running`].
//!
//! ```text
//!            poll: lookup ok
//!   Pending ─────────────────▶ Done
//!      │
//!      │ poll: now ≥ deadline
//!      ▼
//!   TimedOut
//! ```
//!
//! # Example
//!
//! ```rust
//! use tfmesh_runtime::service::TransformService;
//! use tfmesh_runtime::wait::{NodeStatus, WaitForTransform};
//! use tfmesh_types::{Quaternion, Stamp, TransformRecord, Vec3};
//!
//! let service = TransformService::default();
//! let mut wait = WaitForTransform::latest("map", "robot").with_timeout(500);
//! assert_eq!(wait.poll(&service, 0), NodeStatus::Running);
//!
//! service.update(vec![TransformRecord::new(
//!     "map", "robot", Vec3::zero(), Quaternion::identity(), Stamp::from_millis(100),
//! ).unwrap()]);
//! assert_eq!(wait.poll(&service, 100), NodeStatus::Success);
//! assert!(wait.result().is_some());
//! ```

use tracing::{debug, info};

use crate::service::{GeometricTransform, TransformService};

/// Suggested delay between two polls.
pub const POLL_INTERVAL_MS: u64 = 100;

/// Result of one poll step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeStatus {
    Success,
    Failure,
    /// Not there yet; poll again later.
    Running,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WaitState {
    Pending,
    Done(GeometricTransform),
    TimedOut,
}

/// Polls a [`TransformService`] until a transform resolves or a deadline
/// passes.
#[derive(Debug, Clone)]
pub struct WaitForTransform {
    source: String,
    target: String,
    /// `None` asks for the latest common time.
    time_ms: Option<u64>,
    timeout_ms: Option<u64>,
    deadline_ms: Option<u64>,
    attempts: u32,
    state: WaitState,
}

impl WaitForTransform {
    /// Wait for the transform at `time_ms`.
    pub fn at(source: impl Into<String>, target: impl Into<String>, time_ms: u64) -> Self {
        Self::build(source.into(), target.into(), Some(time_ms))
    }

    /// Wait until `source` and `target` are connected at all.
    pub fn latest(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self::build(source.into(), target.into(), None)
    }

    fn build(source: String, target: String, time_ms: Option<u64>) -> Self {
        Self {
            source,
            target,
            time_ms,
            timeout_ms: None,
            deadline_ms: None,
            attempts: 0,
            state: WaitState::Pending,
        }
    }

    /// Give up `timeout_ms` after the first poll.
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    /// Make one lookup attempt.
    ///
    /// Once the task has finished, further polls return the same status
    /// without touching the service.
    pub fn poll(&mut self, service: &TransformService, now_ms: u64) -> NodeStatus {
        match self.state {
            WaitState::Done(_) => return NodeStatus::Success,
            WaitState::TimedOut => return NodeStatus::Failure,
            WaitState::Pending => {}
        }

        let deadline = *self
            .deadline_ms
            .get_or_insert_with(|| now_ms.saturating_add(self.timeout_ms.unwrap_or(u64::MAX)));
        self.attempts += 1;

        let lookup = match self.time_ms {
            Some(t) => service.lookup(&self.source, &self.target, t),
            None => service.lookup_latest(&self.source, &self.target),
        };

        match lookup {
            Ok(tf) => {
                info!(
                    source = %self.source,
                    target = %self.target,
                    attempts = self.attempts,
                    "transform available"
                );
                self.state = WaitState::Done(tf);
                NodeStatus::Success
            }
            Err(e) if now_ms >= deadline => {
                debug!(error = %e, attempts = self.attempts, "wait for transform timed out");
                self.state = WaitState::TimedOut;
                NodeStatus::Failure
            }
            Err(_) => NodeStatus::Running,
        }
    }

    pub fn state(&self) -> &WaitState {
        &self.state
    }

    /// The resolved transform once the task succeeded.
    pub fn result(&self) -> Option<&GeometricTransform> {
        match &self.state {
            WaitState::Done(tf) => Some(tf),
            _ => None,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}
