//! `tfmesh-runtime` – the transform service process.
//!
//! # Modules
//!
//! - [`service`] – [`TransformService`][service::TransformService]:
//!   millisecond lookups over the frame graph, returning
//!   [`GeometricTransform`][service::GeometricTransform]s.
//! - [`node`] – [`TransformNode`][node::TransformNode]: bus, service and
//!   feeds wired together from a [`TfConfig`][config::TfConfig].
//! - [`wait`] – [`WaitForTransform`][wait::WaitForTransform], a pollable
//!   task for callers that need to wait for a transform.
//! - [`config`] – `~/.tfmesh/config.toml` and `TFMESH_*` overrides.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: console
//!   logging and optional OTLP span export.

pub mod config;
pub mod node;
pub mod service;
pub mod telemetry;
pub mod wait;

pub use config::{ConfigError, TfConfig};
pub use node::TransformNode;
pub use service::{GeometricTransform, TransformService};
pub use telemetry::{TracerProviderGuard, init_tracing};
pub use wait::{NodeStatus, POLL_INTERVAL_MS, WaitForTransform, WaitState};
