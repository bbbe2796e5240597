//! `tfmesh-graph` – the frame graph store.
//!
//! Keeps every frame seen on the transform feeds together with a short,
//! time-ordered history per directed frame pair, and resolves point-in-time
//! chains between arbitrary frames.
//!
//! # Modules
//!
//! - [`history`] – [`EdgeHistory`][history::EdgeHistory]: sorted, bounded
//!   record buffer for one parent → child edge, with the
//!   [`ResolutionPolicy`][history::ResolutionPolicy] used to answer queries
//!   that fall between records.
//! - [`store`] – [`FrameGraph`][store::FrameGraph]: concurrent store with
//!   per-edge locking and breadth-first chain resolution.

pub mod history;
pub mod store;

pub use history::{DEFAULT_HISTORY_CAPACITY, EdgeHistory, ResolutionPolicy};
pub use store::{DEFAULT_MAX_STALENESS_MS, FrameGraph, GraphError, GraphOptions, Hop};
