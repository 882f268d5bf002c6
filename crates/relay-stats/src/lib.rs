//! # relay-stats
//!
//! Periodic process and host statistics for relay services.
//!
//! A [`Sampler`] captures a [`Snapshot`] of process and host metrics when it
//! is built, then refreshes the live parts of that snapshot on demand or on a
//! repeating timer, broadcasting each refresh to subscribers:
//!
//! ```text
//! ┌─────────┐  tick   ┌──────────┐  Arc<Snapshot>  ┌─────────────┐
//! │  timer  │────────▶│  Sampler │────────────────▶│ subscribers │
//! └─────────┘         └──────────┘                 └─────────────┘
//! ```
//!
//! Identity facts (pid, CPU descriptors, hostname, ...) are captured once and
//! never change for the sampler's lifetime; usage numbers (memory, uptimes,
//! free memory) are refreshed on every read.
//!
//! ## Example
//!
//! ```rust
//! use relay_stats::{Sampler, SamplerConfig};
//!
//! let sampler = Sampler::new(SamplerConfig::default());
//! let snapshot = sampler.sample();
//! assert_eq!(snapshot.process.identity.pid, std::process::id());
//! ```

pub mod config;
pub mod sampler;
pub mod snapshot;

pub use config::SamplerConfig;
pub use sampler::Sampler;
pub use snapshot::{
    CpuInfo, MemoryUsage, ProcessIdentity, ProcessStats, ProcessUsage, Release, Snapshot,
    SystemIdentity, SystemStats, SystemUsage,
};
