//! # relay-client
//!
//! Thin convenience shell around the NATS client for service processes.
//!
//! This crate adds three things on top of [`async-nats`], which does all the
//! real work (wire protocol, reconnection, subscription multiplexing):
//!
//! - **App** - connection lifecycle helpers (connect/close/drain/flush) plus
//!   publish, subscribe, and request pass-throughs
//! - **Context** - a per-message object handed out for every inbound message
//! - **Stats** - periodic process/host snapshots, re-exported from
//!   [`relay-stats`](relay_stats)
//!
//! ## Example
//!
//! ```rust,no_run
//! use relay_client::{App, Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), relay_client::Error> {
//!     let app = App::new(Config::default());
//!     app.connect().await?;
//!
//!     let mut sub = app.subscribe("greet.*").await?;
//!     app.publish("greet.joe", "hello").await?;
//!
//!     if let Some(ctx) = sub.next().await {
//!         println!("{}: {:?}", ctx.subject(), ctx.payload());
//!     }
//!
//!     app.close().await
//! }
//! ```

pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod metrics;

pub use client::App;
pub use config::Config;
pub use context::{Context, Subscription};
pub use error::Error;
pub use relay_stats::{Sampler, SamplerConfig, Snapshot};
