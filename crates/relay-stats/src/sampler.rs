//! Periodic statistics sampler.
//!
//! The [`Sampler`] owns a single [`Snapshot`] for its whole lifetime and
//! refreshes its live fields either on demand ([`Sampler::sample`]) or on a
//! repeating timer ([`Sampler::start`]). Each tick broadcasts the refreshed
//! snapshot to every subscriber.

use crate::config::SamplerConfig;
use crate::snapshot::Snapshot;
use std::sync::{Arc, Mutex};
use sysinfo::System;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, trace};

/// Capacity of the snapshot broadcast channel.
const BROADCAST_CAPACITY: usize = 16;

/// Snapshot and its metric source, guarded together so a refresh is
/// exclusive.
struct SampleState {
    sys: System,
    snapshot: Snapshot,
}

impl SampleState {
    fn refresh(&mut self) -> Snapshot {
        self.snapshot.refresh(&mut self.sys);
        self.snapshot.clone()
    }
}

/// Periodic process and host statistics sampler.
///
/// Constructing a sampler captures the initial snapshot. [`Sampler::start`]
/// and [`Sampler::stop`] toggle periodic re-sampling; both are idempotent.
/// [`Sampler::subscribe`] returns a receiver that sees every emission.
pub struct Sampler {
    config: SamplerConfig,
    state: Arc<Mutex<SampleState>>,
    sender: broadcast::Sender<Arc<Snapshot>>,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl Sampler {
    /// Create a sampler and capture the initial snapshot.
    ///
    /// With `auto_start` set, the periodic tick task is started here as well.
    /// The first emission still lands one full interval after construction,
    /// so a receiver taken from [`Sampler::subscribe`] right after `new`
    /// returns will see it. Starting requires a running Tokio runtime.
    #[must_use]
    pub fn new(config: SamplerConfig) -> Self {
        let mut sys = System::new_all();
        let snapshot = Snapshot::capture(config.tags.clone(), &mut sys);
        let (sender, _) = broadcast::channel(BROADCAST_CAPACITY);

        let sampler = Self {
            config,
            state: Arc::new(Mutex::new(SampleState { sys, snapshot })),
            sender,
            ticker: Mutex::new(None),
        };

        if sampler.config.auto_start {
            sampler.start();
        }

        sampler
    }

    /// The configuration this sampler was built with.
    #[must_use]
    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Subscribe to periodic snapshot emissions.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<Snapshot>> {
        self.sender.subscribe()
    }

    /// Whether the periodic tick task is currently running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.ticker
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Start periodic sampling.
    ///
    /// A no-op when the tick task is already running. Must be called from
    /// within a Tokio runtime.
    pub fn start(&self) {
        let mut ticker = self.ticker.lock().unwrap();
        if ticker.as_ref().is_some_and(|handle| !handle.is_finished()) {
            debug!("stats sampler already running");
            return;
        }

        let period = self.config.interval();
        let state = Arc::clone(&self.state);
        let sender = self.sender.clone();

        debug!(interval_ms = self.config.interval_ms, "stats sampler started");

        *ticker = Some(tokio::spawn(async move {
            let mut tick = time::interval(period);
            tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // An interval's first tick completes immediately; consume it so
            // the first emission lands one full period after start.
            tick.tick().await;

            loop {
                tick.tick().await;
                let snapshot = Arc::new(state.lock().unwrap().refresh());
                trace!(timestamp_ms = snapshot.timestamp_ms, "stats tick");
                // send only fails when nobody is subscribed
                let _ = sender.send(snapshot);
            }
        }));
    }

    /// Stop periodic sampling.
    ///
    /// Safe to call when not running. No further emissions occur until
    /// [`Sampler::start`] is called again.
    pub fn stop(&self) {
        if let Some(handle) = self.ticker.lock().unwrap().take() {
            handle.abort();
            debug!("stats sampler stopped");
        }
    }

    /// Refresh the live fields of the snapshot and return the result.
    ///
    /// Works whether or not the periodic task is running.
    #[must_use]
    pub fn sample(&self) -> Snapshot {
        self.state.lock().unwrap().refresh()
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        if let Ok(ticker) = self.ticker.get_mut() {
            if let Some(handle) = ticker.take() {
                handle.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config(interval_ms: u64, auto_start: bool) -> SamplerConfig {
        SamplerConfig {
            tags: Vec::new(),
            interval_ms,
            auto_start,
        }
    }

    fn drain(rx: &mut broadcast::Receiver<Arc<Snapshot>>) -> Vec<Arc<Snapshot>> {
        let mut out = Vec::new();
        while let Ok(snapshot) = rx.try_recv() {
            out.push(snapshot);
        }
        out
    }

    #[test]
    fn test_identity_stable_across_samples() {
        let sampler = Sampler::new(config(600_000, false));

        let first = sampler.sample();
        let second = sampler.sample();

        assert_eq!(first.process.identity, second.process.identity);
        assert_eq!(first.system.identity, second.system.identity);
        assert!(second.timestamp_ms >= first.timestamp_ms);
        assert!(second.process.usage.uptime_secs >= first.process.usage.uptime_secs);
        assert!(second.system.usage.uptime_secs >= first.system.usage.uptime_secs);
    }

    #[test]
    fn test_stop_before_start_is_a_noop() {
        let sampler = Sampler::new(config(600_000, false));

        sampler.stop();
        sampler.stop();
        assert!(!sampler.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_start_keeps_a_single_timer() {
        let sampler = Sampler::new(config(100, false));
        let mut rx = sampler.subscribe();

        sampler.start();
        sampler.start();

        time::sleep(Duration::from_millis(350)).await;
        sampler.stop();

        // Ticks at 100, 200 and 300 ms; a doubled timer would have emitted 6.
        assert_eq!(drain(&mut rx).len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_halts_emissions() {
        let sampler = Sampler::new(config(100, false));
        let mut rx = sampler.subscribe();

        sampler.start();
        assert!(sampler.is_running());
        sampler.stop();
        assert!(!sampler.is_running());

        time::sleep(Duration::from_millis(500)).await;
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_resumes_emissions() {
        let sampler = Sampler::new(config(100, false));
        let mut rx = sampler.subscribe();

        sampler.start();
        time::sleep(Duration::from_millis(150)).await;
        sampler.stop();
        assert_eq!(drain(&mut rx).len(), 1);

        time::sleep(Duration::from_millis(300)).await;
        assert!(drain(&mut rx).is_empty());

        sampler.start();
        time::sleep(Duration::from_millis(150)).await;
        sampler.stop();
        assert_eq!(drain(&mut rx).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_start_first_emission_after_one_interval() {
        let sampler = Sampler::new(config(200, true));
        let mut rx = sampler.subscribe();

        time::sleep(Duration::from_millis(150)).await;
        assert!(rx.try_recv().is_err(), "emitted before one interval elapsed");

        time::sleep(Duration::from_millis(100)).await;
        assert_eq!(drain(&mut rx).len(), 1);

        sampler.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_subscriber_sees_every_emission() {
        let sampler = Sampler::new(config(100, false));
        let mut first = sampler.subscribe();
        let mut second = sampler.subscribe();

        sampler.start();
        time::sleep(Duration::from_millis(250)).await;
        sampler.stop();

        assert_eq!(drain(&mut first).len(), 2);
        assert_eq!(drain(&mut second).len(), 2);
    }

    // Real-clock run: two ticks within 140 ms at a 50 ms interval, tagged,
    // with strictly increasing timestamps.
    #[tokio::test]
    async fn test_tagged_ticks_on_the_wall_clock() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let sampler = Sampler::new(SamplerConfig {
            tags: vec!["svc".to_string()],
            interval_ms: 50,
            auto_start: true,
        });
        let mut rx = sampler.subscribe();

        time::sleep(Duration::from_millis(140)).await;
        sampler.stop();

        let got = drain(&mut rx);
        assert!(got.len() >= 2, "expected at least two emissions, got {}", got.len());
        for snapshot in &got {
            assert_eq!(snapshot.tags, vec!["svc".to_string()]);
        }
        for pair in got.windows(2) {
            assert!(pair[1].timestamp_ms > pair[0].timestamp_ms);
        }
    }
}
