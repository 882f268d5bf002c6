//! The application shell.
//!
//! [`App`] owns an optional NATS client and the stats sampler, and forwards
//! messaging operations to the client once [`App::connect`] has run.

use crate::config::Config;
use crate::context::{Context, Subscription};
use crate::error::Error;
use crate::metrics;
use async_nats::connection::State;
use async_nats::{Client, ConnectOptions};
use bytes::Bytes;
use relay_stats::Sampler;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Convenience wrapper around a NATS client.
///
/// Construction captures the initial stats snapshot (and starts the periodic
/// sampler when `stats.auto_start` is set, which requires a running Tokio
/// runtime); the connection itself is only established by [`App::connect`].
/// Every messaging operation returns [`Error::NotConnected`] until then.
pub struct App {
    config: Config,
    nats: RwLock<Option<Client>>,
    stats: Sampler,
}

impl App {
    /// Create an app from configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let stats = Sampler::new(config.sampler_config());
        Self {
            config,
            nats: RwLock::new(None),
            stats,
        }
    }

    /// The configuration this app was built with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The stats sampler owned by this app.
    #[must_use]
    pub fn stats(&self) -> &Sampler {
        &self.stats
    }

    /// Connect to the configured servers.
    ///
    /// A no-op when a live connection already exists.
    ///
    /// # Errors
    ///
    /// Forwards the client's connect error.
    pub async fn connect(&self) -> Result<(), Error> {
        let mut nats = self.nats.write().await;
        if let Some(client) = nats.as_ref() {
            if client.connection_state() != State::Disconnected {
                debug!("already connected");
                return Ok(());
            }
        }

        let mut options = ConnectOptions::new()
            .request_timeout(Some(Duration::from_millis(self.config.request.timeout_ms)));
        if let Some(name) = &self.config.name {
            options = options.name(name);
        }

        let servers = self.config.servers.join(",");
        let client = options.connect(servers.as_str()).await?;
        info!(servers = %servers, "connected");

        *nats = Some(client);
        Ok(())
    }

    /// Whether the app has no live connection.
    ///
    /// True before [`App::connect`], after [`App::close`], and while the
    /// client reports itself disconnected.
    pub async fn is_closed(&self) -> bool {
        match self.nats.read().await.as_ref() {
            Some(client) => client.connection_state() == State::Disconnected,
            None => true,
        }
    }

    /// Stop the stats sampler and drain the connection.
    ///
    /// Draining flushes buffered messages and removes every subscription
    /// before the connection closes. Safe to call when never connected.
    ///
    /// # Errors
    ///
    /// Forwards the client's drain error.
    pub async fn close(&self) -> Result<(), Error> {
        self.stats.stop();

        let client = self.nats.write().await.take();
        if let Some(client) = client {
            if client.connection_state() != State::Disconnected {
                client.drain().await?;
                info!("connection drained and closed");
            }
        }
        Ok(())
    }

    /// Publish a message.
    ///
    /// # Errors
    ///
    /// [`Error::NotConnected`] before [`App::connect`]; publish errors are
    /// forwarded otherwise.
    pub async fn publish(
        &self,
        subject: impl Into<String>,
        payload: impl Into<Bytes>,
    ) -> Result<(), Error> {
        let subject = subject.into();
        let payload = payload.into();
        let client = self.client().await?;

        debug!(subject = %subject, bytes = payload.len(), "publish");
        metrics::record_publish(payload.len());
        client.publish(subject, payload).await?;
        Ok(())
    }

    /// Publish a message carrying a reply subject.
    ///
    /// # Errors
    ///
    /// Same as [`App::publish`].
    pub async fn publish_with_reply(
        &self,
        subject: impl Into<String>,
        reply: impl Into<String>,
        payload: impl Into<Bytes>,
    ) -> Result<(), Error> {
        let subject = subject.into();
        let payload = payload.into();
        let client = self.client().await?;

        debug!(subject = %subject, bytes = payload.len(), "publish with reply");
        metrics::record_publish(payload.len());
        client
            .publish_with_reply(subject, reply.into(), payload)
            .await?;
        Ok(())
    }

    /// Subscribe to a subject.
    ///
    /// Returns a [`Subscription`] yielding a [`Context`] per inbound message.
    ///
    /// # Errors
    ///
    /// [`Error::NotConnected`] before [`App::connect`]; subscribe errors are
    /// forwarded otherwise.
    pub async fn subscribe(&self, subject: impl Into<String>) -> Result<Subscription, Error> {
        let subject = subject.into();
        let client = self.client().await?;

        let subscriber = client.subscribe(subject.clone()).await?;
        debug!(subject = %subject, "subscribed");
        Ok(Subscription::new(subject, client, subscriber))
    }

    /// Subscribe as part of a queue group; each message goes to exactly one
    /// member of the group.
    ///
    /// # Errors
    ///
    /// Same as [`App::subscribe`].
    pub async fn queue_subscribe(
        &self,
        subject: impl Into<String>,
        group: impl Into<String>,
    ) -> Result<Subscription, Error> {
        let subject = subject.into();
        let group = group.into();
        let client = self.client().await?;

        let subscriber = client.queue_subscribe(subject.clone(), group.clone()).await?;
        debug!(subject = %subject, group = %group, "subscribed");
        Ok(Subscription::new(subject, client, subscriber))
    }

    /// Publish a request and await the reply, wrapped in a [`Context`].
    ///
    /// The round-trip timeout comes from `request.timeout_ms` in the
    /// configuration.
    ///
    /// # Errors
    ///
    /// [`Error::NotConnected`] before [`App::connect`]; request errors,
    /// timeouts included, are forwarded otherwise.
    pub async fn request(
        &self,
        subject: impl Into<String>,
        payload: impl Into<Bytes>,
    ) -> Result<Context, Error> {
        let subject = subject.into();
        let client = self.client().await?;

        let start = Instant::now();
        let reply = client.request(subject.clone(), payload.into()).await?;
        metrics::record_request(start.elapsed().as_secs_f64());
        debug!(subject = %subject, elapsed_ms = start.elapsed().as_millis() as u64, "request answered");

        Ok(Context::new(client, reply))
    }

    /// Flush buffered messages to the server.
    ///
    /// # Errors
    ///
    /// [`Error::NotConnected`] before [`App::connect`]; flush errors are
    /// forwarded otherwise.
    pub async fn flush(&self) -> Result<(), Error> {
        self.client().await?.flush().await?;
        Ok(())
    }

    /// Drain subscriptions and close the connection, leaving the stats
    /// sampler untouched.
    ///
    /// # Errors
    ///
    /// [`Error::NotConnected`] before [`App::connect`]; drain errors are
    /// forwarded otherwise.
    pub async fn drain(&self) -> Result<(), Error> {
        self.client().await?.drain().await?;
        Ok(())
    }

    async fn client(&self) -> Result<Client, Error> {
        match self.nats.read().await.as_ref() {
            Some(client) => Ok(client.clone()),
            None => {
                metrics::record_error("not_connected");
                Err(Error::NotConnected)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_operations_require_a_connection() {
        let app = App::new(Config::default());

        assert!(matches!(
            app.publish("greet.joe", "hi").await,
            Err(Error::NotConnected)
        ));
        assert!(matches!(
            app.publish_with_reply("greet.joe", "inbox.1", "hi").await,
            Err(Error::NotConnected)
        ));
        assert!(matches!(
            app.subscribe("greet.*").await.err(),
            Some(Error::NotConnected)
        ));
        assert!(matches!(
            app.queue_subscribe("greet.*", "workers").await.err(),
            Some(Error::NotConnected)
        ));
        assert!(matches!(
            app.request("greet.joe", "hi").await.err(),
            Some(Error::NotConnected)
        ));
        assert!(matches!(app.flush().await, Err(Error::NotConnected)));
        assert!(matches!(app.drain().await, Err(Error::NotConnected)));
    }

    #[tokio::test]
    async fn test_close_before_connect_is_safe() {
        let app = App::new(Config::default());

        assert!(app.is_closed().await);
        app.close().await.unwrap();
        assert!(app.is_closed().await);
        assert!(!app.stats().is_running());
    }

    #[tokio::test]
    async fn test_auto_start_sampler_stops_on_close() {
        let mut config = Config::default();
        config.stats.interval_ms = 50;
        config.stats.auto_start = true;

        let app = App::new(config);
        assert!(app.stats().is_running());

        app.close().await.unwrap();
        assert!(!app.stats().is_running());
    }

    #[tokio::test]
    async fn test_sampler_carries_configured_tags() {
        let mut config = Config::default();
        config.tags = vec!["svc".to_string()];

        let app = App::new(config);
        let snapshot = app.stats().sample();
        assert_eq!(snapshot.tags, vec!["svc"]);
    }
}
