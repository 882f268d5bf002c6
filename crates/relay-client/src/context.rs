//! Per-message context objects.
//!
//! Every inbound message is handed to the caller wrapped in a [`Context`]:
//! the message itself, a handle to the client for replies and follow-up
//! publishes, and a mutable scratch map scoped to the message.

use crate::error::Error;
use crate::metrics;
use async_nats::{Client, Message, Subscriber};
use bytes::Bytes;
use futures_util::stream::{Stream, StreamExt};
use std::collections::HashMap;
use std::pin::Pin;
use std::task::{Context as TaskContext, Poll};

/// Context created for one inbound message.
pub struct Context {
    client: Client,
    message: Message,
    /// Mutable scratch space scoped to this message, for handler pipelines
    /// that pass the context along.
    pub state: HashMap<String, serde_json::Value>,
}

impl Context {
    pub(crate) fn new(client: Client, message: Message) -> Self {
        Self {
            client,
            message,
            state: HashMap::new(),
        }
    }

    /// Subject the message was published on.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.message.subject
    }

    /// Message payload.
    #[must_use]
    pub fn payload(&self) -> &Bytes {
        &self.message.payload
    }

    /// Reply subject, when the publisher asked for a response.
    #[must_use]
    pub fn reply(&self) -> Option<&str> {
        self.message.reply.as_deref()
    }

    /// The full inbound message.
    #[must_use]
    pub fn message(&self) -> &Message {
        &self.message
    }

    /// Underlying client handle, for publishing follow-ups from a handler.
    #[must_use]
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Publish a reply to the message's reply subject.
    ///
    /// # Errors
    ///
    /// [`Error::NoReply`] when the message carries no reply subject; publish
    /// errors are forwarded otherwise.
    pub async fn respond(&self, payload: impl Into<Bytes>) -> Result<(), Error> {
        let reply = self.message.reply.clone().ok_or(Error::NoReply)?;
        let payload = payload.into();
        metrics::record_publish(payload.len());
        self.client.publish(reply, payload).await?;
        Ok(())
    }
}

/// A stream of [`Context`]s for one subscription.
///
/// Dropping the subscription ends it; the underlying client cleans up the
/// server-side interest.
pub struct Subscription {
    subject: String,
    client: Client,
    inner: Subscriber,
    _guard: metrics::SubscriptionMetricsGuard,
}

impl Subscription {
    pub(crate) fn new(subject: String, client: Client, inner: Subscriber) -> Self {
        Self {
            subject,
            client,
            inner,
            _guard: metrics::SubscriptionMetricsGuard::new(),
        }
    }

    /// Subject this subscription listens on.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Next inbound message, or `None` once the subscription ends.
    pub async fn next(&mut self) -> Option<Context> {
        let message = self.inner.next().await?;
        metrics::record_receive(message.length);
        Some(Context::new(self.client.clone(), message))
    }
}

impl Stream for Subscription {
    type Item = Context;

    fn poll_next(self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        match Pin::new(&mut this.inner).poll_next(cx) {
            Poll::Ready(Some(message)) => {
                metrics::record_receive(message.length);
                Poll::Ready(Some(Context::new(this.client.clone(), message)))
            }
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}
