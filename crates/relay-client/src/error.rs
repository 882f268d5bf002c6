//! Error types for the relay client.

use thiserror::Error;

/// Errors surfaced by [`App`](crate::App) operations.
///
/// Everything except [`Error::NotConnected`] and [`Error::NoReply`] forwards
/// an error from the underlying NATS client untouched.
#[derive(Debug, Error)]
pub enum Error {
    /// An operation that needs a live connection ran before
    /// [`App::connect`](crate::App::connect).
    #[error("NATS client not connected")]
    NotConnected,

    /// Connecting to the server failed.
    #[error("connect failed: {0}")]
    Connect(#[from] async_nats::ConnectError),

    /// Publishing a message failed.
    #[error("publish failed: {0}")]
    Publish(#[from] async_nats::client::PublishError),

    /// Creating a subscription failed.
    #[error("subscribe failed: {0}")]
    Subscribe(#[from] async_nats::client::SubscribeError),

    /// A request/response round trip failed or timed out.
    #[error("request failed: {0}")]
    Request(#[from] async_nats::client::RequestError),

    /// Flushing buffered messages failed.
    #[error("flush failed: {0}")]
    Flush(#[from] async_nats::client::FlushError),

    /// Draining the connection failed.
    #[error("drain failed: {0}")]
    Drain(#[from] async_nats::client::DrainError),

    /// [`Context::respond`](crate::Context::respond) was called for a message
    /// without a reply subject.
    #[error("message has no reply subject")]
    NoReply,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(Error::NotConnected.to_string(), "NATS client not connected");
        assert_eq!(Error::NoReply.to_string(), "message has no reply subject");
    }
}
