//! Controller-to-bridge session.

use axum::extract::ws::Message;
use futures::SinkExt;
use tokio::sync::Mutex;

use super::{WsSink, close_sink};
use crate::limiter::RateLimiter;

/// One logical pipe between a remote controller and a bridge.
///
/// Created when a controller is accepted, with the controller sink set
/// and the bridge sink empty. The bridge sink attaches once the bridge
/// dials back the matching data channel. Each sink transitions unset
/// exactly once, at close.
///
/// The session lock guards both sinks and is held while writing to
/// either, which keeps each direction single-writer and in order. The
/// rate limiter is shared by both read loops and synchronizes itself.
#[derive(Debug)]
pub struct Session {
    limiter: RateLimiter,
    inner: Mutex<SessionInner>,
}

#[derive(Debug)]
struct SessionInner {
    controller: Option<WsSink>,
    bridge: Option<WsSink>,
}

impl Session {
    /// Creates a session awaiting its bridge data channel.
    #[must_use]
    pub fn new(controller: WsSink, limiter: RateLimiter) -> Self {
        Self {
            limiter,
            inner: Mutex::new(SessionInner {
                controller: Some(controller),
                bridge: None,
            }),
        }
    }

    /// Returns the session's rate limiter.
    #[must_use]
    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Attaches the bridge-side data sink.
    pub(crate) async fn attach_bridge(&self, sink: WsSink) {
        self.inner.lock().await.bridge = Some(sink);
    }

    /// Forwards a controller frame to the bridge data channel.
    ///
    /// Dropped while the bridge data channel has not attached yet and
    /// after close. Write errors are ignored; the bridge read loop
    /// observes the failure and unwinds the session.
    pub async fn forward_to_bridge(&self, msg: Message) {
        let mut inner = self.inner.lock().await;
        if let Some(bridge) = inner.bridge.as_mut() {
            let _ = bridge.send(msg).await;
        }
    }

    /// Forwards a bridge frame to the controller, dropping if the
    /// controller endpoint is already gone.
    pub async fn forward_to_controller(&self, msg: Message) {
        let mut inner = self.inner.lock().await;
        if let Some(controller) = inner.controller.as_mut() {
            let _ = controller.send(msg).await;
        }
    }

    /// Closes both endpoints with the given code and reason.
    ///
    /// Idempotent. Concurrent callers serialize on the session lock and
    /// whoever arrives first takes the sinks.
    pub async fn close(&self, code: u16, reason: &str) {
        let mut inner = self.inner.lock().await;
        if let Some(mut controller) = inner.controller.take() {
            close_sink(&mut controller, code, reason).await;
        }
        if let Some(mut bridge) = inner.bridge.take() {
            close_sink(&mut bridge, code, reason).await;
        }
    }

    #[cfg(test)]
    pub(crate) fn detached(limiter: RateLimiter) -> Self {
        Self {
            limiter,
            inner: Mutex::new(SessionInner {
                controller: None,
                bridge: None,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ws::CLOSE_GOING_AWAY;

    fn test_session() -> Session {
        Session::detached(RateLimiter::new(500_000, 10_000_000))
    }

    #[tokio::test]
    async fn test_forward_drops_without_peer() {
        let session = test_session();
        // Neither direction has an endpoint; both forwards are drops.
        session.forward_to_bridge(Message::Text("x".into())).await;
        session
            .forward_to_controller(Message::Text("x".into()))
            .await;
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let session = test_session();
        session.close(CLOSE_GOING_AWAY, "").await;
        session.close(CLOSE_GOING_AWAY, "").await;
    }
}
