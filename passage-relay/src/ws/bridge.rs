//! Per-bridge registry entry.

use axum::extract::ws::Message;
use futures::SinkExt;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

use super::session::Session;
use super::{
    CLOSE_ABNORMAL, CLOSE_GOING_AWAY, CLOSE_KICKED, REASON_KICKED, WsSink, close_sink,
};
use crate::message::ControlMessage;

/// Authoritative record for one registered bridge.
///
/// Owns the control sink, the sessions multiplexed over it, and the
/// status observers subscribed to it. All three live behind one lock,
/// which is held across control writes and status fan-out so that
/// observers see each control frame exactly once relative to set
/// changes. A slow observer therefore stalls the control read loop;
/// that trade is deliberate.
#[derive(Debug)]
pub struct BridgeEntry {
    inner: Mutex<BridgeInner>,
    next_observer_id: AtomicU64,
}

#[derive(Debug)]
struct BridgeInner {
    control: Option<WsSink>,
    sessions: HashMap<String, Arc<Session>>,
    observers: HashMap<u64, WsSink>,
}

impl BridgeEntry {
    /// Creates an entry for a freshly accepted control channel.
    #[must_use]
    pub fn new(control: WsSink) -> Self {
        Self {
            inner: Mutex::new(BridgeInner {
                control: Some(control),
                sessions: HashMap::new(),
                observers: HashMap::new(),
            }),
            next_observer_id: AtomicU64::new(0),
        }
    }

    /// Inserts a session and announces it on the control channel.
    ///
    /// Insertion and announcement happen in one critical section so
    /// the bridge cannot observe a connect message for a session that
    /// is not yet resolvable, nor the reverse.
    pub async fn register_session(&self, connection_id: String, session: Arc<Session>) {
        let mut inner = self.inner.lock().await;
        inner.sessions.insert(connection_id.clone(), session);
        let msg = ControlMessage::connect(connection_id);
        if let Some(control) = inner.control.as_mut() {
            if let Ok(text) = serde_json::to_string(&msg) {
                let _ = control.send(Message::Text(text.into())).await;
            }
        }
    }

    /// Removes a session from the map, if still present.
    pub async fn remove_session(&self, connection_id: &str) {
        self.inner.lock().await.sessions.remove(connection_id);
    }

    /// Attaches a bridge data sink to the awaiting session.
    ///
    /// Returns the session so the caller can run its read loop, or
    /// `None` when no session with that id is awaiting (the sink is
    /// dropped, closing the data channel).
    pub async fn attach_data(&self, connection_id: &str, sink: WsSink) -> Option<Arc<Session>> {
        let inner = self.inner.lock().await;
        let session = Arc::clone(inner.sessions.get(connection_id)?);
        session.attach_bridge(sink).await;
        drop(inner);
        Some(session)
    }

    /// Fans a control frame out to every current status observer.
    pub async fn fanout(&self, msg: Message) {
        let mut inner = self.inner.lock().await;
        for sink in inner.observers.values_mut() {
            let _ = sink.send(msg.clone()).await;
        }
    }

    /// Subscribes a status observer, returning its id.
    ///
    /// The first observer triggers a `startStatus` message on the
    /// control channel, sent before the observer is inserted.
    pub async fn add_observer(&self, sink: WsSink) -> u64 {
        let id = self.next_observer_id.fetch_add(1, Ordering::Relaxed);
        let mut inner = self.inner.lock().await;
        if inner.observers.is_empty() {
            if let Some(control) = inner.control.as_mut() {
                if let Ok(text) = serde_json::to_string(&ControlMessage::StartStatus) {
                    let _ = control.send(Message::Text(text.into())).await;
                }
            }
        }
        inner.observers.insert(id, sink);
        id
    }

    /// Unsubscribes a status observer, returning its sink for closing.
    ///
    /// Removing the last observer triggers a `stopStatus` message on
    /// the control channel. Returns `None` when teardown already swept
    /// the observer away.
    pub async fn remove_observer(&self, id: u64) -> Option<WsSink> {
        let mut inner = self.inner.lock().await;
        let sink = inner.observers.remove(&id);
        if sink.is_some() && inner.observers.is_empty() {
            if let Some(control) = inner.control.as_mut() {
                if let Ok(text) = serde_json::to_string(&ControlMessage::StopStatus) {
                    let _ = control.send(Message::Text(text.into())).await;
                }
            }
        }
        sink
    }

    /// Number of sessions currently multiplexed over this bridge.
    pub async fn session_count(&self) -> usize {
        self.inner.lock().await.sessions.len()
    }

    /// Number of status observers currently subscribed.
    pub async fn observer_count(&self) -> usize {
        self.inner.lock().await.observers.len()
    }

    /// Tears the entry down.
    ///
    /// Closes the control channel (3000 when kicked, going away
    /// otherwise), every session (going away), and every status
    /// observer (abnormal closure), emptying all three.
    pub async fn close(&self, kicked: bool) {
        let mut inner = self.inner.lock().await;
        if let Some(mut control) = inner.control.take() {
            if kicked {
                close_sink(&mut control, CLOSE_KICKED, REASON_KICKED).await;
            } else {
                close_sink(&mut control, CLOSE_GOING_AWAY, "").await;
            }
        }
        for (_, session) in inner.sessions.drain() {
            session.close(CLOSE_GOING_AWAY, "").await;
        }
        for (_, mut sink) in inner.observers.drain() {
            close_sink(&mut sink, CLOSE_ABNORMAL, "").await;
        }
    }

    #[cfg(test)]
    pub(crate) fn detached() -> Self {
        Self {
            inner: Mutex::new(BridgeInner {
                control: None,
                sessions: HashMap::new(),
                observers: HashMap::new(),
            }),
            next_observer_id: AtomicU64::new(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::limiter::RateLimiter;

    fn test_session() -> Arc<Session> {
        Arc::new(Session::detached(RateLimiter::new(500_000, 10_000_000)))
    }

    #[tokio::test]
    async fn test_register_and_remove_session() {
        let entry = BridgeEntry::detached();
        entry
            .register_session("s1".to_string(), test_session())
            .await;
        entry
            .register_session("s2".to_string(), test_session())
            .await;
        assert_eq!(entry.session_count().await, 2);

        entry.remove_session("s1").await;
        assert_eq!(entry.session_count().await, 1);

        // Removing an unknown id is a no-op.
        entry.remove_session("s1").await;
        assert_eq!(entry.session_count().await, 1);
    }

    #[tokio::test]
    async fn test_close_clears_sessions() {
        let entry = BridgeEntry::detached();
        entry
            .register_session("s1".to_string(), test_session())
            .await;
        entry.close(false).await;
        assert_eq!(entry.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let entry = BridgeEntry::detached();
        entry.close(true).await;
        entry.close(false).await;
    }
}
