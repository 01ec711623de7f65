//! WebSocket endpoints of the relay.
//!
//! ## Submodules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `bridge` | Per-bridge entry (control sink, sessions map, observer set) |
//! | `session` | One controller-to-bridge pipe (two sinks, one limiter) |
//! | `handler` | The four upgrade handlers and their read loops |
//!
//! Every accepted socket is split. The accepting handler task keeps the
//! read half and drives the read loop; the write half is stored inside
//! the session or bridge entry under the owning lock so that peers,
//! status fan-out, kicks, and teardown can write to it. Closing an
//! endpoint with a specific code from another task means sending a
//! close frame through the stored sink.
//!
//! Lock order is strict: bridge entry lock before session lock, never
//! the reverse. Rate limiters are called outside both.

pub mod bridge;
pub mod handler;
pub mod session;

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use futures::SinkExt;
use futures::stream::SplitSink;

/// Write half of an accepted relay socket.
pub(crate) type WsSink = SplitSink<WebSocket, Message>;

/// Going away, sent on normal endpoint teardown.
pub const CLOSE_GOING_AWAY: u16 = 1001;
/// Abnormal closure, sent to status observers on unsubscribe and kick.
pub const CLOSE_ABNORMAL: u16 = 1006;
/// A newer bridge registration displaced this control channel.
pub const CLOSE_KICKED: u16 = 3000;
/// The session's rate limiter refused a frame.
pub const CLOSE_RATE_LIMITED: u16 = 3001;

/// Close reason paired with [`CLOSE_KICKED`].
pub const REASON_KICKED: &str = "Kicked out by other bridge";
/// Close reason paired with [`CLOSE_RATE_LIMITED`].
pub const REASON_RATE_LIMITED: &str = "Rate limit exceeded";

/// Sends a close frame on `sink`, ignoring write errors.
///
/// The peer may already be gone; its read loop unwinds on its own.
pub(crate) async fn close_sink(sink: &mut WsSink, code: u16, reason: &str) {
    let frame = CloseFrame {
        code,
        reason: reason.to_owned().into(),
    };
    let _ = sink.send(Message::Close(Some(frame))).await;
}

/// Payload length of a data frame, zero for protocol frames.
pub(crate) fn payload_len(msg: &Message) -> usize {
    match msg {
        Message::Text(text) => text.len(),
        Message::Binary(data) => data.len(),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_len() {
        assert_eq!(payload_len(&Message::Text("hi".into())), 2);
        assert_eq!(payload_len(&Message::Binary(vec![0u8; 5].into())), 5);
        assert_eq!(payload_len(&Message::Close(None)), 0);
    }
}
