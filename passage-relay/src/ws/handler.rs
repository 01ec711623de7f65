//! WebSocket upgrade handlers and read loops.
//!
//! Each handler upgrades, splits the socket, parks the write half in
//! the broker state, and drives a read loop on the read half. Read
//! errors and close frames are the only way out of a loop; the
//! post-loop cleanup deregisters and closes whatever the loop owned.

use axum::{
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::bridge::BridgeEntry;
use super::session::Session;
use super::{CLOSE_GOING_AWAY, CLOSE_RATE_LIMITED, REASON_RATE_LIMITED, payload_len};
use crate::state::AppState;

/// `GET /bridge/control/{bridge_id}` - bridge control channel.
pub async fn bridge_control(
    ws: WebSocketUpgrade,
    Path(bridge_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_bridge_control(socket, bridge_id, state))
}

async fn handle_bridge_control(socket: WebSocket, bridge_id: String, state: Arc<AppState>) {
    let (sink, mut stream) = socket.split();
    let entry = Arc::new(BridgeEntry::new(sink));
    state.stats.bridge_control_accepted();

    if let Some(displaced) = state.registry.replace(&bridge_id, Arc::clone(&entry)) {
        state.stats.bridge_kicked();
        info!(%bridge_id, "kicking previously registered bridge");
        displaced.close(true).await;
    }
    info!(%bridge_id, "bridge registered");

    while let Some(Ok(msg)) = stream.next().await {
        match msg {
            Message::Text(_) | Message::Binary(_) => entry.fanout(msg).await,
            Message::Close(_) => break,
            _ => {}
        }
    }

    // Only remove the mapping if a successor has not replaced it.
    state.registry.remove_if_same(&bridge_id, &entry);
    entry.close(false).await;
    info!(%bridge_id, "bridge deregistered");
}

/// `GET /bridge/data/{bridge_id}/{connection_id}` - bridge data channel
/// for one session.
pub async fn bridge_data(
    ws: WebSocketUpgrade,
    Path((bridge_id, connection_id)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.max_message_size(usize::MAX)
        .max_frame_size(usize::MAX)
        .on_upgrade(move |socket| handle_bridge_data(socket, bridge_id, connection_id, state))
}

async fn handle_bridge_data(
    socket: WebSocket,
    bridge_id: String,
    connection_id: String,
    state: Arc<AppState>,
) {
    state.stats.bridge_data_accepted();
    let (sink, mut stream) = socket.split();

    let Some(entry) = state.registry.load(&bridge_id) else {
        debug!(%bridge_id, %connection_id, "data channel for unknown bridge");
        return;
    };
    // Dropping the sink closes the channel when no session is awaiting.
    let Some(session) = entry.attach_data(&connection_id, sink).await else {
        debug!(%bridge_id, %connection_id, "data channel for unknown session");
        return;
    };
    debug!(%bridge_id, %connection_id, "bridge data channel attached");

    let mut code = CLOSE_GOING_AWAY;
    let mut reason = "";
    while let Some(Ok(msg)) = stream.next().await {
        let msg = match msg {
            Message::Text(_) | Message::Binary(_) => msg,
            Message::Close(_) => break,
            _ => continue,
        };
        let len = payload_len(&msg) as u64;
        state.stats.add_bridge_to_controller_bytes(len);
        if !session.limiter().allow(8 * len, Instant::now()) {
            state.stats.rate_limit_tripped();
            warn!(%bridge_id, %connection_id, "bridge data channel exceeded rate limit");
            code = CLOSE_RATE_LIMITED;
            reason = REASON_RATE_LIMITED;
            break;
        }
        session.forward_to_controller(msg).await;
    }

    entry.remove_session(&connection_id).await;
    session.close(code, reason).await;
    debug!(%bridge_id, %connection_id, "session closed");
}

/// `GET /remote-controller/{bridge_id}` - remote controller channel.
///
/// Refuses the upgrade outright when no bridge is registered under the
/// id, so a controller probing an absent bridge never holds a socket.
pub async fn remote_controller(
    ws: WebSocketUpgrade,
    Path(bridge_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let Some(entry) = state.registry.load(&bridge_id) else {
        state.stats.controller_rejected_no_bridge();
        debug!(%bridge_id, "rejecting remote controller, no such bridge");
        return StatusCode::NOT_FOUND.into_response();
    };
    ws.max_message_size(usize::MAX)
        .max_frame_size(usize::MAX)
        .on_upgrade(move |socket| handle_remote_controller(socket, bridge_id, entry, state))
}

async fn handle_remote_controller(
    socket: WebSocket,
    bridge_id: String,
    entry: Arc<BridgeEntry>,
    state: Arc<AppState>,
) {
    state.stats.controller_accepted();
    let (sink, mut stream) = socket.split();

    let connection_id = Uuid::new_v4().to_string();
    let limiter = state.config.rate_limit.new_limiter();
    let session = Arc::new(Session::new(sink, limiter));
    entry
        .register_session(connection_id.clone(), Arc::clone(&session))
        .await;
    info!(%bridge_id, %connection_id, "remote controller connected");

    let mut code = CLOSE_GOING_AWAY;
    let mut reason = "";
    while let Some(Ok(msg)) = stream.next().await {
        let msg = match msg {
            Message::Text(_) | Message::Binary(_) => msg,
            Message::Close(_) => break,
            _ => continue,
        };
        let len = payload_len(&msg) as u64;
        state.stats.add_controller_to_bridge_bytes(len);
        if !session.limiter().allow(8 * len, Instant::now()) {
            state.stats.rate_limit_tripped();
            warn!(%bridge_id, %connection_id, "remote controller exceeded rate limit");
            code = CLOSE_RATE_LIMITED;
            reason = REASON_RATE_LIMITED;
            break;
        }
        // Dropped until the bridge data channel attaches.
        session.forward_to_bridge(msg).await;
    }

    entry.remove_session(&connection_id).await;
    session.close(code, reason).await;
    info!(%bridge_id, %connection_id, "remote controller disconnected");
}

/// `GET /status/{bridge_id}` - status observer channel.
///
/// Observers receive a copy of every inbound control frame of the
/// bridge. Their own frames are never interpreted; any inbound frame
/// or read error unsubscribes them.
pub async fn status(
    ws: WebSocketUpgrade,
    Path(bridge_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let Some(entry) = state.registry.load(&bridge_id) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    ws.max_message_size(usize::MAX)
        .max_frame_size(usize::MAX)
        .on_upgrade(move |socket| handle_status(socket, bridge_id, entry))
}

async fn handle_status(socket: WebSocket, bridge_id: String, entry: Arc<BridgeEntry>) {
    let (sink, mut stream) = socket.split();
    let observer_id = entry.add_observer(sink).await;
    debug!(%bridge_id, observer_id, "status observer subscribed");

    let _ = stream.next().await;

    // None here means bridge teardown already closed the observer.
    if let Some(mut sink) = entry.remove_observer(observer_id).await {
        super::close_sink(&mut sink, super::CLOSE_ABNORMAL, "").await;
    }
    debug!(%bridge_id, observer_id, "status observer unsubscribed");
}
