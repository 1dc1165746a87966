//! Sync API Handlers
//!
//! # WebSocket 协议
//!
//! ```text
//! server → client   {"type":"SNAPSHOT","data":{…}}        连接后第一条
//! server → client   {"type":"EVENT","data":{…}}           增量
//! server → client   {"type":"RESYNC_REQUIRED"}            队列溢出，随后补发快照
//! client → server   {"type":"RESYNC"}                     随时请求完整快照
//! client → server   {"type":"PING"}                       保活，无回复
//! ```
//!
//! 浏览器无法给 WebSocket 设置 Authorization 头，令牌走查询参数。

use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade, rejection::WebSocketUpgradeRejection},
    },
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use shared::message::{ClientMessage, SyncMessage};
use shared::models::StaffIdentity;
use shared::order::DashboardSnapshot;

use crate::auth::CurrentStaff;
use crate::core::ServerState;
use crate::message::Subscription;
use crate::orders::OrdersManager;
use crate::security_log;
use crate::utils::{AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub token: String,
}

/// GET /api/sync/ws?token=
///
/// The token is checked before the upgrade, so a bad token is a 401 even
/// when the request could not be upgraded anyway.
pub async fn dashboard_ws(
    State(state): State<ServerState>,
    Query(query): Query<WsQuery>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> AppResult<Response> {
    let staff = state.jwt.authenticate(&query.token).map_err(|e| {
        security_log!("WARN", "ws_auth_failed", error = format!("{}", e));
        AppError::from(e)
    })?;
    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => return Ok(rejection.into_response()),
    };
    let manager = state.orders_manager().clone();
    Ok(ws.on_upgrade(move |socket| run_session(socket, manager, staff)))
}

/// GET /api/sync/snapshot
pub async fn get_snapshot(
    State(state): State<ServerState>,
    CurrentStaff(staff): CurrentStaff,
) -> AppResult<Json<DashboardSnapshot>> {
    let manager = state.orders_manager().clone();
    let snapshot = tokio::task::spawn_blocking(move || manager.snapshot(staff.role))
        .await
        .map_err(|e| AppError::internal(e.to_string()))?;
    Ok(Json(snapshot))
}

async fn run_session(socket: WebSocket, manager: Arc<OrdersManager>, staff: StaffIdentity) {
    let subscribe = {
        let manager = manager.clone();
        let role = staff.role;
        tokio::task::spawn_blocking(move || manager.subscribe(role))
    };
    let subscription = match subscribe.await {
        Ok(subscription) => Arc::new(subscription),
        Err(e) => {
            tracing::error!(error = %e, "Failed to subscribe dashboard");
            return;
        }
    };
    tracing::info!(
        subscriber_id = subscription.id(),
        staff_id = %staff.id,
        role = %staff.role,
        "Dashboard connected"
    );

    let (mut sender, mut receiver) = socket.split();
    loop {
        tokio::select! {
            outbound = subscription.recv() => {
                let Some(message) = outbound else {
                    // bus shut down
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                };
                let overflowed = matches!(message, SyncMessage::ResyncRequired);
                if !send_json(&mut sender, &message).await {
                    break;
                }
                if overflowed && !resync(&manager, &subscription).await {
                    break;
                }
            }
            inbound = receiver.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(ClientMessage::Resync) => {
                                if !resync(&manager, &subscription).await {
                                    break;
                                }
                            }
                            Ok(ClientMessage::Ping) => {}
                            Err(e) => tracing::debug!(error = %e, "Ignoring malformed client message"),
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::debug!(error = %e, "WebSocket receive error");
                        break;
                    }
                }
            }
        }
    }

    tracing::info!(
        subscriber_id = subscription.id(),
        staff_id = %staff.id,
        "Dashboard disconnected"
    );
}

/// Replace the queued messages with a fresh snapshot
///
/// Building the snapshot waits on every slot lock, and a slot lock is held
/// across a redb commit, so this goes to the blocking pool.
async fn resync(manager: &Arc<OrdersManager>, subscription: &Arc<Subscription>) -> bool {
    let manager = manager.clone();
    let subscription = subscription.clone();
    match tokio::task::spawn_blocking(move || manager.resync(&subscription)).await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(error = %e, "Resync task failed");
            false
        }
    }
}

/// Returns false once the socket is gone
async fn send_json<S>(sender: &mut S, message: &SyncMessage) -> bool
where
    S: SinkExt<Message> + Unpin,
{
    match serde_json::to_string(message) {
        Ok(json) => sender.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize sync message");
            false
        }
    }
}
