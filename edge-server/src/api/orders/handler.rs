//! Order API Handlers
//!
//! The manager is synchronous (slot locks + redb commits), so every call runs
//! on the blocking pool.

use std::collections::BTreeSet;

use axum::{
    Json,
    extract::{Path, State},
};
use shared::order::{CommandRequest, CommandResponse, CompletedOrder, ItemAction, Order};

use crate::auth::CurrentStaff;
use crate::core::ServerState;
use crate::orders::OrdersManager;
use crate::utils::{AppError, AppResult};

async fn blocking<T, F>(state: &ServerState, f: F) -> AppResult<T>
where
    T: Send + 'static,
    F: FnOnce(&OrdersManager) -> T + Send + 'static,
{
    let manager = state.orders_manager().clone();
    tokio::task::spawn_blocking(move || f(&manager))
        .await
        .map_err(|e| AppError::internal(format!("Order task failed: {}", e)))
}

/// POST /api/orders/command
///
/// Business failures come back as `success: false` with a code, not as an
/// HTTP error.
pub async fn execute_command(
    State(state): State<ServerState>,
    CurrentStaff(staff): CurrentStaff,
    Json(request): Json<CommandRequest>,
) -> AppResult<Json<CommandResponse>> {
    let command = request.into_command(staff);
    let response = blocking(&state, move |manager| manager.execute_command(command)).await?;
    Ok(Json(response))
}

/// GET /api/orders/active
pub async fn active_orders(
    State(state): State<ServerState>,
    CurrentStaff(staff): CurrentStaff,
) -> AppResult<Json<Vec<Order>>> {
    let orders = blocking(&state, move |manager| {
        manager
            .snapshot(staff.role)
            .active_orders()
            .cloned()
            .collect::<Vec<_>>()
    })
    .await?;
    Ok(Json(orders))
}

/// GET /api/orders/completed
pub async fn completed_orders(
    State(state): State<ServerState>,
    CurrentStaff(staff): CurrentStaff,
) -> AppResult<Json<Vec<CompletedOrder>>> {
    let orders = blocking(&state, move |manager| manager.completed_orders(staff.role)).await??;
    Ok(Json(orders))
}

/// GET /api/orders/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    CurrentStaff(staff): CurrentStaff,
    Path(id): Path<String>,
) -> AppResult<Json<Order>> {
    let order = blocking(&state, move |manager| manager.get_order(&id, staff.role)).await??;
    Ok(Json(order))
}

/// GET /api/orders/{id}/items/{item_id}/actions
pub async fn permitted_actions(
    State(state): State<ServerState>,
    CurrentStaff(staff): CurrentStaff,
    Path((id, item_id)): Path<(String, String)>,
) -> AppResult<Json<BTreeSet<ItemAction>>> {
    let actions = blocking(&state, move |manager| {
        manager.permitted_actions(&id, &item_id, staff.role)
    })
    .await??;
    Ok(Json(actions))
}
