//! Table API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::models::{DiningTable, TableId};
use shared::order::TableSummary;

use crate::auth::CurrentStaff;
use crate::core::ServerState;
use crate::utils::{AppError, AppResult};

/// GET /api/tables
pub async fn list(
    State(state): State<ServerState>,
    _staff: CurrentStaff,
) -> AppResult<Json<Vec<DiningTable>>> {
    let manager = state.orders_manager().clone();
    let tables = tokio::task::spawn_blocking(move || manager.tables())
        .await
        .map_err(|e| AppError::internal(e.to_string()))?;
    Ok(Json(tables))
}

/// GET /api/tables/{id}
pub async fn get_summary(
    State(state): State<ServerState>,
    CurrentStaff(staff): CurrentStaff,
    Path(id): Path<TableId>,
) -> AppResult<Json<TableSummary>> {
    let manager = state.orders_manager().clone();
    let summary = tokio::task::spawn_blocking(move || manager.table_summary(id, staff.role))
        .await
        .map_err(|e| AppError::internal(e.to_string()))??;
    Ok(Json(summary))
}
