//! Menu API Handlers

use axum::{Json, extract::State};
use shared::models::MenuItem;

use crate::auth::CurrentStaff;
use crate::core::ServerState;

/// GET /api/menu - 点单所需的 menu_item_id、价格与出品站
pub async fn list(State(state): State<ServerState>, _staff: CurrentStaff) -> Json<Vec<MenuItem>> {
    Json(state.catalog.list())
}
