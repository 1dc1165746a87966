//! Authentication Handlers

use std::time::Duration;

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use shared::models::StaffIdentity;

use crate::auth::CurrentStaff;
use crate::core::ServerState;
use crate::security_log;
use crate::utils::{AppError, AppResult};

/// Fixed delay for PIN checks to slow down guessing
const AUTH_FIXED_DELAY_MS: u64 = 300;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub pin: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub staff: StaffIdentity,
}

/// POST /api/auth/login - PIN 登录，返回 JWT
pub async fn login(
    State(state): State<ServerState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let staff = state.staff.authenticate(req.pin.trim());

    tokio::time::sleep(Duration::from_millis(AUTH_FIXED_DELAY_MS)).await;

    let Some(staff) = staff else {
        security_log!("WARN", "login_failed", reason = "unknown_pin");
        return Err(AppError::invalid_credentials());
    };

    let token = state.jwt.generate_token(&staff)?;
    tracing::info!(staff_id = %staff.id, role = %staff.role, "Staff logged in");
    Ok(Json(LoginResponse { token, staff }))
}

/// GET /api/auth/me - 当前令牌对应的员工
pub async fn me(CurrentStaff(staff): CurrentStaff) -> Json<StaffIdentity> {
    Json(staff)
}
