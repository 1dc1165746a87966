//! JWT Extractor
//!
//! Validates the bearer token and yields the calling staff member.

use axum::{extract::FromRequestParts, http::request::Parts};
use shared::models::StaffIdentity;

use crate::auth::JwtService;
use crate::core::ServerState;
use crate::security_log;
use crate::utils::AppError;

/// Authenticated staff member of the current request
#[derive(Debug, Clone)]
pub struct CurrentStaff(pub StaffIdentity);

impl FromRequestParts<ServerState> for CurrentStaff {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(staff) = parts.extensions.get::<CurrentStaff>() {
            return Ok(staff.clone());
        }

        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        let token = match auth_header {
            Some(header) => JwtService::extract_from_header(header)
                .ok_or_else(|| AppError::InvalidToken("Invalid authorization header".into()))?,
            None => {
                security_log!("WARN", "auth_missing", uri = format!("{:?}", parts.uri));
                return Err(AppError::Unauthorized);
            }
        };

        match state.jwt.authenticate(token) {
            Ok(identity) => {
                let staff = CurrentStaff(identity);
                parts.extensions.insert(staff.clone());
                Ok(staff)
            }
            Err(e) => {
                security_log!(
                    "WARN",
                    "auth_failed",
                    error = format!("{}", e),
                    uri = format!("{:?}", parts.uri)
                );
                Err(e.into())
            }
        }
    }
}
