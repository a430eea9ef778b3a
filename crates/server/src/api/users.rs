//! User endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use helpdesk_core::{User, UserRole};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::error::ApiError;
use super::middleware::AuthUser;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub email: String,
    /// Role asserted by the identity provider; this authorizes requests.
    pub role: UserRole,
    /// Role held in the user directory.
    pub stored_role: UserRole,
    pub auth_method: String,
}

#[derive(Debug, Serialize)]
pub struct TechniciansResponse {
    pub technicians: Vec<User>,
}

#[derive(Debug, Deserialize)]
pub struct SetRoleBody {
    pub role: String,
}

/// Register the caller on first sight and describe them.
///
/// Never changes a stored role.
pub async fn me(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
) -> Result<Json<MeResponse>, ApiError> {
    let user = state.users().ensure_user(&identity.email, None).await?;
    Ok(Json(MeResponse {
        email: identity.email,
        role: identity.role,
        stored_role: user.role,
        auth_method: identity.method,
    }))
}

pub async fn list_technicians(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TechniciansResponse>, ApiError> {
    let technicians = state.users().list_technicians()?;
    Ok(Json(TechniciansResponse { technicians }))
}

/// Explicit role change; the only way a stored role is modified.
pub async fn set_role(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
    Json(body): Json<SetRoleBody>,
) -> Result<Json<User>, ApiError> {
    let role: UserRole = body.role.parse().map_err(ApiError::bad_request)?;
    let user = state.users().ensure_user(&email, Some(role)).await?;
    Ok(Json(user))
}
