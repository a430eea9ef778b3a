//! Technician working-set endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use helpdesk_core::{
    lifecycle::{drain, CacheStatus, ClosedTicket, DrainReport, ProcessorStatus},
    LifecycleError, Ticket,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::error::ApiError;
use super::middleware::AuthUser;
use crate::state::AppState;

/// Upper bound for one manual processing request
const MAX_PROCESS_LIMIT: usize = 1000;

/// Default number of messages handled per manual processing request
const DEFAULT_PROCESS_LIMIT: usize = 100;

#[derive(Debug, Serialize)]
pub struct ListTicketsResponse {
    pub tickets: Vec<Ticket>,
    pub total: usize,
}

#[derive(Debug, Deserialize)]
pub struct ProcessParams {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct CacheStatusResponse {
    #[serde(flatten)]
    pub cache: CacheStatus,
    /// `None` when the background processor is disabled.
    pub processor: Option<ProcessorStatus>,
}

/// Open and recently closed tickets, highest priority then oldest first.
pub async fn list_tickets(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ListTicketsResponse>, ApiError> {
    let tickets = state.lifecycle().list_for_technician().await?;
    Ok(Json(ListTicketsResponse {
        total: tickets.len(),
        tickets,
    }))
}

pub async fn get_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Ticket>, ApiError> {
    state
        .lifecycle()
        .get_ticket(&id)
        .await?
        .map(Json)
        .ok_or_else(|| LifecycleError::NotFound { ticket_id: id }.into())
}

pub async fn start_ticket(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Ticket>, ApiError> {
    let ticket = state.lifecycle().start_progress(&id, &identity.email).await?;
    Ok(Json(ticket))
}

pub async fn close_ticket(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ClosedTicket>, ApiError> {
    let closed = state.lifecycle().close_ticket(&id, &identity.email).await?;
    Ok(Json(closed))
}

/// Drain queued tickets into the cache now instead of waiting for the poll loop.
pub async fn process_pending(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ProcessParams>,
) -> Result<Json<DrainReport>, ApiError> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_PROCESS_LIMIT)
        .clamp(1, MAX_PROCESS_LIMIT);
    let report = drain(state.lifecycle(), limit).await?;
    Ok(Json(report))
}

pub async fn cache_status(State(state): State<Arc<AppState>>) -> Json<CacheStatusResponse> {
    Json(CacheStatusResponse {
        cache: state.lifecycle().cache_status().await,
        processor: state.processor().map(|p| p.status()),
    })
}
