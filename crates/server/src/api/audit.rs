use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use helpdesk_core::audit::Page;
use helpdesk_core::{AuditFilter, AuditRecord};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::error::ApiError;
use crate::state::AppState;

/// `GET /audit` query string. Timestamps are RFC 3339.
#[derive(Debug, Default, Deserialize)]
pub struct AuditQueryParams {
    pub ticket_id: Option<String>,
    pub event_type: Option<String>,
    /// Email of whoever caused the event.
    pub actor: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl AuditQueryParams {
    fn split(self) -> (AuditFilter, Page) {
        let filter = AuditFilter {
            ticket_id: self.ticket_id,
            event_type: self.event_type,
            actor: self.actor,
            from: self.from,
            to: self.to,
        };
        (filter, Page::clamped(self.limit, self.offset))
    }
}

#[derive(Debug, Serialize)]
pub struct AuditQueryResponse {
    pub events: Vec<AuditRecord>,
    /// Matches before paging.
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

pub async fn query_audit(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AuditQueryParams>,
) -> Result<Json<AuditQueryResponse>, ApiError> {
    let (filter, page) = params.split();
    let store = state.audit_store();

    let events = store
        .query(&filter, page)
        .map_err(|e| ApiError::internal(format!("Failed to query audit events: {}", e)))?;
    let total = store
        .count(&filter)
        .map_err(|e| ApiError::internal(format!("Failed to count audit events: {}", e)))?;

    Ok(Json(AuditQueryResponse {
        events,
        total,
        limit: page.limit,
        offset: page.offset,
    }))
}
