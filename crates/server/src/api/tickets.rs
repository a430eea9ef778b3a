//! Ticket submission endpoint.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use helpdesk_core::{lifecycle::CreatedTicket, Attachment, Ticket, TicketForm};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use super::error::ApiError;
use super::middleware::AuthUser;
use crate::state::AppState;

/// Response for a submitted ticket
#[derive(Debug, Serialize)]
pub struct CreateTicketResponse {
    pub ticket_id: String,
    pub message_id: String,
    /// Always "queued"; the ticket reaches technicians once processed.
    pub status: &'static str,
    pub ticket: Ticket,
}

impl From<CreatedTicket> for CreateTicketResponse {
    fn from(created: CreatedTicket) -> Self {
        Self {
            ticket_id: created.ticket_id,
            message_id: created.message_id,
            status: "queued",
            ticket: created.ticket,
        }
    }
}

/// Create a ticket from a multipart form.
///
/// Text fields: `title`, `description`, `priority`, optional `is_synthetic`.
/// Every part carrying a file name is an attachment.
pub async fn create_ticket(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<CreateTicketResponse>), ApiError> {
    let mut form = TicketForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e)))?
    {
        if let Some(file_name) = field.file_name().map(str::to_string) {
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::bad_request(format!("Failed to read {}: {}", file_name, e)))?;
            form.attachments
                .push(Attachment::new(file_name, content_type, bytes.to_vec()));
            continue;
        }

        let name = field.name().unwrap_or_default().to_string();
        let value = field
            .text()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read field {}: {}", name, e)))?;
        match name.as_str() {
            "title" => form.title = value,
            "description" => form.description = value,
            "priority" => form.priority = value,
            "is_synthetic" => {
                form.is_synthetic = value.trim().parse().map_err(|_| {
                    ApiError::bad_request(format!("is_synthetic must be true or false, got {:?}", value))
                })?;
            }
            other => debug!(field = %other, "Ignoring unknown form field"),
        }
    }

    let created = state.intake().submit(&identity.email, form).await?;
    Ok((StatusCode::ACCEPTED, Json(created.into())))
}
