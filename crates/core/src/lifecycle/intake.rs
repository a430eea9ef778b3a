//! Ticket submission: validate, register the user, upload, publish.

use std::sync::Arc;
use tracing::{error, warn};

use super::coordinator::{CreatedTicket, TicketLifecycle};
use super::error::LifecycleError;
use crate::blob::{Attachment, BlobStore};
use crate::metrics::ATTACHMENT_UPLOADS;
use crate::ticket::{TicketInput, TicketPriority, ValidationError};
use crate::user::UserDirectory;

/// Raw submission as received from the client.
#[derive(Debug, Clone, Default)]
pub struct TicketForm {
    pub title: String,
    pub description: String,
    pub priority: String,
    pub attachments: Vec<Attachment>,
    pub is_synthetic: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct AttachmentLimits {
    pub max_count: usize,
    pub max_bytes: usize,
}

pub struct TicketIntake {
    users: Arc<UserDirectory>,
    blobs: Arc<dyn BlobStore>,
    lifecycle: Arc<TicketLifecycle>,
    limits: AttachmentLimits,
}

impl TicketIntake {
    pub fn new(
        users: Arc<UserDirectory>,
        blobs: Arc<dyn BlobStore>,
        lifecycle: Arc<TicketLifecycle>,
        limits: AttachmentLimits,
    ) -> Self {
        Self {
            users,
            blobs,
            lifecycle,
            limits,
        }
    }

    /// Submit a ticket on behalf of `email`.
    ///
    /// Nothing is published unless every attachment uploaded. Blobs stored
    /// before a failure are logged as orphaned.
    pub async fn submit(
        &self,
        email: &str,
        form: TicketForm,
    ) -> Result<CreatedTicket, LifecycleError> {
        let priority: TicketPriority = form
            .priority
            .parse()
            .map_err(|_| ValidationError::UnknownPriority(form.priority.clone()))?;
        let mut input = TicketInput::new(form.title, form.description, priority);
        input.is_synthetic = form.is_synthetic;
        input.validate()?;
        self.check_attachments(&form.attachments)?;

        // Role is never passed here; submitting must not touch a stored role.
        self.users.ensure_user(email, None).await?;

        let urls = self.upload_all(email, &form.attachments).await?;

        self.lifecycle
            .create_ticket(input.with_image_urls(urls.clone()), email)
            .await
            .inspect_err(|_| log_orphans(email, &urls))
    }

    fn check_attachments(&self, attachments: &[Attachment]) -> Result<(), ValidationError> {
        if attachments.len() > self.limits.max_count {
            return Err(ValidationError::TooManyAttachments {
                count: attachments.len(),
                max: self.limits.max_count,
            });
        }
        if let Some(big) = attachments.iter().find(|a| a.len() > self.limits.max_bytes) {
            return Err(ValidationError::AttachmentTooLarge {
                name: big.file_name.clone(),
                size: big.len(),
                max: self.limits.max_bytes,
            });
        }
        Ok(())
    }

    async fn upload_all(
        &self,
        email: &str,
        attachments: &[Attachment],
    ) -> Result<Vec<String>, LifecycleError> {
        let mut urls = Vec::with_capacity(attachments.len());
        for attachment in attachments {
            match self.blobs.upload(attachment, email).await {
                Ok(url) => {
                    ATTACHMENT_UPLOADS.with_label_values(&["ok"]).inc();
                    urls.push(url);
                }
                Err(e) => {
                    error!(
                        email = %email,
                        file = %attachment.file_name,
                        "Attachment upload failed: {}",
                        e
                    );
                    ATTACHMENT_UPLOADS.with_label_values(&["failed"]).inc();
                    log_orphans(email, &urls);
                    return Err(e.into());
                }
            }
        }
        Ok(urls)
    }
}

fn log_orphans(email: &str, urls: &[String]) {
    for url in urls {
        warn!(email = %email, url = %url, "Orphaned attachment, ticket was not created");
        ATTACHMENT_UPLOADS.with_label_values(&["orphaned"]).inc();
    }
}
