//! User directory: role-preserving user upserts over the record store.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, error, info};

use super::{User, UserRole};
use crate::audit::{AuditEvent, AuditHandle};
use crate::keyed_lock::KeyedLocks;
use crate::record_store::{get_as, put_as, RecordStore, RecordStoreError, USERS_COLLECTION};
use crate::ticket::{validate_email, ValidationError};

#[derive(Debug, Error)]
pub enum UserError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Record store unavailable: {0}")]
    RecordStore(#[from] RecordStoreError),
}

/// Users keyed by email.
///
/// `ensure_user` is serialized per email, so a concurrent "ensure without
/// role" can never overwrite an explicit role change with a stale read.
pub struct UserDirectory {
    store: Arc<dyn RecordStore>,
    locks: KeyedLocks,
    audit: Option<AuditHandle>,
}

impl UserDirectory {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            locks: KeyedLocks::default(),
            audit: None,
        }
    }

    /// Attach an audit handle for user lifecycle events.
    pub fn with_audit(mut self, audit: AuditHandle) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Create the user if missing, otherwise change the role only when one
    /// is explicitly requested and differs from the stored role.
    pub async fn ensure_user(
        &self,
        email: &str,
        requested_role: Option<UserRole>,
    ) -> Result<User, UserError> {
        validate_email(email)?;

        let _guard = self.locks.lock(email).await;

        let existing: Option<User> = get_as(self.store.as_ref(), USERS_COLLECTION, email)
            .inspect_err(|e| error!(email = %email, "Failed to read user: {}", e))?;

        match existing {
            Some(mut user) => match requested_role {
                Some(role) if role != user.role => {
                    let from = user.role;
                    user.role = role;
                    put_as(self.store.as_ref(), USERS_COLLECTION, email, &user)
                        .inspect_err(|e| error!(email = %email, "Failed to update user role: {}", e))?;
                    info!(email = %email, "User role changed from {} to {}", from, role);
                    self.emit(AuditEvent::UserRoleChanged {
                        email: email.to_string(),
                        from_role: from.to_string(),
                        to_role: role.to_string(),
                    });
                    Ok(user)
                }
                _ => {
                    debug!(email = %email, "User exists with role {}, unchanged", user.role);
                    Ok(user)
                }
            },
            None => {
                let user = User {
                    email: email.to_string(),
                    role: requested_role.unwrap_or_default(),
                    created_at: Utc::now(),
                };
                put_as(self.store.as_ref(), USERS_COLLECTION, email, &user)
                    .inspect_err(|e| error!(email = %email, "Failed to create user: {}", e))?;
                info!(email = %email, "Created user with role {}", user.role);
                self.emit(AuditEvent::UserCreated {
                    email: email.to_string(),
                    role: user.role.to_string(),
                });
                Ok(user)
            }
        }
    }

    /// Look up a user, `None` if never seen.
    pub fn get_user(&self, email: &str) -> Result<Option<User>, UserError> {
        Ok(get_as(self.store.as_ref(), USERS_COLLECTION, email)?)
    }

    /// All users holding the technician role.
    pub fn list_technicians(&self) -> Result<Vec<User>, UserError> {
        let docs = self.store.query(
            USERS_COLLECTION,
            "role",
            &serde_json::Value::String(UserRole::Technician.as_str().to_string()),
        )?;

        let mut technicians = Vec::with_capacity(docs.len());
        for doc in docs {
            match serde_json::from_value::<User>(doc) {
                Ok(user) => technicians.push(user),
                Err(e) => error!("Skipping unreadable technician record: {}", e),
            }
        }
        Ok(technicians)
    }

    fn emit(&self, event: AuditEvent) {
        if let Some(audit) = &self.audit {
            audit.try_emit(event);
        }
    }
}
