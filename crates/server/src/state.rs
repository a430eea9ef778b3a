use helpdesk_core::{
    AuditStore, Authenticator, Config, SanitizedConfig, TicketIntake, TicketLifecycle,
    TicketProcessor, UserDirectory,
};
use std::sync::Arc;

/// Shared application state
pub struct AppState {
    config: Config,
    authenticator: Arc<dyn Authenticator>,
    audit_store: Arc<dyn AuditStore>,
    users: Arc<UserDirectory>,
    lifecycle: Arc<TicketLifecycle>,
    intake: Arc<TicketIntake>,
    processor: Option<Arc<TicketProcessor>>,
}

impl AppState {
    pub fn new(
        config: Config,
        authenticator: Arc<dyn Authenticator>,
        audit_store: Arc<dyn AuditStore>,
        users: Arc<UserDirectory>,
        lifecycle: Arc<TicketLifecycle>,
        intake: Arc<TicketIntake>,
        processor: Option<Arc<TicketProcessor>>,
    ) -> Self {
        Self {
            config,
            authenticator,
            audit_store,
            users,
            lifecycle,
            intake,
            processor,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    pub fn audit_store(&self) -> &dyn AuditStore {
        self.audit_store.as_ref()
    }

    pub fn users(&self) -> &UserDirectory {
        &self.users
    }

    pub fn lifecycle(&self) -> &TicketLifecycle {
        &self.lifecycle
    }

    pub fn intake(&self) -> &TicketIntake {
        &self.intake
    }

    /// `None` when the background processor is disabled.
    pub fn processor(&self) -> Option<&TicketProcessor> {
        self.processor.as_deref()
    }
}
