use async_trait::async_trait;

use super::{AuthError, AuthRequest, Authenticator, Identity};
use crate::user::UserRole;

/// Every request is the configured dev identity (`[auth.dev_identity]`).
///
/// Only selected by `method = "none"`; header auth is the deployed mode.
pub struct NoneAuthenticator {
    email: String,
    role: UserRole,
}

impl NoneAuthenticator {
    pub fn new(email: impl Into<String>, role: UserRole) -> Self {
        Self {
            email: email.into(),
            role,
        }
    }
}

#[async_trait]
impl Authenticator for NoneAuthenticator {
    async fn authenticate(&self, _request: &AuthRequest) -> Result<Identity, AuthError> {
        Ok(Identity::new(self.email.clone(), self.role, self.method_name()))
    }

    fn method_name(&self) -> &'static str {
        "none"
    }
}
