use async_trait::async_trait;

use super::{AuthError, AuthRequest, Authenticator, Identity};
use crate::ticket::validate_email;
use crate::user::UserRole;

pub const EMAIL_HEADER: &str = "x-auth-email";
pub const ROLE_HEADER: &str = "x-auth-role";

/// Trusts identity headers set by an upstream OAuth proxy.
///
/// The proxy must strip these headers from client requests.
pub struct HeaderAuthenticator;

impl HeaderAuthenticator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HeaderAuthenticator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Authenticator for HeaderAuthenticator {
    async fn authenticate(&self, request: &AuthRequest) -> Result<Identity, AuthError> {
        let email = request
            .header(EMAIL_HEADER)
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .ok_or(AuthError::NotAuthenticated)?;

        validate_email(email).map_err(|e| AuthError::InvalidCredentials(e.to_string()))?;

        let role = match request.header(ROLE_HEADER).map(str::trim) {
            None | Some("") => UserRole::default(),
            Some(raw) => raw
                .parse::<UserRole>()
                .map_err(AuthError::InvalidCredentials)?,
        };

        Ok(Identity::new(email, role, self.method_name()))
    }

    fn method_name(&self) -> &'static str {
        "header"
    }
}
