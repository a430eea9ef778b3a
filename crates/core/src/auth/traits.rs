use async_trait::async_trait;
use thiserror::Error;

use super::types::{AuthRequest, Identity};

#[derive(Debug, Error)]
pub enum AuthError {
    /// No identity was presented.
    #[error("no identity presented")]
    NotAuthenticated,

    /// An identity was presented but could not be accepted.
    #[error("identity rejected: {0}")]
    InvalidCredentials(String),

    #[error("authenticator misconfigured: {0}")]
    ConfigurationError(String),
}

impl AuthError {
    /// The caller, not the server, is at fault.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::ConfigurationError(_))
    }

    /// Label for the auth failure counter.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::NotAuthenticated => "not_authenticated",
            Self::InvalidCredentials(_) => "invalid_credentials",
            Self::ConfigurationError(_) => "internal_error",
        }
    }
}

/// Resolves the caller of a request to an [`Identity`].
///
/// Implementations only establish who the caller is; the role they
/// return authorizes the current request and is never persisted here.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, request: &AuthRequest) -> Result<Identity, AuthError>;

    /// Shown in logs and `GET /users/me`.
    fn method_name(&self) -> &'static str;
}
