mod header;
mod none;
mod traits;
mod types;

pub use header::*;
pub use none::*;
pub use traits::*;
pub use types::*;

use crate::config::{AuthConfig, AuthMethod};

/// Factory function to create authenticator from config
pub fn create_authenticator(config: &AuthConfig) -> Result<Box<dyn Authenticator>, AuthError> {
    match config.method {
        AuthMethod::None => {
            let dev = &config.dev_identity;
            crate::ticket::validate_email(&dev.email).map_err(|e| {
                AuthError::ConfigurationError(format!("auth.dev_identity: {}", e))
            })?;
            Ok(Box::new(NoneAuthenticator::new(dev.email.clone(), dev.role)))
        }
        AuthMethod::Header => Ok(Box::new(HeaderAuthenticator::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DevIdentity;
    use crate::user::UserRole;

    #[test]
    fn test_create_authenticator_none() {
        let config = AuthConfig {
            method: AuthMethod::None,
            dev_identity: DevIdentity::default(),
        };
        let auth = create_authenticator(&config).unwrap();
        assert_eq!(auth.method_name(), "none");
    }

    #[test]
    fn test_create_authenticator_header() {
        let config = AuthConfig {
            method: AuthMethod::Header,
            dev_identity: DevIdentity::default(),
        };
        let auth = create_authenticator(&config).unwrap();
        assert_eq!(auth.method_name(), "header");
    }

    #[test]
    fn test_create_authenticator_rejects_bad_dev_email() {
        let config = AuthConfig {
            method: AuthMethod::None,
            dev_identity: DevIdentity {
                email: "dev".to_string(),
                role: UserRole::User,
            },
        };
        let result = create_authenticator(&config);
        assert!(matches!(result, Err(AuthError::ConfigurationError(_))));
    }
}
