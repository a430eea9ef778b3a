use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::IpAddr;

use crate::user::UserRole;

/// Request information for authentication
#[derive(Debug, Clone)]
pub struct AuthRequest {
    /// Header names are lowercase.
    pub headers: HashMap<String, String>,
    pub source_ip: IpAddr,
}

impl AuthRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// Authenticated caller as asserted by the identity provider.
///
/// The role here authorizes the current request. It is not written back
/// to the user directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub email: String,
    pub role: UserRole,
    pub method: String,
}

impl Identity {
    pub fn new(email: impl Into<String>, role: UserRole, method: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            role,
            method: method.into(),
        }
    }

    pub fn is_technician(&self) -> bool {
        self.role == UserRole::Technician
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let mut headers = HashMap::new();
        headers.insert("x-auth-email".to_string(), "a@x.com".to_string());
        let request = AuthRequest {
            headers,
            source_ip: "127.0.0.1".parse().unwrap(),
        };
        assert_eq!(request.header("X-Auth-Email"), Some("a@x.com"));
        assert_eq!(request.header("x-auth-role"), None);
    }

    #[test]
    fn test_identity_serialization() {
        let identity = Identity::new("tech@x.com", UserRole::Technician, "header");
        assert!(identity.is_technician());

        let json = serde_json::to_value(&identity).unwrap();
        assert_eq!(json["role"], "technician");

        let back: Identity = serde_json::from_value(json).unwrap();
        assert_eq!(back, identity);
    }
}
