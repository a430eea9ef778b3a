//! Helpdesk users and their roles.

mod directory;
mod types;

pub use directory::{UserDirectory, UserError};
pub use types::{User, UserRole};
