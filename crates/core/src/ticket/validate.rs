//! Input validation for ticket submission.

use thiserror::Error;

use super::TicketInput;

/// Maximum title length in characters.
pub const MAX_TITLE_CHARS: usize = 200;

/// Maximum description length in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 10_000;

/// Rejected input. Surfaced to the caller, never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("title is required")]
    MissingTitle,

    #[error("title exceeds {max} characters")]
    TitleTooLong { max: usize },

    #[error("description exceeds {max} characters")]
    DescriptionTooLong { max: usize },

    #[error("invalid email: {0:?}")]
    InvalidEmail(String),

    #[error("unknown priority: {0:?}")]
    UnknownPriority(String),

    #[error("too many attachments: {count} (max {max})")]
    TooManyAttachments { count: usize, max: usize },

    #[error("attachment {name:?} is {size} bytes (max {max})")]
    AttachmentTooLarge { name: String, size: usize, max: usize },
}

impl TicketInput {
    /// Validate user-supplied fields.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ValidationError::MissingTitle);
        }
        if title.chars().count() > MAX_TITLE_CHARS {
            return Err(ValidationError::TitleTooLong {
                max: MAX_TITLE_CHARS,
            });
        }
        if self.description.chars().count() > MAX_DESCRIPTION_CHARS {
            return Err(ValidationError::DescriptionTooLong {
                max: MAX_DESCRIPTION_CHARS,
            });
        }
        Ok(())
    }
}

/// Minimal shape check: one `@` with a non-empty local part and a dotted domain.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let invalid = || ValidationError::InvalidEmail(email.to_string());

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.contains('@')
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
        || email.chars().any(char::is_whitespace)
    {
        return Err(invalid());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticket::TicketPriority;

    #[test]
    fn test_valid_input() {
        let input = TicketInput::new("Printer jam", "Tray 2 is stuck", TicketPriority::High);
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_blank_title_rejected() {
        let input = TicketInput::new("   ", "", TicketPriority::Low);
        assert_eq!(input.validate(), Err(ValidationError::MissingTitle));
    }

    #[test]
    fn test_long_title_rejected() {
        let input = TicketInput::new("x".repeat(MAX_TITLE_CHARS + 1), "", TicketPriority::Low);
        assert!(matches!(
            input.validate(),
            Err(ValidationError::TitleTooLong { .. })
        ));
    }

    #[test]
    fn test_long_description_rejected() {
        let input = TicketInput::new(
            "ok",
            "d".repeat(MAX_DESCRIPTION_CHARS + 1),
            TicketPriority::Low,
        );
        assert!(matches!(
            input.validate(),
            Err(ValidationError::DescriptionTooLong { .. })
        ));
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("a@x.com").is_ok());
        assert!(validate_email("first.last@sub.example.org").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@x.com").is_err());
        assert!(validate_email("a@localhost").is_err());
        assert!(validate_email("a@@x.com").is_err());
        assert!(validate_email("a b@x.com").is_err());
    }
}
