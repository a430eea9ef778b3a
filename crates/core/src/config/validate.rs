use super::{types::Config, CacheBackend, ConfigError};
use crate::ticket::validate_email;

/// Validate configuration
/// Currently validates:
/// - Auth section exists (enforced by serde)
/// - Server port is not 0
/// - Redis backend has a URL
/// - Timeouts, intervals and limits are non-zero
/// - Dev identity email is well formed
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let invalid = |msg: &str| Err(ConfigError::ValidationError(msg.to_string()));

    if config.server.port == 0 {
        return invalid("server.port cannot be 0");
    }

    if config.cache.backend == CacheBackend::Redis
        && config.cache.redis_url.as_deref().map_or(true, str::is_empty)
    {
        return invalid("cache.redis_url is required when cache.backend = \"redis\"");
    }
    if config.cache.op_timeout_ms == 0 {
        return invalid("cache.op_timeout_ms cannot be 0");
    }

    if config.queue.visibility_timeout_secs == 0 {
        return invalid("queue.visibility_timeout_secs cannot be 0");
    }

    if config.blob.max_attachments == 0 {
        return invalid("blob.max_attachments cannot be 0");
    }
    if config.blob.max_attachment_bytes == 0 {
        return invalid("blob.max_attachment_bytes cannot be 0");
    }

    if config.lifecycle.retention_days == 0 {
        return invalid("lifecycle.retention_days cannot be 0");
    }

    if config.processor.poll_interval_ms == 0 {
        return invalid("processor.poll_interval_ms cannot be 0");
    }

    if validate_email(&config.auth.dev_identity.email).is_err() {
        return Err(ConfigError::ValidationError(format!(
            "auth.dev_identity.email is not a valid email: {}",
            config.auth.dev_identity.email
        )));
    }

    Ok(())
}
