use crate::config::types::{Config, CrawlerConfig, IndexConfig, OutputConfig, UserAgentConfig};
use crate::sites::SITE_NAMES;
use crate::ConfigError;
use url::Url;

const MAX_WORKERS: u32 = 16;
const MAX_DELAY_MS: u64 = 60_000;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_index_config(&config.index)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if !SITE_NAMES.contains(&config.site.as_str()) {
        return Err(ConfigError::Validation(format!(
            "site must be one of {}, got '{}'",
            SITE_NAMES.join(", "),
            config.site
        )));
    }

    if config.pages < 1 {
        return Err(ConfigError::Validation(format!(
            "pages must be >= 1, got {}",
            config.pages
        )));
    }

    if config.min_delay_ms > config.max_delay_ms {
        return Err(ConfigError::Validation(format!(
            "min_delay_ms ({}) must not exceed max_delay_ms ({})",
            config.min_delay_ms, config.max_delay_ms
        )));
    }

    if config.max_delay_ms > MAX_DELAY_MS {
        return Err(ConfigError::Validation(format!(
            "max_delay_ms must be <= {}, got {}",
            MAX_DELAY_MS, config.max_delay_ms
        )));
    }

    if config.workers < 1 || config.workers > MAX_WORKERS {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and {}, got {}",
            MAX_WORKERS, config.workers
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "crawler request_timeout_secs must be >= 1".to_string(),
        ));
    }

    if let Some(base_url) = &config.base_url {
        validate_http_url(base_url, "base_url")?;
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    if config.snapshot_path.is_empty() {
        return Err(ConfigError::Validation(
            "snapshot_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates search index configuration
fn validate_index_config(config: &IndexConfig) -> Result<(), ConfigError> {
    validate_http_url(&config.url, "index url")?;

    if config.name.is_empty() {
        return Err(ConfigError::Validation(
            "index name cannot be empty".to_string(),
        ));
    }

    // Elasticsearch rejects uppercase index names
    if config.name.chars().any(|c| c.is_uppercase()) {
        return Err(ConfigError::Validation(format!(
            "index name must be lowercase, got '{}'",
            config.name
        )));
    }

    if config.batch_size < 1 {
        return Err(ConfigError::Validation(format!(
            "batch_size must be >= 1, got {}",
            config.batch_size
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "index request_timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_http_url(value: &str, field: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            field, value
        )));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    // Basic email format check: must contain @ and have text on both sides
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    let local = parts[0];
    let domain = parts[1];

    if local.is_empty() || domain.is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
