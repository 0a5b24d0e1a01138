use crate::config::types::{
    Config, CrawlMode, CrawlerConfig, ForumConfig, IndexConfig, InputConfig, OutputConfig,
    ProviderConfig, UserAgentConfig, WikiConfig,
};
use crate::ConfigError;
use url::Url;

/// Largest number of identifiers the Stack Exchange API accepts in one vectorized request
pub const PROVIDER_BATCH_LIMIT: usize = 100;

/// Largest page size the Stack Exchange API accepts
pub const PROVIDER_PAGE_LIMIT: u32 = 100;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_provider_config(&config.provider)?;
    validate_index_config(&config.index)?;
    validate_wiki_config(&config.wiki)?;
    validate_forum_config(&config.forum)?;
    validate_input_config(&config.input, config.crawler.mode)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_requests < 1 || config.max_concurrent_requests > 32 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_requests must be between 1 and 32, got {}",
            config.max_concurrent_requests
        )));
    }

    if config.maximum_delay < config.minimum_delay {
        return Err(ConfigError::Validation(format!(
            "maximum_delay ({}ms) must be >= minimum_delay ({}ms)",
            config.maximum_delay, config.minimum_delay
        )));
    }

    if config.max_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be <= 10, got {}",
            config.max_retries
        )));
    }

    if config.request_timeout == 0 {
        return Err(ConfigError::Validation(
            "request_timeout must be > 0ms".to_string(),
        ));
    }

    if config.batch_size < 1 || config.batch_size > PROVIDER_BATCH_LIMIT {
        return Err(ConfigError::Validation(format!(
            "batch_size must be between 1 and {}, got {}",
            PROVIDER_BATCH_LIMIT, config.batch_size
        )));
    }

    if config.max_pages == Some(0) {
        return Err(ConfigError::Validation(
            "max_pages must be >= 1 when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
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

/// Validates the provider section
fn validate_provider_config(config: &ProviderConfig) -> Result<(), ConfigError> {
    validate_base_url("api_base", &config.api_base)?;

    if config.site.trim().is_empty() {
        return Err(ConfigError::Validation("site cannot be empty".to_string()));
    }

    if config.page_size < 1 || config.page_size > PROVIDER_PAGE_LIMIT {
        return Err(ConfigError::Validation(format!(
            "page_size must be between 1 and {}, got {}",
            PROVIDER_PAGE_LIMIT, config.page_size
        )));
    }

    if config.id_patterns.is_empty() {
        return Err(ConfigError::Validation(
            "id_patterns must list at least one path keyword".to_string(),
        ));
    }

    if let Some(pattern) = config
        .id_patterns
        .iter()
        .find(|p| p.is_empty() || p.contains('/'))
    {
        return Err(ConfigError::Validation(format!(
            "id pattern '{}' must be a single non-empty path segment",
            pattern
        )));
    }

    Ok(())
}

/// Validates the package index section
fn validate_index_config(config: &IndexConfig) -> Result<(), ConfigError> {
    validate_base_url("index.base", &config.base)?;

    if config.distro.trim().is_empty() || config.distro.contains('/') {
        return Err(ConfigError::Validation(format!(
            "index.distro must be a non-empty name, got '{}'",
            config.distro
        )));
    }

    Ok(())
}

/// Validates the wiki section
fn validate_wiki_config(config: &WikiConfig) -> Result<(), ConfigError> {
    validate_base_url("wiki.base", &config.base)?;

    if config.versions.is_empty() {
        return Err(ConfigError::Validation(
            "wiki.versions must list at least one version".to_string(),
        ));
    }

    // Versions are spliced into CSS selectors
    if let Some(version) = config.versions.iter().find(|v| {
        v.is_empty()
            || !v
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }) {
        return Err(ConfigError::Validation(format!(
            "wiki version '{}' must contain only letters, digits, '-' and '_'",
            version
        )));
    }

    Ok(())
}

/// Validates the forum section
fn validate_forum_config(config: &ForumConfig) -> Result<(), ConfigError> {
    validate_base_url("forum.base", &config.base)?;

    if config.category.contains('/') {
        return Err(ConfigError::Validation(format!(
            "forum.category must be a slug, got '{}'",
            config.category
        )));
    }

    Ok(())
}

/// Checks that `value` is an absolute http(s) URL
fn validate_base_url(name: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {}: {}", name, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} must be http or https, got '{}'",
            name, value
        )));
    }

    Ok(())
}

/// Validates input paths against the selected mode
fn validate_input_config(config: &InputConfig, mode: CrawlMode) -> Result<(), ConfigError> {
    if mode == CrawlMode::Revisit && config.source_path.as_deref().map_or(true, str::is_empty) {
        return Err(ConfigError::Validation(
            "revisit mode requires input.source_path".to_string(),
        ));
    }

    if config.url_field.is_empty() {
        return Err(ConfigError::Validation(
            "url_field cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.records_path.is_empty() {
        return Err(ConfigError::Validation(
            "records_path cannot be empty".to_string(),
        ));
    }

    if config.missing_path.is_empty() {
        return Err(ConfigError::Validation(
            "missing_path cannot be empty".to_string(),
        ));
    }

    if config.records_path == config.missing_path {
        return Err(ConfigError::Validation(
            "records_path and missing_path must differ".to_string(),
        ));
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

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !parts[1].contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
