use crate::config::types::{Config, CrawlerConfig, ExtractConfig, FilterConfig, HttpConfig, OutputConfig};
use crate::ConfigError;
use reqwest::header::HeaderValue;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_http_config(&config.http)?;
    validate_filter_config(&config.filter)?;
    validate_extract_config(&config.extract)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.seed_url.is_empty() {
        return Err(ConfigError::Validation(
            "seed_url must be set in the config file or on the command line".to_string(),
        ));
    }

    let seed = Url::parse(&config.seed_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed_url '{}': {}", config.seed_url, e)))?;

    if seed.scheme() != "http" && seed.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "seed_url '{}' must use the http or https scheme",
            config.seed_url
        )));
    }

    if seed.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "seed_url '{}' has no host",
            config.seed_url
        )));
    }

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.concurrency < 1 || config.concurrency > 100 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 100, got {}",
            config.concurrency
        )));
    }

    Ok(())
}

/// Validates HTTP configuration
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.user_agent.is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    for (name, value) in [
        ("user_agent", &config.user_agent),
        ("accept_language", &config.accept_language),
    ] {
        if HeaderValue::from_str(value).is_err() {
            return Err(ConfigError::Validation(format!(
                "{} is not a valid header value: '{}'",
                name, value
            )));
        }
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout_secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    if config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "connect_timeout_secs must be >= 1, got {}",
            config.connect_timeout_secs
        )));
    }

    if config.max_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be <= 10, got {}",
            config.max_retries
        )));
    }

    Ok(())
}

/// Validates link filter configuration
fn validate_filter_config(config: &FilterConfig) -> Result<(), ConfigError> {
    for segment in &config.denied_segments {
        let name = segment.strip_suffix('*').unwrap_or(segment);
        if name.is_empty() || name.contains('/') || name.contains('*') {
            return Err(ConfigError::Validation(format!(
                "denied segment must be a path segment with an optional trailing '*', got '{}'",
                segment
            )));
        }
    }

    for ext in config
        .forbidden_extensions
        .iter()
        .chain(config.document_extensions.iter())
    {
        validate_extension(ext)?;
    }

    Ok(())
}

/// Validates an extension token such as ".pdf" or ".tar.gz"
fn validate_extension(ext: &str) -> Result<(), ConfigError> {
    if !ext.starts_with('.') || ext.len() < 2 || ext.ends_with('.') || ext.contains("..") {
        return Err(ConfigError::Validation(format!(
            "extension must look like '.ext' or '.ext.ext', got '{}'",
            ext
        )));
    }
    Ok(())
}

/// Validates extraction configuration
fn validate_extract_config(config: &ExtractConfig) -> Result<(), ConfigError> {
    for selector in config
        .strip_selectors
        .iter()
        .chain(config.content_selectors.iter())
    {
        compile_selector(selector)?;
    }

    if let Some(lang) = &config.secondary_language {
        if lang.is_empty() {
            return Err(ConfigError::Validation(
                "secondary_language cannot be empty when set".to_string(),
            ));
        }
        if config.locale_param.is_empty() {
            return Err(ConfigError::Validation(
                "locale_param cannot be empty when secondary_language is set".to_string(),
            ));
        }
    }

    if config.document_concurrency < 1 {
        return Err(ConfigError::Validation(format!(
            "document_concurrency must be >= 1, got {}",
            config.document_concurrency
        )));
    }

    Ok(())
}

/// Compiles a CSS selector from configuration
pub fn compile_selector(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("directory", &config.directory),
        ("results_file", &config.results_file),
        ("text_dir", &config.text_dir),
        ("tables_dir", &config.tables_dir),
        ("documents_dir", &config.documents_dir),
        ("graph_file", &config.graph_file),
    ] {
        if value.is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
        }
    }

    if config.chunk_bytes < 1024 {
        return Err(ConfigError::Validation(format!(
            "chunk_bytes must be >= 1024, got {}",
            config.chunk_bytes
        )));
    }

    Ok(())
}
