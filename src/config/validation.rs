use crate::config::types::{
    BrowserSettings, Config, ExtractionConfig, OutputConfig, ScheduleConfig,
};
use crate::extract::Selectors;
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_forums(&config.forums)?;
    validate_schedule(&config.schedule)?;
    validate_extraction(&config.extraction)?;
    validate_browser(&config.browser)?;
    validate_output(&config.output)?;
    Selectors::parse(&config.selectors).map_err(ConfigError::Validation)?;
    Ok(())
}

/// Validates forum names: non-empty, unique, letters/digits/underscores only
fn validate_forums(forums: &[String]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for forum in forums {
        if forum.is_empty() {
            return Err(ConfigError::Validation(
                "forum names cannot be empty".to_string(),
            ));
        }

        if !forum.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(ConfigError::Validation(format!(
                "forum name must contain only letters, digits and underscores, got '{}'",
                forum
            )));
        }

        if !seen.insert(forum.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "forum '{}' is listed more than once",
                forum
            )));
        }
    }

    Ok(())
}

/// Validates batch size and delay ranges
fn validate_schedule(config: &ScheduleConfig) -> Result<(), ConfigError> {
    if config.batch_min < 1 {
        return Err(ConfigError::Validation(format!(
            "batch_min must be >= 1, got {}",
            config.batch_min
        )));
    }

    validate_range("batch", config.batch_min as u64, config.batch_max as u64)?;
    validate_range("cooldown", config.cooldown_min_secs, config.cooldown_max_secs)?;
    validate_range("idle", config.idle_min_secs, config.idle_max_secs)?;
    validate_range(
        "empty_backoff",
        config.empty_backoff_min_secs,
        config.empty_backoff_max_secs,
    )?;

    Ok(())
}

fn validate_range(name: &str, min: u64, max: u64) -> Result<(), ConfigError> {
    if min > max {
        return Err(ConfigError::Validation(format!(
            "{}_min must not exceed {}_max, got {} > {}",
            name, name, min, max
        )));
    }
    Ok(())
}

/// Validates the staleness window and origin
fn validate_extraction(config: &ExtractionConfig) -> Result<(), ConfigError> {
    if !config.max_post_age_hours.is_finite() || config.max_post_age_hours <= 0.0 {
        return Err(ConfigError::Validation(format!(
            "max_post_age_hours must be a positive number, got {}",
            config.max_post_age_hours
        )));
    }

    let origin = Url::parse(&config.origin)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid origin '{}': {}", config.origin, e)))?;

    if origin.scheme() != "https" && origin.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "origin '{}' must use http or https",
            config.origin
        )));
    }

    if origin.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "origin '{}' has no host",
            config.origin
        )));
    }

    Ok(())
}

/// Validates browser timeouts and scrolling
fn validate_browser(config: &BrowserSettings) -> Result<(), ConfigError> {
    if config.navigation_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "navigation_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.element_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "element_timeout_secs must be >= 1".to_string(),
        ));
    }

    validate_range(
        "scroll_pause",
        config.scroll_pause_min_ms,
        config.scroll_pause_max_ms,
    )?;

    if config.viewport_width == 0 || config.viewport_height == 0 {
        return Err(ConfigError::Validation(format!(
            "viewport must be non-zero, got {}x{}",
            config.viewport_width, config.viewport_height
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}
