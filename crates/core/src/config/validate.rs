use super::{types::Config, ConfigError};

/// Largest page size the catalog API honors.
const MAX_PER_PAGE: u32 = 250;

/// Validate configuration
/// Currently validates:
/// - Database path is not empty
/// - Catalog endpoints are set and page size is within 1..=250
/// - Scanner binary is set
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.database.path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "database.path cannot be empty".to_string(),
        ));
    }

    if config.catalog.plugins_url.trim().is_empty() || config.catalog.themes_url.trim().is_empty()
    {
        return Err(ConfigError::ValidationError(
            "catalog.plugins_url and catalog.themes_url cannot be empty".to_string(),
        ));
    }

    if !(1..=MAX_PER_PAGE).contains(&config.catalog.per_page) {
        return Err(ConfigError::ValidationError(format!(
            "catalog.per_page must be between 1 and {}, got {}",
            MAX_PER_PAGE, config.catalog.per_page
        )));
    }

    if config.scanner.binary.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "scanner.binary cannot be empty".to_string(),
        ));
    }

    Ok(())
}
