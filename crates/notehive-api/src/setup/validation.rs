use anyhow::Result;
use notehive_core::Config;

/// Validate configuration before any service starts.
pub fn validate_config(config: &Config) -> Result<()> {
    config.validate()
}
