use super::{types::Config, ConfigError};

/// Largest page the group and post menus may render.
const MAX_PAGE_SIZE: usize = 20;

/// Validate configuration
/// Currently validates:
/// - Bot token is present
/// - Server port is not 0
/// - Menu page size is within bounds
/// - Size-capped delivery targets are usable
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.bot.token.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "bot.token is required (set BOT_TOKEN or MEDIAFETCH_BOT__TOKEN)".to_string(),
        ));
    }

    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    let page_size = config.dispatch.page_size;
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
        return Err(ConfigError::ValidationError(format!(
            "dispatch.page_size must be between 1 and {}, got {}",
            MAX_PAGE_SIZE, page_size
        )));
    }

    if config.delivery.compress_target_bytes == 0 {
        return Err(ConfigError::ValidationError(
            "delivery.compress_target_bytes must be greater than 0".to_string(),
        ));
    }

    let ratio = config.delivery.escalation_ratio;
    if !(ratio > 0.0 && ratio < 1.0) {
        return Err(ConfigError::ValidationError(format!(
            "delivery.escalation_ratio must be in (0, 1), got {}",
            ratio
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.bot.token = "123:abc".to_string();
        config
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_validate_missing_token_fails() {
        let mut config = valid_config();
        config.bot.token = "   ".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
        assert!(err.to_string().contains("bot.token"));
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = valid_config();
        config.server.port = 0;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validate_page_size_bounds() {
        let mut config = valid_config();
        config.dispatch.page_size = 0;
        assert!(validate_config(&config).is_err());

        config.dispatch.page_size = 21;
        assert!(validate_config(&config).is_err());

        config.dispatch.page_size = 20;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_delivery_targets() {
        let mut config = valid_config();
        config.delivery.compress_target_bytes = 0;
        assert!(validate_config(&config).is_err());

        let mut config = valid_config();
        config.delivery.escalation_ratio = 1.0;
        assert!(validate_config(&config).is_err());

        config.delivery.escalation_ratio = 0.0;
        assert!(validate_config(&config).is_err());
    }
}
