use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Prefix for structured environment overrides, e.g. `MEDIAFETCH_BOT__TOKEN`.
const ENV_PREFIX: &str = "MEDIAFETCH_";

/// Flat variables understood by earlier deployments, mapped to config paths.
const LEGACY_ENV: &[(&str, &str)] = &[
    ("BOT_TOKEN", "bot.token"),
    ("ALLOWED_USER_ID", "bot.allowed_user_id"),
    ("ADMIN_CHAT_ID", "bot.admin_chat_id"),
    ("DOKPLOY_APP_NAME", "bot.instance_name"),
    ("DOWNLOAD_DIR", "storage.download_dir"),
    ("API_ID", "credentials.api_id"),
    ("API_HASH", "credentials.api_hash"),
    ("STRING_SESSION", "credentials.session"),
    ("PORT", "server.port"),
];

fn legacy_env() -> Env {
    let names: Vec<&str> = LEGACY_ENV.iter().map(|(name, _)| *name).collect();
    Env::raw().only(&names).map(|key| {
        LEGACY_ENV
            .iter()
            .find(|(name, _)| key == *name)
            .map(|(_, path)| *path)
            .unwrap_or("unmapped")
            .into()
    })
}

fn base_figment() -> Figment {
    Figment::new()
}

fn with_env(figment: Figment) -> Figment {
    figment
        .merge(legacy_env())
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
}

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    with_env(base_figment().merge(Toml::file(path)))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from environment variables only
pub fn load_config_from_env() -> Result<Config, ConfigError> {
    with_env(base_figment())
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}
