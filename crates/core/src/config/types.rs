use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::acquire::AcquireConfig;
use crate::converter::ConverterConfig;
use crate::dispatch::DispatchConfig;
use crate::media::DeliveryConfig;
use crate::store::StoreConfig;
use crate::transport::AlternateConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub acquire: AcquireConfig,
    #[serde(default)]
    pub converter: ConverterConfig,
    #[serde(default)]
    pub delivery: DeliveryConfig,
    #[serde(default)]
    pub alternate: AlternateConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
}

/// Chat bot configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BotConfig {
    /// Bot API token. Required; startup aborts when empty.
    #[serde(default)]
    pub token: String,
    /// When set, only this user may talk to the bot.
    #[serde(default)]
    pub allowed_user_id: Option<u64>,
    /// Chat notified when the bot starts.
    #[serde(default)]
    pub admin_chat_id: Option<i64>,
    /// Deployment name appended to the startup notice.
    #[serde(default)]
    pub instance_name: Option<String>,
}

/// Health/metrics HTTP server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    3000
}

/// Local storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Root under which every job gets its own randomly named directory.
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
        }
    }
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("./downloads")
}

/// Telegram API credential triple.
///
/// Passed to the extraction tool as extractor options and used by the
/// alternate transport.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CredentialsConfig {
    #[serde(default)]
    pub api_id: Option<i64>,
    #[serde(default)]
    pub api_hash: Option<String>,
    #[serde(default)]
    pub session: Option<String>,
}

impl CredentialsConfig {
    /// Whether all three parts are present and non-empty.
    pub fn is_complete(&self) -> bool {
        self.api_id.is_some_and(|id| id != 0)
            && self.api_hash.as_deref().is_some_and(|h| !h.is_empty())
            && self.session.as_deref().is_some_and(|s| !s.is_empty())
    }

    /// Environment variables understood by the alternate transport script.
    pub fn env_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(id) = self.api_id {
            pairs.push(("API_ID".to_string(), id.to_string()));
        }
        if let Some(ref hash) = self.api_hash {
            pairs.push(("API_HASH".to_string(), hash.clone()));
        }
        if let Some(ref session) = self.session {
            pairs.push(("STRING_SESSION".to_string(), session.clone()));
        }
        pairs
    }
}

/// Sanitized config for logging (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub bot: SanitizedBotConfig,
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub credentials_configured: bool,
    pub alternate_enabled: bool,
    pub single_use_tokens: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_ttl_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedBotConfig {
    pub token_configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_user_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_chat_id: Option<i64>,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            bot: SanitizedBotConfig {
                token_configured: !config.bot.token.trim().is_empty(),
                allowed_user_id: config.bot.allowed_user_id,
                admin_chat_id: config.bot.admin_chat_id,
            },
            server: config.server.clone(),
            storage: config.storage.clone(),
            credentials_configured: config.credentials.is_complete(),
            alternate_enabled: config.alternate.enabled && config.credentials.is_complete(),
            single_use_tokens: config.store.single_use_tokens,
            job_ttl_secs: config.store.job_ttl_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal_config() {
        let toml = r#"
[bot]
token = "123:abc"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.bot.token, "123:abc");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.storage.download_dir, PathBuf::from("./downloads"));
        assert_eq!(config.dispatch.page_size, 8);
        assert!(!config.store.single_use_tokens);
    }

    #[test]
    fn test_deserialize_full_bot_section() {
        let toml = r#"
[bot]
token = "123:abc"
allowed_user_id = 42
admin_chat_id = -100500
instance_name = "prod"

[server]
host = "127.0.0.1"
port = 9000

[storage]
download_dir = "/data/downloads"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.bot.allowed_user_id, Some(42));
        assert_eq!(config.bot.admin_chat_id, Some(-100500));
        assert_eq!(config.bot.instance_name.as_deref(), Some("prod"));
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.storage.download_dir, PathBuf::from("/data/downloads"));
    }

    #[test]
    fn test_credentials_completeness() {
        let mut creds = CredentialsConfig::default();
        assert!(!creds.is_complete());

        creds.api_id = Some(12345);
        creds.api_hash = Some("hash".to_string());
        assert!(!creds.is_complete());

        creds.session = Some("session".to_string());
        assert!(creds.is_complete());

        let pairs = creds.env_pairs();
        assert_eq!(pairs.len(), 3);
        assert!(pairs.contains(&("API_ID".to_string(), "12345".to_string())));
    }

    #[test]
    fn test_sanitized_config_hides_secrets() {
        let mut config = Config::default();
        config.bot.token = "secret-token".to_string();
        config.credentials = CredentialsConfig {
            api_id: Some(1),
            api_hash: Some("h".to_string()),
            session: Some("s".to_string()),
        };

        let sanitized = SanitizedConfig::from(&config);
        assert!(sanitized.bot.token_configured);
        assert!(sanitized.credentials_configured);
        assert!(sanitized.alternate_enabled);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("secret-token"));
    }
}
