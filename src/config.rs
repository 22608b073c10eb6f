use secrecy::Secret;
use serde::Deserialize;

use crate::jobs::revoked_token_cleaner::DEFAULT_CLEANUP_CRON;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,

    // Revoked token persistence; revocations are only forwarded when unset
    pub database_url: Option<String>,

    // Gateways that enforce revocations
    pub gateway_urls: Vec<String>,
    pub gateway_secret: Secret<String>,
    pub gateway_timeout_secs: u64,

    // Bearer token required on the notification endpoint
    pub notification_token: Option<Secret<String>>,

    pub cleanup_cron: String,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        // Load .env file if it exists (for local development)
        let _ = dotenvy::dotenv();

        let config = config::Config::builder()
            .add_source(config::Environment::default().separator("__"))
            .build()?;

        Self::from_source(&config)
    }

    fn from_source(config: &config::Config) -> Result<Self, config::ConfigError> {
        Ok(Self {
            host: get_or(config, "host", "127.0.0.1".to_string())?,
            port: get_or(config, "port", 9443)?,

            database_url: get_optional(config, "database_url")?,

            gateway_urls: get_optional::<String>(config, "gateway_urls")?
                .map(|raw| parse_list(&raw))
                .unwrap_or_default(),
            gateway_secret: Secret::new(config.get("gateway_secret")?),
            gateway_timeout_secs: get_or(config, "gateway_timeout_secs", 5)?,

            notification_token: get_optional::<String>(config, "notification_token")?
                .filter(|token| !token.is_empty())
                .map(Secret::new),

            cleanup_cron: get_or(config, "cleanup_cron", DEFAULT_CLEANUP_CRON.to_string())?,
        })
    }
}

/// Missing keys become `None`; present but malformed values are errors.
fn get_optional<T>(config: &config::Config, key: &str) -> Result<Option<T>, config::ConfigError>
where
    T: serde::de::DeserializeOwned,
{
    match config.get::<T>(key) {
        Ok(value) => Ok(Some(value)),
        Err(config::ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

fn get_or<T>(config: &config::Config, key: &str, default: T) -> Result<T, config::ConfigError>
where
    T: serde::de::DeserializeOwned,
{
    Ok(get_optional(config, key)?.unwrap_or(default))
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn build(pairs: &[(&str, &str)]) -> Result<Config, config::ConfigError> {
        let mut builder = config::Config::builder();
        for (key, value) in pairs {
            builder = builder.set_override(*key, *value).unwrap();
        }
        Config::from_source(&builder.build().unwrap())
    }

    #[test]
    fn test_defaults() {
        let config = build(&[("gateway_secret", "s3cret")]).unwrap();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 9443);
        assert!(config.database_url.is_none());
        assert!(config.gateway_urls.is_empty());
        assert_eq!(config.gateway_timeout_secs, 5);
        assert!(config.notification_token.is_none());
        assert_eq!(config.cleanup_cron, DEFAULT_CLEANUP_CRON);
        assert_eq!(config.gateway_secret.expose_secret(), "s3cret");
    }

    #[test]
    fn test_gateway_list_is_split_and_trimmed() {
        let config = build(&[
            ("gateway_secret", "s3cret"),
            ("gateway_urls", "https://gw1:9443, https://gw2:9443/ ,,"),
            ("port", "8080"),
        ])
        .unwrap();

        assert_eq!(
            config.gateway_urls,
            vec!["https://gw1:9443".to_string(), "https://gw2:9443/".to_string()]
        );
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_malformed_values_are_rejected() {
        assert!(build(&[("gateway_secret", "s3cret"), ("port", "abc")]).is_err());
        assert!(build(&[("gateway_secret", "s3cret"), ("port", "70000")]).is_err());
        assert!(build(&[
            ("gateway_secret", "s3cret"),
            ("gateway_timeout_secs", "five"),
        ])
        .is_err());
    }

    #[test]
    fn test_gateway_secret_is_required() {
        assert!(build(&[("port", "8080")]).is_err());
    }
}
