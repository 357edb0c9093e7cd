pub mod build;
pub mod init;
pub mod order;
pub mod seed;

use sower_core::config::SowerConfig;
use sower_core::SowerError;

/// Resolve the connection URL: `--db` flag (clap also fills it from
/// DATABASE_URL and .env), then the sower.toml [database] section.
pub fn resolve_db_url(flag: &Option<String>, config: Option<&SowerConfig>) -> anyhow::Result<String> {
    if let Some(url) = flag {
        return Ok(url.clone());
    }
    if let Some(url) = config.and_then(|c| c.database.url.clone()) {
        return Ok(url);
    }
    Err(SowerError::NoDatabaseUrl.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_wins_over_config() {
        let mut config = SowerConfig::default();
        config.database.url = Some("sqlite://config.db".to_string());
        let url =
            resolve_db_url(&Some("sqlite://flag.db".to_string()), Some(&config)).unwrap();
        assert_eq!(url, "sqlite://flag.db");
    }

    #[test]
    fn test_config_fallback() {
        let mut config = SowerConfig::default();
        config.database.url = Some("sqlite://config.db".to_string());
        assert_eq!(resolve_db_url(&None, Some(&config)).unwrap(), "sqlite://config.db");
    }

    #[test]
    fn test_missing_everywhere_errors() {
        assert!(resolve_db_url(&None, None).is_err());
    }
}
