use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

static DATA_DIR_NAME: &str = "campus_market";
static MARKET_DB_NAME: &str = "market.sqlite";
static CONFIG_FILE_NAME: &str = "config.json";

// data_dir_path
// |- campus_market
//    |- market.sqlite
//    |- config.json

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no data directory available on this platform")]
    NoDataDir,
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed config file: {0}")]
    Json(#[from] serde_json::Error),
}

fn default_bind_addr() -> String {
    "127.0.0.1:5000".to_string()
}

fn default_session_ttl_hours() -> i64 {
    24 * 7
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MarketConfig {
    pub database_path: PathBuf,

    /// Address the HTTP server listens on.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,

    /// Base URL used when building absolute links, e.g. in forwarded items.
    /// Falls back to the request's Host header when unset.
    #[serde(default)]
    pub public_url: Option<String>,

    /// Full connection string taking precedence over `database_path`.
    #[serde(skip)]
    pub database_url: Option<String>,
}

impl MarketConfig {
    /// Creates a config rooted at `data_dir` with defaults for everything else
    pub fn new(data_dir: &Path) -> Self {
        MarketConfig {
            database_path: data_dir.join(MARKET_DB_NAME),
            bind_addr: default_bind_addr(),
            session_ttl_hours: default_session_ttl_hours(),
            public_url: None,
            database_url: None,
        }
    }

    pub fn database_url(&self) -> String {
        match &self.database_url {
            Some(url) => url.clone(),
            None => format!("sqlite://{}?mode=rwc", self.database_path.display()),
        }
    }
}

/// Gets the existing config or initializes a new one if it doesn't exist.
///
/// `data_dir` overrides the platform data directory.
pub async fn get_or_init(data_dir: Option<PathBuf>) -> Result<MarketConfig, ConfigError> {
    let market_dir = match data_dir {
        Some(dir) => dir,
        None => dirs::data_dir()
            .ok_or(ConfigError::NoDataDir)?
            .join(DATA_DIR_NAME),
    };
    let config_path = market_dir.join(CONFIG_FILE_NAME);

    fs::create_dir_all(&market_dir).await?;

    if fs::try_exists(&config_path).await? {
        let mut file = fs::File::open(&config_path).await?;
        let mut contents = String::new();
        file.read_to_string(&mut contents).await?;

        let config: MarketConfig = serde_json::from_str(&contents)?;
        Ok(config)
    } else {
        let config = MarketConfig::new(&market_dir);

        let json = serde_json::to_string_pretty(&config)?;
        let mut file = fs::File::create(&config_path).await?;
        file.write_all(json.as_bytes()).await?;

        tracing::info!(path = %config_path.display(), "wrote default config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("campus_market_{tag}_{}", uuid::Uuid::now_v7()))
    }

    #[tokio::test]
    async fn creates_then_reloads_config() {
        let dir = scratch_dir("config");

        let created = get_or_init(Some(dir.clone())).await.unwrap();
        assert_eq!(created.bind_addr, "127.0.0.1:5000");
        assert_eq!(created.database_path, dir.join(MARKET_DB_NAME));
        assert!(dir.join(CONFIG_FILE_NAME).exists());

        let reloaded = get_or_init(Some(dir.clone())).await.unwrap();
        assert_eq!(reloaded.database_path, created.database_path);
        assert_eq!(reloaded.session_ttl_hours, 168);

        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn missing_fields_fall_back_to_defaults() {
        let dir = scratch_dir("partial");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join(CONFIG_FILE_NAME),
            r#"{ "database_path": "/tmp/other.sqlite" }"#,
        )
        .unwrap();

        let config = get_or_init(Some(dir.clone())).await.unwrap();
        assert_eq!(config.database_path, PathBuf::from("/tmp/other.sqlite"));
        assert_eq!(config.bind_addr, default_bind_addr());
        assert!(config.public_url.is_none());

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn explicit_database_url_wins() {
        let mut config = MarketConfig::new(Path::new("/data"));
        assert_eq!(config.database_url(), "sqlite:///data/market.sqlite?mode=rwc");
        config.database_url = Some("sqlite::memory:".to_string());
        assert_eq!(config.database_url(), "sqlite::memory:");
    }
}
