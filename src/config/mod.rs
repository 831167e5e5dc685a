use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::analysis::AnalysisStrategy;
use crate::geo::grid::DEFAULT_PRECISION;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    /// 未设置时使用进程内缓存
    pub redis_url: Option<String>,
    pub server_host: String,
    pub server_port: u16,
    pub api_base_uri: String,
    pub grid_precision: usize,
    pub l1_cache_ttl_secs: u64,
    pub l2_cache_ttl_secs: u64,
    pub gateway_timeout_ms: u64,
    pub kakao_api_key: String,
    pub kakao_api_base_url: String,
    pub analysis_strategy: AnalysisStrategy,
    pub run_migrations: bool,
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::Missing(key))
}

fn parsed_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { key, value }),
        Err(_) => Ok(default),
    }
}

fn positive(key: &'static str, value: u64) -> Result<u64, ConfigError> {
    if value == 0 {
        return Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
        });
    }
    Ok(value)
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        Ok(Config {
            database_url: required("DATABASE_URL")?,
            database_max_connections: parsed_or("DATABASE_MAX_CONNECTIONS", 10)?,
            redis_url: env::var("REDIS_URL").ok().filter(|url| !url.trim().is_empty()),
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "::".into()),
            server_port: parsed_or("SERVER_PORT", 3000)?,
            api_base_uri: env::var("API_BASE_URI").unwrap_or_else(|_| "/api".into()),
            grid_precision: parsed_or("GRID_PRECISION", DEFAULT_PRECISION)?,
            l1_cache_ttl_secs: positive("L1_CACHE_TTL_SECS", parsed_or("L1_CACHE_TTL_SECS", 300)?)?,
            l2_cache_ttl_secs: positive(
                "L2_CACHE_TTL_SECS",
                parsed_or("L2_CACHE_TTL_SECS", 86_400)?,
            )?,
            gateway_timeout_ms: positive(
                "GATEWAY_TIMEOUT_MS",
                parsed_or("GATEWAY_TIMEOUT_MS", 3000)?,
            )?,
            kakao_api_key: required("KAKAO_API_KEY")?,
            kakao_api_base_url: env::var("KAKAO_API_BASE_URL")
                .unwrap_or_else(|_| "https://dapi.kakao.com".into()),
            analysis_strategy: parsed_or("ANALYSIS_STRATEGY", AnalysisStrategy::Sequential)?,
            run_migrations: parsed_or("RUN_MIGRATIONS", false)?,
        })
    }

    pub fn l1_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.l1_cache_ttl_secs)
    }

    pub fn l2_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.l2_cache_ttl_secs)
    }

    pub fn gateway_timeout(&self) -> Duration {
        Duration::from_millis(self.gateway_timeout_ms)
    }
}
