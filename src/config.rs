/// 환경 변수 기반 설정
// region:    --- Imports
use crate::auction::model::CommissionRate;
use std::str::FromStr;
use std::time::Duration;
// endregion: --- Imports

// region:    --- Config Error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("환경 변수 {0} 이(가) 설정되지 않았습니다")]
    Missing(&'static str),

    #[error("환경 변수 {key} 의 값이 잘못되었습니다: {value}")]
    Invalid { key: &'static str, value: String },
}
// endregion: --- Config Error

// region:    --- Config
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

/// 입찰/수수료 규칙
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketRules {
    pub min_bid_increment: i64,
    pub commission_rate: CommissionRate,
}

#[derive(Debug, Clone)]
pub struct MarketConfig {
    pub bind_addr: String,
    pub storage: StorageBackend,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub reset_database: bool,
    pub rules: MarketRules,
    pub closing_interval: Duration,
    pub verification_interval: Duration,
    pub oracle_url: String,
    pub oracle_timeout: Duration,
}

impl MarketConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let storage = match lookup("STORAGE").as_deref() {
            None | Some("postgres") => StorageBackend::Postgres,
            Some("memory") => StorageBackend::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "STORAGE",
                    value: other.to_string(),
                })
            }
        };

        let database_url = lookup("DATABASE_URL");
        if storage == StorageBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let min_bid_increment: i64 = parse(&lookup, "MIN_BID_INCREMENT", 1)?;
        if min_bid_increment < 1 {
            return Err(ConfigError::Invalid {
                key: "MIN_BID_INCREMENT",
                value: min_bid_increment.to_string(),
            });
        }

        let commission_bps: i32 = parse(&lookup, "COMMISSION_RATE_BPS", 500)?;
        let commission_rate =
            CommissionRate::from_bps(commission_bps).ok_or(ConfigError::Invalid {
                key: "COMMISSION_RATE_BPS",
                value: commission_bps.to_string(),
            })?;

        Ok(Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            storage,
            database_url,
            database_max_connections: parse(&lookup, "DATABASE_MAX_CONNECTIONS", 5)?,
            reset_database: parse(&lookup, "RESET_DATABASE", false)?,
            rules: MarketRules {
                min_bid_increment,
                commission_rate,
            },
            closing_interval: Duration::from_secs(positive(&lookup, "CLOSING_INTERVAL_SECS", 1)?),
            verification_interval: Duration::from_secs(positive(
                &lookup,
                "VERIFICATION_INTERVAL_SECS",
                60,
            )?),
            oracle_url: lookup("ORACLE_URL")
                .unwrap_or_else(|| "http://localhost:4000/verify".to_string()),
            oracle_timeout: Duration::from_millis(positive(&lookup, "ORACLE_TIMEOUT_MS", 5_000)?),
        })
    }
}

fn parse<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}

/// tokio interval 은 0 주기를 허용하지 않는다.
fn positive(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: u64,
) -> Result<u64, ConfigError> {
    let value = parse(lookup, key, default)?;
    if value == 0 {
        return Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
        });
    }
    Ok(value)
}
// endregion: --- Config

// endregion: --- Tests
