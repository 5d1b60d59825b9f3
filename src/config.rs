use anyhow::{Context, Result};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DATABASE_VAR: &str = "CINETRACK_DATABASE";
pub const ADDR_VAR: &str = "CINETRACK_ADDR";
pub const MAX_BODY_VAR: &str = "CINETRACK_MAX_BODY_BYTES";

const DEFAULT_DATABASE: &str = "movies.db";
const DEFAULT_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024; // 1MB, plenty for an import

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub database_path: PathBuf,
    pub addr: SocketAddr,
    pub max_body_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_path = get(DATABASE_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE));

        let addr = get(ADDR_VAR)
            .unwrap_or_else(|| DEFAULT_ADDR.to_string())
            .trim()
            .parse::<SocketAddr>()
            .with_context(|| format!("{ADDR_VAR} must be a socket address like 0.0.0.0:8000"))?;

        let max_body_bytes = match get(MAX_BODY_VAR) {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .with_context(|| format!("{MAX_BODY_VAR} must be a byte count"))?,
            None => DEFAULT_MAX_BODY_BYTES,
        };

        Ok(Self {
            database_path,
            addr,
            max_body_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.database_path, PathBuf::from("movies.db"));
        assert_eq!(config.addr, "0.0.0.0:8000".parse().unwrap());
        assert_eq!(config.max_body_bytes, 1024 * 1024);
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_lookup(lookup(&[
            (DATABASE_VAR, "/data/media.db"),
            (ADDR_VAR, "127.0.0.1:9000"),
            (MAX_BODY_VAR, "2048"),
        ]))
        .unwrap();
        assert_eq!(config.database_path, PathBuf::from("/data/media.db"));
        assert_eq!(config.addr.port(), 9000);
        assert_eq!(config.max_body_bytes, 2048);
    }

    #[test]
    fn blank_value_falls_back_to_default() {
        let config = Config::from_lookup(lookup(&[(DATABASE_VAR, "  ")])).unwrap();
        assert_eq!(config.database_path, PathBuf::from("movies.db"));
    }

    #[test]
    fn invalid_values_name_the_variable() {
        let err = Config::from_lookup(lookup(&[(ADDR_VAR, "not-an-addr")])).unwrap_err();
        assert!(err.to_string().contains(ADDR_VAR));
        let err = Config::from_lookup(lookup(&[(MAX_BODY_VAR, "lots")])).unwrap_err();
        assert!(err.to_string().contains(MAX_BODY_VAR));
    }
}
