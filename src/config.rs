use std::net::{IpAddr, SocketAddr};

use anyhow::{Context, Result, bail};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://todos.db";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    pub addr: SocketAddr,
    /// Drop and recreate the todos table at boot. Loses all data.
    pub reset_schema: bool,
}

impl Config {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let database_url = lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let host = lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let host: IpAddr = host.parse().with_context(|| format!("HOST must be an IP address, got {host:?}"))?;
        let port = match lookup("PORT") {
            Some(raw) => raw.parse().with_context(|| format!("PORT must be a number, got {raw:?}"))?,
            None => DEFAULT_PORT,
        };

        let reset_schema = match lookup("TODO_RESET_SCHEMA").as_deref().map(str::to_ascii_lowercase).as_deref() {
            None | Some("") | Some("0") | Some("false") | Some("no") => false,
            Some("1") | Some("true") | Some("yes") => true,
            Some(other) => bail!("TODO_RESET_SCHEMA must be a boolean, got {other:?}"),
        };

        Ok(Self { database_url, addr: SocketAddr::new(host, port), reset_schema })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(cfg.addr, "0.0.0.0:5000".parse().unwrap());
        assert!(!cfg.reset_schema);
    }

    #[test]
    fn overrides() {
        let cfg = config(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("TODO_RESET_SCHEMA", "TRUE"),
        ])
        .unwrap();
        assert_eq!(cfg.database_url, "sqlite::memory:");
        assert_eq!(cfg.addr, "127.0.0.1:8080".parse().unwrap());
        assert!(cfg.reset_schema);
    }

    #[test]
    fn rejects_garbage() {
        assert!(config(&[("PORT", "eighty")]).is_err());
        assert!(config(&[("HOST", "localhost:1")]).is_err());
        assert!(config(&[("TODO_RESET_SCHEMA", "maybe")]).is_err());
    }
}
