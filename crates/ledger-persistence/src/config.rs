//! Carga de configuración de conexión desde variables de entorno.
//!
//! Acepta `DATABASE_URL` o, en su defecto, los parámetros sueltos
//! `PG_HOST`, `PG_PORT`, `PG_DBNAME`, `PG_USER`, `PG_PASSWORD`.

use std::env;
use std::time::Duration;

use dotenvy::dotenv;
use once_cell::sync::Lazy;
use thiserror::Error;

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {var}: {value}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub url: String,
    pub min_connections: u32,
    pub max_connections: u32,
    pub connect_timeout: Duration,
}

impl DbConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        // asegura que .env se haya cargado
        Lazy::force(&DOTENV_LOADED);
        Self::from_lookup(|k| env::var(k).ok())
    }

    /// Variante testeable: `lookup` resuelve cada variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
        where F: Fn(&str) -> Option<String>
    {
        let url = match lookup("DATABASE_URL").filter(|v| !v.is_empty()) {
            Some(url) => url,
            None => {
                let user = lookup("PG_USER").filter(|v| !v.is_empty())
                                            .ok_or(ConfigError::Missing("PG_USER"))?;
                let password = lookup("PG_PASSWORD").unwrap_or_default();
                let host = lookup("PG_HOST").unwrap_or_else(|| "localhost".to_string());
                let port: u16 = parse_or(&lookup, "PG_PORT", 5432)?;
                let dbname = lookup("PG_DBNAME").unwrap_or_else(|| "postgres".to_string());
                if password.is_empty() {
                    format!("postgres://{user}@{host}:{port}/{dbname}")
                } else {
                    format!("postgres://{user}:{password}@{host}:{port}/{dbname}")
                }
            }
        };
        let min_connections = parse_or(&lookup, "DATABASE_MIN_CONNECTIONS", 2)?;
        let max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 16)?;
        let timeout_secs: u64 = parse_or(&lookup, "DATABASE_CONNECT_TIMEOUT_SECS", 30)?;
        Ok(Self { url, min_connections, max_connections, connect_timeout: Duration::from_secs(timeout_secs) })
    }
}

fn parse_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
    where F: Fn(&str) -> Option<String>,
          T: std::str::FromStr
{
    match lookup(var) {
        None => Ok(default),
        Some(v) if v.trim().is_empty() => Ok(default),
        Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid { var, value: v }),
    }
}

/// Forzar carga temprana de .env desde aplicaciones externas si se desea.
pub fn init_dotenv() { Lazy::force(&DOTENV_LOADED); }

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn database_url_wins() {
        let cfg = DbConfig::from_lookup(lookup(&[("DATABASE_URL", "postgres://u@h/db"), ("PG_USER", "x")])).unwrap();
        assert_eq!(cfg.url, "postgres://u@h/db");
        assert_eq!((cfg.min_connections, cfg.max_connections), (2, 16));
    }

    #[test]
    fn builds_url_from_parts() {
        let cfg = DbConfig::from_lookup(lookup(&[("PG_USER", "etl"), ("PG_PASSWORD", "pw"), ("PG_DBNAME", "bc")])).unwrap();
        assert_eq!(cfg.url, "postgres://etl:pw@localhost:5432/bc");
    }

    #[test]
    fn missing_user_and_bad_numbers() {
        assert_eq!(DbConfig::from_lookup(lookup(&[])), Err(ConfigError::Missing("PG_USER")));
        let err = DbConfig::from_lookup(lookup(&[("DATABASE_URL", "x"), ("DATABASE_MAX_CONNECTIONS", "muchas")]));
        assert!(matches!(err, Err(ConfigError::Invalid { var: "DATABASE_MAX_CONNECTIONS", .. })));
    }
}
