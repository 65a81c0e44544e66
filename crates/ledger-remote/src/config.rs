//! Configuración del cliente desde variables de entorno (`BC_*`).

use std::env;
use std::time::Duration;

use dotenvy::dotenv;
use once_cell::sync::Lazy;

use crate::error::RemoteError;

static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv();
});

pub const DEFAULT_API_BASE: &str = "https://api.businesscentral.dynamics.com/v2.0";
pub const DEFAULT_SCOPE: &str = "https://api.businesscentral.dynamics.com/.default";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Clone, PartialEq, Eq)]
pub struct SourceConfig {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub environment: String,
    pub scope: String,
    pub api_base: String,
    pub token_url: String,
    pub timeout: Duration,
}

// El secreto no se imprime en logs.
impl std::fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceConfig")
         .field("tenant_id", &self.tenant_id)
         .field("client_id", &self.client_id)
         .field("client_secret", &"***")
         .field("environment", &self.environment)
         .field("api_base", &self.api_base)
         .field("timeout", &self.timeout)
         .finish()
    }
}

impl SourceConfig {
    pub fn from_env() -> Result<Self, RemoteError> {
        Lazy::force(&DOTENV_LOADED);
        Self::from_lookup(|k| env::var(k).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, RemoteError>
        where F: Fn(&str) -> Option<String>
    {
        let required = |var: &'static str| {
            lookup(var).filter(|v| !v.trim().is_empty())
                       .ok_or(RemoteError::MissingConfig(var))
        };
        let tenant_id = required("BC_TENANT_ID")?;
        let client_id = required("BC_CLIENT_ID")?;
        let client_secret = required("BC_CLIENT_SECRET")?;
        let environment = required("BC_ENVIRONMENT")?;
        let scope = lookup("BC_SCOPE").unwrap_or_else(|| DEFAULT_SCOPE.to_string());
        let api_base = lookup("BC_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string())
                                            .trim_end_matches('/')
                                            .to_string();
        let token_url = lookup("BC_TOKEN_URL")
            .unwrap_or_else(|| format!("https://login.microsoftonline.com/{tenant_id}/oauth2/v2.0/token"));
        let timeout_secs = match lookup("BC_TIMEOUT_SECS") {
            None => DEFAULT_TIMEOUT_SECS,
            Some(v) => v.trim().parse().map_err(|_| RemoteError::InvalidConfig { var: "BC_TIMEOUT_SECS", value: v })?,
        };
        Ok(Self { tenant_id,
                  client_id,
                  client_secret,
                  environment,
                  scope,
                  api_base,
                  token_url,
                  timeout: Duration::from_secs(timeout_secs) })
    }

    /// Raíz de la API para el tenant de Azure y entorno configurados.
    pub fn environment_root(&self) -> String { format!("{}/{}/{}", self.api_base, self.tenant_id, self.environment) }
}
