//! Configuración de la aplicación.
//!
//! Reúne la configuración de las dos fronteras (`DbConfig`, `SourceConfig`)
//! con los ajustes propios del pipeline. Cada comando carga solo lo que usa:
//! `check` no necesita credenciales de la API y `run --dry-run` no necesita
//! base de datos.

use std::collections::BTreeSet;
use std::env;

use ledger_core::constants::DEFAULT_TENANT_TAG;
use ledger_persistence::DbConfig;
use ledger_remote::SourceConfig;

use crate::error::AppError;

/// Ajustes del pipeline por defecto.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Ids de compañías que no se procesan (`EXCLUDED_COMPANY_IDS`).
    pub excluded_company_ids: BTreeSet<String>,
    /// Campo con el que se etiqueta cada registro extraído.
    pub tenant_tag: String,
}

impl Default for PipelineSettings {
    fn default() -> Self { Self { excluded_company_ids: BTreeSet::new(), tenant_tag: DEFAULT_TENANT_TAG.to_string() } }
}

impl PipelineSettings {
    pub fn from_lookup<F>(lookup: F) -> Self
        where F: Fn(&str) -> Option<String>
    {
        let excluded_company_ids = lookup("EXCLUDED_COMPANY_IDS").map(|v| parse_list(&v)).unwrap_or_default();
        let tenant_tag = lookup("LEDGERFLOW_TENANT_TAG").map(|v| v.trim().to_string())
                                                        .filter(|v| !v.is_empty())
                                                        .unwrap_or_else(|| DEFAULT_TENANT_TAG.to_string());
        Self { excluded_company_ids, tenant_tag }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub source: SourceConfig,
    /// `None` cuando la corrida no escribe en Postgres.
    pub database: Option<DbConfig>,
    pub pipeline: PipelineSettings,
}

impl AppConfig {
    pub fn from_env(with_database: bool) -> Result<Self, AppError> {
        ledger_persistence::init_dotenv();
        Self::from_lookup(|k| env::var(k).ok(), with_database)
    }

    pub fn from_lookup<F>(lookup: F, with_database: bool) -> Result<Self, AppError>
        where F: Fn(&str) -> Option<String>
    {
        let source = SourceConfig::from_lookup(&lookup)?;
        let database = if with_database { Some(DbConfig::from_lookup(&lookup)?) } else { None };
        Ok(Self { source, database, pipeline: PipelineSettings::from_lookup(&lookup) })
    }
}

/// Lista separada por comas; ignora vacíos y espacios.
pub fn parse_list(raw: &str) -> BTreeSet<String> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    const SOURCE: &[(&str, &str)] = &[("BC_TENANT_ID", "t"),
                                      ("BC_CLIENT_ID", "c"),
                                      ("BC_CLIENT_SECRET", "s"),
                                      ("BC_ENVIRONMENT", "Production")];

    #[test]
    fn list_parsing_trims_and_skips_blanks() {
        let ids = parse_list(" a, b ,,c ,");
        assert_eq!(ids.into_iter().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert!(parse_list("").is_empty());
    }

    #[test]
    fn pipeline_defaults() {
        let settings = PipelineSettings::from_lookup(|_| None);
        assert_eq!(settings, PipelineSettings::default());
        assert_eq!(settings.tenant_tag, "CompanyId");
    }

    #[test]
    fn dry_run_config_does_not_need_database() {
        let env = vars(SOURCE);
        let cfg = AppConfig::from_lookup(|k| env.get(k).cloned(), false).unwrap();
        assert!(cfg.database.is_none());
        assert_eq!(cfg.source.environment, "Production");
    }

    #[test]
    fn database_is_required_when_requested() {
        let env = vars(SOURCE);
        let err = AppConfig::from_lookup(|k| env.get(k).cloned(), true).unwrap_err();
        assert!(matches!(err, AppError::Database(_)));

        let mut env = vars(SOURCE);
        env.insert("DATABASE_URL".into(), "postgres://u@h/db".into());
        env.insert("EXCLUDED_COMPANY_IDS".into(), "x1,x2".into());
        let cfg = AppConfig::from_lookup(|k| env.get(k).cloned(), true).unwrap();
        assert_eq!(cfg.database.map(|d| d.url), Some("postgres://u@h/db".to_string()));
        assert!(cfg.pipeline.excluded_company_ids.contains("x2"));
    }
}
