//! Constantes compartidas del motor.

/// Clave del envelope de colecciones (`{"value": [...]}`).
pub const ENVELOPE_KEY: &str = "value";

/// Clave de contexto donde vive el registro de compañías (tenants).
pub const COMPANIES_KEY: &str = "companies";

/// Campo con el que el fan-out etiqueta cada registro.
pub const DEFAULT_TENANT_TAG: &str = "CompanyId";

/// Campo identificador de un tenant dentro del registro.
pub const TENANT_ID_FIELD: &str = "id";

/// Campo con el nombre visible de un tenant.
pub const TENANT_NAME_FIELD: &str = "name";
