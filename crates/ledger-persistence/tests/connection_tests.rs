//! Pruebas básicas de configuración y pool (requiere DATABASE_URL válido en entorno).

use ledger_core::RelationalStore;
use ledger_persistence::{build_pool, build_pool_from_config, DbConfig, PgStore};

#[test]
fn create_pool_from_env() {
    if std::env::var("DATABASE_URL").is_err() { eprintln!("DATABASE_URL no definido: omitiendo test"); return; }
    let cfg = DbConfig::from_env().expect("config");
    let pool = build_pool(&cfg.url, cfg.min_connections, cfg.max_connections).expect("pool");
    let mut conn = pool.get().expect("conn");
    // Sonda trivial de validez
    use diesel::connection::SimpleConnection;
    conn.batch_execute("SELECT 1;").expect("select 1");
}

#[test]
fn store_connectivity_check() {
    if std::env::var("DATABASE_URL").is_err() { eprintln!("DATABASE_URL no definido: omitiendo test"); return; }
    let cfg = DbConfig::from_env().expect("config");
    let store = PgStore::from_pool(build_pool_from_config(&cfg).expect("pool"));
    store.check_connectivity().expect("SELECT 1");
}

#[test]
fn unreachable_database_is_a_connection_error() {
    let cfg = DbConfig::from_lookup(|k| match k {
                  "DATABASE_URL" => Some("postgres://nobody@127.0.0.1:1/none".to_string()),
                  "DATABASE_CONNECT_TIMEOUT_SECS" => Some("1".to_string()),
                  _ => None,
              }).expect("config");
    let err = build_pool_from_config(&cfg).err().expect("pool must fail");
    assert!(ledger_core::StoreError::from(err).is_connection());
}
