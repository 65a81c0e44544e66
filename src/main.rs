use std::process::ExitCode;
use std::rc::Rc;

use clap::{Parser, Subcommand};
use ledger_core::{init_tracing, InMemoryStore, IssueCounter, RelationalStore, RemoteSource, RunReport};
use ledger_persistence::{DbConfig, PgStore};
use ledger_remote::BcClient;
use ledgerflow::{execute, profile_report, AppConfig, AppError};
use tracing::{error, info};

/// ETL multi-compañía: API contable -> Postgres.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Corre el pipeline completo una vez.
    Run {
        /// Limita la parte por compañía a estos datasets (repetible).
        #[arg(long = "dataset", value_name = "NAME")]
        datasets: Vec<String>,
        /// Escribe en un almacén en memoria en vez de Postgres.
        #[arg(long)]
        dry_run: bool,
    },
    /// Verifica la conexión con la base de datos.
    Check,
    /// Perfil por columna de tablas persistidas, como JSON por stdout.
    Profile {
        /// Tabla a perfilar (repetible); sin tablas, todas.
        #[arg(long = "table", value_name = "NAME")]
        tables: Vec<String>,
        /// Lee como máximo N filas por tabla.
        #[arg(long, value_name = "N")]
        sample: Option<usize>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let counter = IssueCounter::new();
    if let Err(e) = init_tracing(&counter, "info") {
        eprintln!("[ledgerflow] no se pudo inicializar el logging: {e}");
        return ExitCode::from(1);
    }

    let outcome = match cli.command {
        Command::Run { datasets, dry_run } => run(&datasets, dry_run, &counter),
        Command::Check => check(),
        Command::Profile { tables, sample } => profile(&tables, sample),
    };
    match outcome {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("{e}");
            ExitCode::from(1)
        }
    }
}

fn run(datasets: &[String], dry_run: bool, counter: &IssueCounter) -> Result<u8, AppError> {
    let config = AppConfig::from_env(!dry_run)?;
    info!(source = ?config.source, dry_run, "configuración cargada");

    let source: Rc<dyn RemoteSource> = Rc::new(BcClient::new(config.source.clone())?);
    let memory = Rc::new(InMemoryStore::new());
    let store: Rc<dyn RelationalStore> = match &config.database {
        Some(db) => Rc::new(PgStore::from_config(db)?),
        None => memory.clone() as Rc<dyn RelationalStore>,
    };

    let report = execute(&config.pipeline, source, store, datasets, counter)?;
    if dry_run {
        for table in memory.table_names() {
            info!(table = %table, rows = memory.row_count(&table), "dry-run: filas en memoria");
        }
    }
    log_summary(&report);
    Ok(report.exit_status().code())
}

fn check() -> Result<u8, AppError> {
    let db = DbConfig::from_env()?;
    let store = PgStore::from_config(&db)?;
    match store.check_connectivity() {
        Ok(()) => {
            info!("conexión con la base de datos OK");
            Ok(0)
        }
        Err(e) => {
            error!(error = %e, "no se pudo conectar con la base de datos");
            Ok(1)
        }
    }
}

fn profile(tables: &[String], sample: Option<usize>) -> Result<u8, AppError> {
    let db = DbConfig::from_env()?;
    let store = PgStore::from_config(&db)?;
    let report = profile_report(&store, tables, sample)?;
    println!("{report}");
    Ok(0)
}

fn log_summary(report: &RunReport) {
    let elapsed = report.finished_at - report.started_at;
    for (step_id, status) in &report.steps {
        info!(step_id = %step_id, status = ?status, "estado final");
    }
    match &report.failure {
        Some(failure) => error!(run_id = %report.run_id, ms = elapsed.num_milliseconds(), "corrida fallida: {failure}"),
        None => info!(run_id = %report.run_id,
                      ms = elapsed.num_milliseconds(),
                      exit_code = report.exit_status().code(),
                      "{}",
                      report.issues.message()),
    }
}
