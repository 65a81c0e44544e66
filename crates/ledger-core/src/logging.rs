//! Inicialización de tracing y contador de incidencias.
//!
//! El `IssueCounterLayer` se registra sin filtro: cuenta todo `warn!` y
//! `error!` emitido durante la corrida aunque el `EnvFilter` del layer de
//! salida los oculte.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context as LayerContext, SubscriberExt};
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, Layer};

use crate::engine::ExitStatus;

#[derive(Debug, Default)]
struct Counts {
    errors: AtomicUsize,
    warnings: AtomicUsize,
}

/// Contador compartido de warnings y errores.
///
/// Clonar el contador comparte los mismos totales; el layer obtenido con
/// `layer()` escribe sobre ellos.
#[derive(Debug, Clone, Default)]
pub struct IssueCounter {
    counts: Arc<Counts>,
}

impl IssueCounter {
    pub fn new() -> Self { Self::default() }

    /// Layer de `tracing_subscriber` que alimenta este contador.
    pub fn layer(&self) -> IssueCounterLayer { IssueCounterLayer { counts: Arc::clone(&self.counts) } }

    pub fn reset(&self) {
        self.counts.errors.store(0, Ordering::SeqCst);
        self.counts.warnings.store(0, Ordering::SeqCst);
    }

    pub fn errors(&self) -> usize { self.counts.errors.load(Ordering::SeqCst) }

    pub fn warnings(&self) -> usize { self.counts.warnings.load(Ordering::SeqCst) }

    pub fn snapshot(&self) -> IssueSummary { IssueSummary { errors: self.errors(), warnings: self.warnings() } }
}

pub struct IssueCounterLayer {
    counts: Arc<Counts>,
}

impl<S: Subscriber> Layer<S> for IssueCounterLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: LayerContext<'_, S>) {
        let level = *event.metadata().level();
        if level == Level::ERROR {
            self.counts.errors.fetch_add(1, Ordering::SeqCst);
        } else if level == Level::WARN {
            self.counts.warnings.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Totales de incidencias de una corrida.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueSummary {
    pub errors: usize,
    pub warnings: usize,
}

impl IssueSummary {
    pub fn has_errors(&self) -> bool { self.errors > 0 }

    pub fn has_warnings(&self) -> bool { self.warnings > 0 }

    pub fn exit_status(&self) -> ExitStatus {
        if self.has_errors() {
            ExitStatus::Failed
        } else if self.has_warnings() {
            ExitStatus::Degraded
        } else {
            ExitStatus::Clean
        }
    }

    /// Resumen legible para el cierre de la corrida.
    pub fn message(&self) -> String {
        if !self.has_errors() && !self.has_warnings() {
            return "Sin errores ni warnings registrados.".to_string();
        }
        format!("Resumen: {} ERROR(s), {} WARNING(s).", self.errors, self.warnings)
    }
}

/// Instala el subscriber global: salida `fmt` a stderr filtrada por
/// `RUST_LOG` (o `default_filter`) más el contador de incidencias sin
/// filtrar. Stdout queda libre para los reportes de la CLI.
pub fn init_tracing(counter: &IssueCounter, default_filter: &str) -> Result<(), TryInitError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true)
                                                    .with_writer(std::io::stderr)
                                                    .with_filter(env_filter);

    tracing_subscriber::registry().with(fmt_layer)
                                  .with(counter.layer())
                                  .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::{error, info, warn};

    #[test]
    fn counts_warnings_and_errors_only() {
        let counter = IssueCounter::new();
        let subscriber = tracing_subscriber::registry().with(counter.layer());
        tracing::subscriber::with_default(subscriber, || {
            info!("ignorado");
            warn!("uno");
            warn!("dos");
            error!("tres");
        });
        assert_eq!(counter.snapshot(), IssueSummary { errors: 1, warnings: 2 });
        counter.reset();
        assert_eq!(counter.snapshot(), IssueSummary::default());
    }

    #[test]
    fn exit_status_precedence() {
        assert_eq!(IssueSummary { errors: 0, warnings: 0 }.exit_status(), ExitStatus::Clean);
        assert_eq!(IssueSummary { errors: 0, warnings: 3 }.exit_status(), ExitStatus::Degraded);
        assert_eq!(IssueSummary { errors: 1, warnings: 3 }.exit_status(), ExitStatus::Failed);
        assert_eq!(IssueSummary::default().message(), "Sin errores ni warnings registrados.");
        assert_eq!(IssueSummary { errors: 2, warnings: 1 }.message(), "Resumen: 2 ERROR(s), 1 WARNING(s).");
    }
}
