//! Core Controller implementation

use chrono::Utc;
use tracing::{error, info, info_span};
use uuid::Uuid;

use crate::engine::{ControllerBuilder, FlowState, RunReport};
use crate::errors::PipelineError;
use crate::event::{RunEventKind, RunLog};
use crate::logging::IssueCounter;
use crate::model::Context;
use crate::step::{Step, StepRunResult, StepStatus};

/// Orquestador secuencial de steps.
///
/// Ejecuta los steps en el orden dado sobre un único `Context`. El primer
/// `Failure` aborta la corrida (sin rollback de lo ya persistido); los
/// warnings/errores emitidos vía `tracing` se cuentan a través del
/// `IssueCounter` y definen el `ExitStatus` final.
pub struct Controller {
    steps: Vec<Box<dyn Step>>,
    state: FlowState,
    issues: IssueCounter,
}

impl Controller {
    /// Crea un controller listo para correr. Una lista vacía es un error de
    /// configuración.
    pub fn new(steps: Vec<Box<dyn Step>>) -> Result<Self, PipelineError> {
        if steps.is_empty() {
            return Err(PipelineError::EmptyPipeline);
        }
        Ok(Self { steps, state: FlowState::Ready, issues: IssueCounter::new() })
    }

    #[inline]
    pub fn builder() -> ControllerBuilder { ControllerBuilder::new() }

    /// Reemplaza el contador de incidencias. Debe ser el mismo cuyo layer
    /// está registrado en el subscriber de tracing.
    pub fn with_issue_counter(mut self, counter: IssueCounter) -> Self {
        self.issues = counter;
        self
    }

    pub fn state(&self) -> FlowState { self.state }

    pub fn len(&self) -> usize { self.steps.len() }

    pub fn is_empty(&self) -> bool { self.steps.is_empty() }

    pub fn step_ids(&self) -> Vec<&str> { self.steps.iter().map(|s| s.id()).collect() }

    /// Ejecuta el pipeline completo partiendo de `seed`.
    ///
    /// Retorna `Err` solo si el controller no está en `Ready`. El fallo de
    /// un step se reporta en `RunReport::failure` con `state == Failed`.
    pub fn run(&mut self, seed: Context) -> Result<RunReport, PipelineError> {
        if self.state != FlowState::Ready {
            return Err(PipelineError::InvalidState(self.state));
        }
        self.state = FlowState::Running;
        self.issues.reset();

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let span = info_span!("pipeline_run", %run_id);
        let _guard = span.enter();

        let mut ctx = seed;
        let mut log = RunLog::new(run_id);
        let mut statuses: Vec<(String, StepStatus)> =
            self.steps.iter().map(|s| (s.id().to_string(), StepStatus::Pending)).collect();
        let mut failure: Option<PipelineError> = None;

        log.append_kind(RunEventKind::RunStarted { step_count: self.steps.len() });
        info!(steps = self.steps.len(), "pipeline iniciado");

        for (index, step) in self.steps.iter().enumerate() {
            let step_id = step.id().to_string();
            let step_span = info_span!("step", step_index = index, step_id = %step_id, kind = ?step.kind());
            let _step_guard = step_span.enter();

            statuses[index].1 = StepStatus::Running;
            log.append_kind(RunEventKind::StepStarted { step_index: index, step_id: step_id.clone() });
            info!("ejecutando step '{}'", step.name());

            match step.run(&mut ctx) {
                StepRunResult::Success { outputs } => {
                    statuses[index].1 = StepStatus::FinishedOk;
                    info!(outputs = ?outputs, "step finalizado");
                    log.append_kind(RunEventKind::StepFinished { step_index: index, step_id, outputs });
                }
                StepRunResult::Failure { error: step_error } => {
                    statuses[index].1 = StepStatus::Failed;
                    error!(class = step_error.class(), "step '{}' falló: {}", step_id, step_error);
                    log.append_kind(RunEventKind::StepFailed { step_index: index,
                                                               step_id: step_id.clone(),
                                                               error_class: step_error.class().to_string(),
                                                               message: step_error.to_string() });
                    failure = Some(PipelineError::StepFailed { step_index: index,
                                                               step_id,
                                                               kind: step.kind(),
                                                               source: step_error });
                    break;
                }
            }
        }

        for (_, status) in statuses.iter_mut().filter(|(_, s)| *s == StepStatus::Pending) {
            *status = StepStatus::Skipped;
        }

        let issues = self.issues.snapshot();
        match &failure {
            Some(PipelineError::StepFailed { step_id, .. }) => {
                self.state = FlowState::Failed;
                log.append_kind(RunEventKind::RunFailed { step_id: step_id.clone() });
                error!("pipeline abortado. {}", issues.message());
            }
            _ => {
                self.state = FlowState::Completed;
                log.append_kind(RunEventKind::RunCompleted { errors: issues.errors, warnings: issues.warnings });
                info!("pipeline completado. {}", issues.message());
            }
        }

        Ok(RunReport { run_id,
                       state: self.state,
                       context: ctx,
                       issues: self.issues.snapshot(),
                       events: log.into_events(),
                       steps: statuses,
                       failure,
                       started_at,
                       finished_at: Utc::now() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::StepError;
    use crate::step::StepKind;
    use serde_json::json;
    use tracing_subscriber::layer::SubscriberExt;

    struct Put(&'static str);

    impl Step for Put {
        fn id(&self) -> &str { self.0 }
        fn kind(&self) -> StepKind { StepKind::Extract }
        fn run(&self, ctx: &mut Context) -> StepRunResult {
            ctx.insert(self.0, json!(true));
            StepRunResult::wrote(self.0)
        }
    }

    struct Boom;

    impl Step for Boom {
        fn id(&self) -> &str { "boom" }
        fn kind(&self) -> StepKind { StepKind::Store }
        fn run(&self, _ctx: &mut Context) -> StepRunResult {
            StepRunResult::Failure { error: StepError::Connection("db down".into()) }
        }
    }

    #[test]
    fn empty_pipeline_is_rejected() {
        assert_eq!(Controller::new(Vec::new()).err(), Some(PipelineError::EmptyPipeline));
        assert!(Controller::builder().build().is_err());
    }

    #[test]
    fn controller_runs_once() {
        let mut controller = Controller::builder().step(Put("a")).build().unwrap();
        assert_eq!(controller.state(), FlowState::Ready);
        let report = controller.run(Context::new()).unwrap();
        assert_eq!(report.state, FlowState::Completed);
        assert_eq!(controller.run(Context::new()).err(),
                   Some(PipelineError::InvalidState(FlowState::Completed)));
    }

    #[test]
    fn failure_aborts_and_skips_rest() {
        let counter = IssueCounter::new();
        let mut controller = Controller::builder().step(Put("a"))
                                                  .step(Boom)
                                                  .step(Put("c"))
                                                  .issue_counter(counter.clone())
                                                  .build()
                                                  .unwrap();
        let subscriber = tracing_subscriber::registry().with(counter.layer());
        let report = tracing::subscriber::with_default(subscriber, || controller.run(Context::new())).unwrap();

        assert_eq!(report.state, FlowState::Failed);
        assert!(report.context.contains_key("a"));
        assert!(!report.context.contains_key("c"));
        assert_eq!(report.step_status("c"), Some(StepStatus::Skipped));
        assert_eq!(report.exit_status().code(), 1);
        match report.failure {
            Some(PipelineError::StepFailed { step_index, ref step_id, kind, .. }) => {
                assert_eq!(step_index, 1);
                assert_eq!(step_id, "boom");
                assert_eq!(kind, StepKind::Store);
            }
            ref other => panic!("unexpected failure: {other:?}"),
        }
        assert!(report.issues.errors >= 1);
    }
}
