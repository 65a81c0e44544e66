//! Corridas completas del Controller con steps mínimos.

use ledger_core::{Context, Controller, ExitStatus, FlowState, IssueCounter, RunEventKind, Step, StepKind,
                  StepRunResult};
use serde_json::json;
use tracing::warn;
use tracing_subscriber::layer::SubscriberExt;

struct Seed;

impl Step for Seed {
    fn id(&self) -> &str { "seed" }
    fn kind(&self) -> StepKind { StepKind::Extract }
    fn run(&self, ctx: &mut Context) -> StepRunResult {
        ctx.insert("rows", json!({"value": [{"id": 1}]}));
        StepRunResult::wrote("rows")
    }
}

struct Reads;

impl Step for Reads {
    fn id(&self) -> &str { "reads" }
    fn kind(&self) -> StepKind { StepKind::Transform }
    fn run(&self, ctx: &mut Context) -> StepRunResult {
        let n = ctx.collection("rows").ok().flatten().map_or(0, |c| c.len());
        ctx.insert("count", json!(n));
        StepRunResult::wrote("count")
    }
}

struct Warns;

impl Step for Warns {
    fn id(&self) -> &str { "warns" }
    fn kind(&self) -> StepKind { StepKind::Checkpoint }
    fn run(&self, _ctx: &mut Context) -> StepRunResult {
        warn!("dato degradado");
        StepRunResult::done()
    }
}

fn run_with_counter(mut controller: Controller, counter: &IssueCounter) -> ledger_core::RunReport {
    let subscriber = tracing_subscriber::registry().with(counter.layer());
    tracing::subscriber::with_default(subscriber, || controller.run(Context::new())).expect("run")
}

#[test]
fn later_steps_see_earlier_writes() {
    let counter = IssueCounter::new();
    let controller = Controller::builder().step(Seed).step(Reads).issue_counter(counter.clone()).build().unwrap();
    let report = run_with_counter(controller, &counter);

    assert_eq!(report.state, FlowState::Completed);
    assert_eq!(report.context.get("count"), Some(&json!(1)));
    assert_eq!(report.exit_status(), ExitStatus::Clean);
    assert_eq!(report.exit_status().code(), 0);
}

#[test]
fn warnings_only_yield_degraded_exit() {
    let counter = IssueCounter::new();
    let controller = Controller::builder().step(Seed).step(Warns).issue_counter(counter.clone()).build().unwrap();
    let report = run_with_counter(controller, &counter);

    assert_eq!(report.state, FlowState::Completed);
    assert_eq!(report.issues.warnings, 1);
    assert_eq!(report.exit_status().code(), 2);
}

#[test]
fn events_are_ordered() {
    let counter = IssueCounter::new();
    let controller = Controller::builder().step(Seed).step(Reads).issue_counter(counter.clone()).build().unwrap();
    let report = run_with_counter(controller, &counter);

    let seqs: Vec<u64> = report.events.iter().map(|e| e.seq).collect();
    assert_eq!(seqs, (0..report.events.len() as u64).collect::<Vec<_>>());
    assert!(matches!(report.events.first().map(|e| &e.kind), Some(RunEventKind::RunStarted { step_count: 2 })));
    assert!(matches!(report.events.last().map(|e| &e.kind), Some(RunEventKind::RunCompleted { errors: 0, .. })));
    assert!(report.events.iter().all(|e| e.run_id == report.run_id));
}
