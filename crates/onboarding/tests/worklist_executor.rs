use onboarding::clients::WorklistItem;
use onboarding::stubs::{FakeDapsGateway, FakeSdFactory, InMemoryConnectorDirectory, InMemoryWorklist,
                        ScriptedResponse};
use onboarding::{build_registry, OnboardingService};
use process::domain::{ProcessStepStatus, ProcessTypeId, StepTypeId};
use process::engine::CancellationToken;
use process::store::ProcessStore;
use process::stubs::InMemoryProcessStore;
use std::sync::Arc;
use uuid::Uuid;

fn world() -> (Arc<InMemoryProcessStore>, Arc<InMemoryWorklist>, OnboardingService<InMemoryProcessStore>) {
  let store = Arc::new(InMemoryProcessStore::new());
  let directory = Arc::new(InMemoryConnectorDirectory::new());
  let daps = Arc::new(FakeDapsGateway::new(ScriptedResponse::Grant));
  let sd_factory = Arc::new(FakeSdFactory::new(ScriptedResponse::Grant));
  let worklist = Arc::new(InMemoryWorklist::new());
  let registry = Arc::new(build_registry(directory, daps, sd_factory, worklist.clone()));
  let service = OnboardingService::new(store.clone(), registry);
  (store, worklist, service)
}

fn item(n: usize) -> WorklistItem {
  WorklistItem { id: Uuid::new_v4(),
                 business_partner_number: format!("BPNL-{:04}", n) }
}

#[test]
fn drains_all_pending_items_one_per_step() {
  let (store, worklist, service) = world();
  for n in 0..3 {
    worklist.push(item(n));
  }
  let process = service.provision_process(ProcessTypeId::ClearinghouseWorklist,
                                          &[StepTypeId::ProcessWorklistItem])
                       .expect("provision");

  let summary = service.run(&process.id, &CancellationToken::new()).expect("run");

  assert_eq!(worklist.resolved_count(), 3);
  // three item steps plus the final empty-worklist step
  assert_eq!(summary.checkpoints, 4);
  let steps = store.steps_of(&process.id).expect("steps");
  assert_eq!(steps.len(), 4);
  assert!(steps.iter().all(|s| s.status == ProcessStepStatus::Done));
}

#[test]
fn empty_worklist_terminates_after_a_single_step() {
  let (store, _worklist, service) = world();
  let process = service.provision_process(ProcessTypeId::ClearinghouseWorklist,
                                          &[StepTypeId::ProcessWorklistItem])
                       .expect("provision");

  let summary = service.run(&process.id, &CancellationToken::new()).expect("run");

  assert_eq!(summary.checkpoints, 1);
  let steps = store.steps_of(&process.id).expect("steps");
  assert_eq!(steps.len(), 1);
  assert_eq!(steps[0].status, ProcessStepStatus::Done);
  assert_eq!(steps[0].message.as_deref(), Some("worklist vacía"));
}

#[test]
fn initialize_schedules_the_drain_step_when_missing() {
  let (store, worklist, service) = world();
  worklist.push(item(0));
  // a bare process without its drain step: initialize must schedule it
  let process = store.create_process(ProcessTypeId::ClearinghouseWorklist).expect("create");
  store.save_changes().expect("save");

  let summary = service.run(&process.id, &CancellationToken::new()).expect("run");

  assert_eq!(worklist.resolved_count(), 1);
  // checkpoint for the init merge, then one per executed step
  assert_eq!(summary.checkpoints, 3);
}

#[test]
fn provisioning_without_initial_steps_is_a_validation_error() {
  let (_store, _worklist, service) = world();
  let err = service.provision_process(ProcessTypeId::ClearinghouseWorklist, &[])
                   .expect_err("needs a step");
  assert!(matches!(err, onboarding::OnboardingError::Validation(_)));
}
