use onboarding::clients::ConnectorInfo;
use onboarding::executors::ConnectorRegistrationExecutor;
use onboarding::stubs::{FakeDapsGateway, FakeSdFactory, InMemoryConnectorDirectory, InMemoryWorklist,
                        ScriptedResponse};
use onboarding::{build_registry, OnboardingService};
use process::domain::{ProcessStepStatus, ProcessTypeId, StepTypeId};
use process::engine::CancellationToken;
use process::errors::ProcessError;
use process::executor::ProcessTypeExecutor;
use process::stubs::InMemoryProcessStore;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

struct World {
  store: Arc<InMemoryProcessStore>,
  directory: Arc<InMemoryConnectorDirectory>,
  daps: Arc<FakeDapsGateway>,
  sd_factory: Arc<FakeSdFactory>,
  service: OnboardingService<InMemoryProcessStore>,
}

fn world(daps_response: ScriptedResponse) -> World {
  let store = Arc::new(InMemoryProcessStore::new());
  let directory = Arc::new(InMemoryConnectorDirectory::new());
  let daps = Arc::new(FakeDapsGateway::new(daps_response));
  let sd_factory = Arc::new(FakeSdFactory::new(ScriptedResponse::Grant));
  let worklist = Arc::new(InMemoryWorklist::new());
  let registry = Arc::new(build_registry(directory.clone(),
                                         daps.clone(),
                                         sd_factory.clone(),
                                         worklist));
  let service = OnboardingService::new(store.clone(), registry);
  World { store,
          directory,
          daps,
          sd_factory,
          service }
}

fn connector(bpn: &str) -> ConnectorInfo {
  ConnectorInfo { connector_id: Uuid::new_v4(),
                  client_id: "connector-01".into(),
                  business_partner_number: bpn.into() }
}

#[test]
fn auth_then_register_completes_with_two_checkpoints() {
  let w = world(ScriptedResponse::Grant);
  let process = w.service
                 .provision_process(ProcessTypeId::ConnectorRegistration, &[StepTypeId::CallAuth])
                 .expect("provision");
  let info = connector("BPNL000000000001");
  w.directory.register(process.id, info.clone());

  let summary = w.service.run(&process.id, &CancellationToken::new()).expect("run");

  assert_eq!(summary.checkpoints, 2);
  assert_eq!(summary.resolved,
             vec![(StepTypeId::CallAuth, ProcessStepStatus::Done),
                  (StepTypeId::StartRegister, ProcessStepStatus::Done)]);
  assert!(w.sd_factory.is_registered(&info.connector_id));
  let steps = w.store.steps_of(&process.id).expect("steps");
  assert_eq!(steps.len(), 2);
  assert!(steps.iter().all(|s| s.status == ProcessStepStatus::Done));
}

#[test]
fn denied_auth_fails_the_step_without_scheduling_registration() {
  let w = world(ScriptedResponse::Deny);
  let process = w.service
                 .provision_process(ProcessTypeId::ConnectorRegistration, &[StepTypeId::CallAuth])
                 .expect("provision");
  w.directory.register(process.id, connector("BPNL000000000002"));

  let summary = w.service.run(&process.id, &CancellationToken::new()).expect("run");

  assert_eq!(summary.resolved, vec![(StepTypeId::CallAuth, ProcessStepStatus::Failed)]);
  let steps = w.store.steps_of(&process.id).expect("steps");
  assert_eq!(steps.len(), 1);
  assert_eq!(steps[0].status, ProcessStepStatus::Failed);
  assert!(steps[0].message.as_deref().unwrap_or("").contains("rechazó"));
}

#[test]
fn transient_daps_failure_leaves_step_todo_and_a_later_run_completes() {
  let w = world(ScriptedResponse::Transient("DAPS no responde".into()));
  let process = w.service
                 .provision_process(ProcessTypeId::ConnectorRegistration, &[StepTypeId::CallAuth])
                 .expect("provision");
  w.directory.register(process.id, connector("BPNL000000000003"));

  let first = w.service.run(&process.id, &CancellationToken::new()).expect("first run");
  assert!(first.resolved.is_empty());
  let steps = w.store.steps_of(&process.id).expect("steps");
  assert_eq!(steps[0].status, ProcessStepStatus::Todo);
  assert!(steps[0].message.as_deref().unwrap_or("").contains("no responde"));

  // the service recovered; the restartable loop picks the step up again
  w.daps.set_response(ScriptedResponse::Grant);
  let second = w.service.run(&process.id, &CancellationToken::new()).expect("second run");
  assert_eq!(second.checkpoints, 2);
  let steps = w.store.steps_of(&process.id).expect("steps");
  assert!(steps.iter()
               .filter(|s| s.step_type == StepTypeId::CallAuth)
               .any(|s| s.status == ProcessStepStatus::Done));
}

#[test]
fn missing_connector_aborts_initialization() {
  let w = world(ScriptedResponse::Grant);
  let process = w.service
                 .provision_process(ProcessTypeId::ConnectorRegistration, &[StepTypeId::CallAuth])
                 .expect("provision");
  // no directory entry for this process

  let err = w.service.run(&process.id, &CancellationToken::new()).expect_err("init must fail");
  assert!(matches!(err, onboarding::OnboardingError::Process(ProcessError::NotFound(_))));
}

#[test]
fn connector_without_bpn_is_a_conflict() {
  let w = world(ScriptedResponse::Grant);
  let process = w.service
                 .provision_process(ProcessTypeId::ConnectorRegistration, &[StepTypeId::CallAuth])
                 .expect("provision");
  w.directory.register(process.id, connector("  "));

  let err = w.service.run(&process.id, &CancellationToken::new()).expect_err("conflict");
  assert!(matches!(err, onboarding::OnboardingError::Process(ProcessError::Conflict(_))));
}

#[test]
fn both_connector_steps_request_the_lock() {
  let w = world(ScriptedResponse::Grant);
  let executor = ConnectorRegistrationExecutor::new(w.directory.clone(), w.daps.clone(), w.sd_factory.clone());
  assert!(executor.is_lock_requested(StepTypeId::CallAuth).expect("own type"));
  assert!(executor.is_lock_requested(StepTypeId::StartRegister).expect("own type"));
  let err = executor.is_lock_requested(StepTypeId::ProcessWorklistItem).expect_err("foreign type");
  assert!(matches!(err, ProcessError::Conflict(_)));
}

#[test]
fn register_step_is_idempotent_across_repeated_execution() {
  // at-least-once: a crash between side effect and checkpoint re-executes
  let w = world(ScriptedResponse::Grant);
  let executor = ConnectorRegistrationExecutor::new(w.directory.clone(), w.daps.clone(), w.sd_factory.clone());
  let connector_id = Uuid::new_v4();
  let context = json!({
    "connector_id": connector_id,
    "client_id": "connector-01",
    "business_partner_number": "BPNL000000000004"
  });
  let token = CancellationToken::new();

  let first = executor.execute_step(&context, StepTypeId::StartRegister, &[], &token).expect("first");
  let second = executor.execute_step(&context, StepTypeId::StartRegister, &[], &token).expect("second");
  assert_eq!(first.status, ProcessStepStatus::Done);
  assert_eq!(second.status, ProcessStepStatus::Done);
  assert!(w.sd_factory.is_registered(&connector_id));
}
