use process::domain::{ProcessStepStatus, ProcessTypeId, StepTypeId};
use process::errors::ProcessError;
use process::store::ProcessStore;
use process::stubs::InMemoryProcessStore;
use uuid::Uuid;

#[test]
fn load_step_data_of_unknown_process_is_not_found() {
  let store = InMemoryProcessStore::new();
  let err = store.load_step_data(&Uuid::new_v4()).expect_err("must fail");
  assert!(matches!(err, ProcessError::NotFound(_)));
}

#[test]
fn writes_stay_buffered_until_save_changes() {
  let store = InMemoryProcessStore::new();
  let process = store.create_process(ProcessTypeId::ApplicationChecklist).expect("create process");

  let created = store.create_steps(&process.id, &[StepTypeId::VerifyRegistration]).expect("create steps");
  assert_eq!(created.len(), 1);
  // not visible before save
  assert!(store.steps_of(&process.id).expect("steps_of").is_empty());
  let data = store.load_step_data(&process.id).expect("load");
  assert!(data.steps_by_type.is_empty());

  store.save_changes().expect("save");
  assert_eq!(store.save_count(), 1);
  let steps = store.steps_of(&process.id).expect("steps_of");
  assert_eq!(steps.len(), 1);
  assert_eq!(steps[0].status, ProcessStepStatus::Todo);
}

#[test]
fn update_step_is_buffered_and_applied_in_order() {
  let store = InMemoryProcessStore::new();
  let process = store.create_process(ProcessTypeId::ApplicationChecklist).expect("create process");
  let created = store.create_steps(&process.id, &[StepTypeId::StartClearinghouse]).expect("create steps");
  store.save_changes().expect("save");

  store.update_step(&created[0].id, ProcessStepStatus::Done, Some("ok".into()))
       .expect("update");
  // committed view still Todo until save
  assert_eq!(store.steps_of(&process.id).expect("steps_of")[0].status, ProcessStepStatus::Todo);

  store.save_changes().expect("save");
  let steps = store.steps_of(&process.id).expect("steps_of");
  assert_eq!(steps[0].status, ProcessStepStatus::Done);
  assert_eq!(steps[0].message.as_deref(), Some("ok"));
  assert_eq!(store.save_count(), 2);
}

#[test]
fn update_of_pending_create_in_same_unit_works() {
  // the engine updates rows it created earlier in the same run
  let store = InMemoryProcessStore::new();
  let process = store.create_process(ProcessTypeId::ApplicationChecklist).expect("create process");
  let created = store.create_steps(&process.id, &[StepTypeId::CreateIdentityWallet]).expect("create steps");
  store.update_step(&created[0].id, ProcessStepStatus::Skipped, None).expect("update pending");
  store.save_changes().expect("save");
  assert_eq!(store.steps_of(&process.id).expect("steps_of")[0].status,
             ProcessStepStatus::Skipped);
}

#[test]
fn update_unknown_step_is_not_found() {
  let store = InMemoryProcessStore::new();
  let err = store.update_step(&Uuid::new_v4(), ProcessStepStatus::Done, None)
                 .expect_err("must fail");
  assert!(matches!(err, ProcessError::NotFound(_)));
}

#[test]
fn load_step_data_groups_only_todo_rows() {
  let store = InMemoryProcessStore::new();
  let process = store.create_process(ProcessTypeId::ApplicationChecklist).expect("create process");
  let created = store.create_steps(&process.id,
                                   &[StepTypeId::VerifyRegistration, StepTypeId::StartClearinghouse])
                     .expect("create steps");
  store.save_changes().expect("save");
  store.update_step(&created[0].id, ProcessStepStatus::Done, None).expect("update");
  store.save_changes().expect("save");

  let data = store.load_step_data(&process.id).expect("load");
  assert!(!data.steps_by_type.contains_key(&StepTypeId::VerifyRegistration));
  assert_eq!(data.steps_by_type[&StepTypeId::StartClearinghouse], vec![created[1].id]);
}
