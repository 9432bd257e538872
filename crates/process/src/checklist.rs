// Archivo: checklist.rs
// Propósito: implementar `ChecklistCoordinator`, la capa de conveniencia
// para procesos estilo checklist: validar precondiciones, planificar pasos
// y finalizar una entrada junto con sus pasos bajo una sola unidad
// persistida.
use crate::domain::{ChecklistEntry, ChecklistEntryStatus, ChecklistEntryTypeId, ProcessStep,
                    ProcessStepStatus, StepTypeId};
use crate::errors::{ProcessError, Result};
use crate::store::{ChecklistStore, ProcessStore};
use log::info;
use std::sync::Arc;
use uuid::Uuid;

/// Contexto devuelto por `verify`: identifica el paso `Todo` objetivo y el
/// proceso ligado al subject, con los pasos cargados para deduplicar
/// planificaciones posteriores.
#[derive(Debug, Clone)]
pub struct ChecklistContext {
    pub subject_id: Uuid,
    pub process_id: Uuid,
    pub entry_type: ChecklistEntryTypeId,
    pub step_id: Uuid,
    pub step_type: StepTypeId,
    pub steps: Vec<ProcessStep>,
}

/// Coordinador de checklist sobre el motor de procesos.
///
/// Mantiene la entrada del checklist y el proceso que conduce su compleción
/// sincronizados dentro de una unidad de trabajo persistida: cada operación
/// termina en exactamente un `save_changes`.
pub struct ChecklistCoordinator<S, C>
    where S: ProcessStore,
          C: ChecklistStore
{
    process_store: Arc<S>,
    checklist_store: Arc<C>,
}

impl<S, C> ChecklistCoordinator<S, C>
    where S: ProcessStore,
          C: ChecklistStore
{
    pub fn new(process_store: Arc<S>, checklist_store: Arc<C>) -> Self {
        Self { process_store,
               checklist_store }
    }

    /// Valida las precondiciones de una operación de checklist y devuelve
    /// el contexto en vuelo.
    ///
    /// Falla con `Conflict` si el estado actual de la entrada no está entre
    /// los aceptables, si no existe exactamente una fila `Todo` del tipo de
    /// paso objetivo, o si falta algún tipo de paso prerrequisito en `Todo`.
    /// `NotFound` si el subject no puede resolverse.
    pub fn verify(&self,
                  subject_id: &Uuid,
                  entry_type: ChecklistEntryTypeId,
                  allowed_statuses: &[ChecklistEntryStatus],
                  step_type: StepTypeId,
                  prerequisite_step_types: &[StepTypeId])
                  -> Result<ChecklistContext> {
        let mut wanted: Vec<StepTypeId> = vec![step_type];
        wanted.extend_from_slice(prerequisite_step_types);
        let view = self.checklist_store
                       .load_checklist_and_steps(subject_id, &[entry_type], &wanted)?;

        let status = view.entries
                         .get(&entry_type)
                         .copied()
                         .ok_or_else(|| ProcessError::NotFound(format!("entrada {:?} del subject {}",
                                                                       entry_type, subject_id)))?;
        if !allowed_statuses.contains(&status) {
            return Err(ProcessError::Conflict(format!("la entrada {:?} está en estado {:?}, se esperaba uno de {:?}",
                                                      entry_type, status, allowed_statuses)));
        }

        let todo_ids: Vec<Uuid> = view.steps
                                      .iter()
                                      .filter(|s| s.step_type == step_type && s.status == ProcessStepStatus::Todo)
                                      .map(|s| s.id)
                                      .collect();
        if todo_ids.len() != 1 {
            return Err(ProcessError::Conflict(format!("se esperaba exactamente una fila Todo de {:?}, hay {}",
                                                      step_type,
                                                      todo_ids.len())));
        }

        for prereq in prerequisite_step_types {
            let present = view.steps
                              .iter()
                              .any(|s| s.step_type == *prereq && s.status == ProcessStepStatus::Todo);
            if !present {
                return Err(ProcessError::Conflict(format!("falta el prerrequisito {:?} en estado Todo", prereq)));
            }
        }

        Ok(ChecklistContext { subject_id: *subject_id,
                              process_id: view.process_id,
                              entry_type,
                              step_id: todo_ids[0],
                              step_type,
                              steps: view.steps })
    }

    /// Crea filas `Todo` frescas para los tipos que no tengan ya una fila
    /// pendiente en el contexto. Devuelve las filas creadas.
    pub fn schedule(&self, ctx: &ChecklistContext, step_types: &[StepTypeId]) -> Result<Vec<ProcessStep>> {
        let missing: Vec<StepTypeId> =
            step_types.iter()
                      .copied()
                      .filter(|t| {
                          !ctx.steps
                              .iter()
                              .any(|s| s.step_type == *t && s.status == ProcessStepStatus::Todo)
                      })
                      .collect();
        if missing.is_empty() {
            return Ok(Vec::new());
        }
        self.process_store.create_steps(&ctx.process_id, &missing)
    }

    /// Finaliza la operación verificada: aplica `mutator` a la entrada,
    /// marca el paso verificado como `Done` y — salvo que la mutación deje
    /// la entrada en `Failed` terminal — planifica los tipos siguientes.
    /// Todo como una sola unidad persistida.
    pub fn finalize(&self,
                    ctx: &ChecklistContext,
                    mutator: &dyn Fn(&mut ChecklistEntry),
                    follow_up_step_types: &[StepTypeId])
                    -> Result<ChecklistEntry> {
        let entry = self.checklist_store
                        .update_entry(&ctx.subject_id, ctx.entry_type, mutator)?;
        self.process_store
            .update_step(&ctx.step_id, ProcessStepStatus::Done, None)?;
        if entry.status != ChecklistEntryStatus::Failed {
            self.schedule(ctx, follow_up_step_types)?;
        }
        self.process_store.save_changes()?;
        info!("entrada {:?} del subject {} finalizada en {:?}",
              ctx.entry_type, ctx.subject_id, entry.status);
        Ok(entry)
    }

    /// Clasifica un error capturado durante el trabajo de checklist.
    ///
    /// Recuperable: el paso vuelve a `Todo` con el texto del error como
    /// comentario y la entrada queda en curso. Terminal: paso `Failed` y
    /// entrada `Failed`. Una sola unidad persistida en ambos casos.
    pub fn map_error(&self, ctx: &ChecklistContext, error: &ProcessError) -> Result<()> {
        let text = error.to_string();
        if error.is_recoverable() {
            self.process_store
                .update_step(&ctx.step_id, ProcessStepStatus::Todo, Some(text.clone()))?;
            self.checklist_store.update_entry(&ctx.subject_id, ctx.entry_type, &|e| {
                                     e.comment = Some(text.clone());
                                 })?;
        } else {
            self.process_store
                .update_step(&ctx.step_id, ProcessStepStatus::Failed, Some(text.clone()))?;
            self.checklist_store.update_entry(&ctx.subject_id, ctx.entry_type, &|e| {
                                     e.status = ChecklistEntryStatus::Failed;
                                     e.comment = Some(text.clone());
                                 })?;
        }
        self.process_store.save_changes()
    }

    /// Retrigger explícito de una entrada terminal `Failed`: la resetea a
    /// `ToDo` y planifica una fila `Todo` fresca del tipo dado. Es la única
    /// vía para sobrescribir una entrada terminal.
    pub fn retrigger(&self,
                     subject_id: &Uuid,
                     entry_type: ChecklistEntryTypeId,
                     step_type: StepTypeId)
                     -> Result<ProcessStep> {
        let view = self.checklist_store
                       .load_checklist_and_steps(subject_id, &[entry_type], &[step_type])?;
        let status = view.entries
                         .get(&entry_type)
                         .copied()
                         .ok_or_else(|| ProcessError::NotFound(format!("entrada {:?} del subject {}",
                                                                       entry_type, subject_id)))?;
        if status != ChecklistEntryStatus::Failed {
            return Err(ProcessError::Conflict(format!("sólo una entrada Failed puede retriggerse, está en {:?}",
                                                      status)));
        }
        self.checklist_store.update_entry(subject_id, entry_type, &|e| {
                                 e.status = ChecklistEntryStatus::ToDo;
                                 e.comment = None;
                             })?;
        let mut created = self.process_store.create_steps(&view.process_id, &[step_type])?;
        self.process_store.save_changes()?;
        created.pop()
               .ok_or_else(|| ProcessError::Storage("create_steps no devolvió la fila creada".into()))
    }
}
