use onboarding::clients::{ConnectorInfo, WorklistItem};
use onboarding::stubs::{FakeDapsGateway, FakeSdFactory, InMemoryConnectorDirectory, InMemoryWorklist,
                        ScriptedResponse};
use onboarding::{build_registry, OnboardingService};
use process::engine::CancellationToken;
use process::lock::OptimisticLock;
use process::stubs::InMemoryProcessStore;
use process::{ProcessTypeId, StepTypeId};
use std::collections::HashMap;
use std::error::Error;
use std::io::{self, Write};
use std::sync::Arc;
use uuid::Uuid;

/// Pequeño menú interactivo para administrar procesos del portal usando el
/// almacenamiento en memoria y los gateways fake.
///
/// Opciones soportadas:
/// 1) Crear proceso de registro de conector
/// 2) Crear proceso de worklist (con items de ejemplo)
/// 3) Correr un proceso
/// 4) Ver pasos de un proceso
/// 5) Salir
fn main() -> Result<(), Box<dyn Error>> {
    let store = Arc::new(InMemoryProcessStore::new());
    let directory = Arc::new(InMemoryConnectorDirectory::new());
    let daps = Arc::new(FakeDapsGateway::new(ScriptedResponse::Grant));
    let sd_factory = Arc::new(FakeSdFactory::new(ScriptedResponse::Grant));
    let worklist = Arc::new(InMemoryWorklist::new());
    let registry = Arc::new(build_registry(directory.clone(), daps, sd_factory, worklist.clone()));
    let service = OnboardingService::new(store.clone(), registry);

    // Lock optimista por proceso de conector: el caller lo adquiere antes de
    // correr pasos que lo solicitan (is_lock_requested) y lo libera después.
    let mut locks: HashMap<Uuid, OptimisticLock> = HashMap::new();

    loop {
        println!("\n== Portal process menu ==");
        println!("1) Crear proceso de registro de conector");
        println!("2) Crear proceso de worklist (con items de ejemplo)");
        println!("3) Correr un proceso");
        println!("4) Ver pasos de un proceso");
        println!("5) Salir");
        print!("Elige una opción: ");
        io::stdout().flush().ok();

        let mut choice = String::new();
        io::stdin().read_line(&mut choice)?;
        match choice.trim() {
            "1" => {
                let client_id = prompt("Client id del conector: ")?;
                let bpn = prompt("Business partner number: ")?;
                match service.provision_process(ProcessTypeId::ConnectorRegistration, &[StepTypeId::CallAuth]) {
                    Ok(p) => {
                        directory.register(p.id,
                                           ConnectorInfo { connector_id: Uuid::new_v4(),
                                                           client_id: client_id.trim().to_string(),
                                                           business_partner_number: bpn.trim().to_string() });
                        locks.insert(p.id, OptimisticLock::new());
                        println!("Proceso creado: {}", p.id);
                    }
                    Err(e) => eprintln!("Error creando proceso: {}", e),
                }
            }
            "2" => {
                let n_s = prompt("Número de items de ejemplo: ")?;
                let n: usize = match n_s.trim().parse() {
                    Ok(n) => n,
                    Err(_) => { eprintln!("Número inválido"); continue; }
                };
                for i in 0..n {
                    worklist.push(WorklistItem { id: Uuid::new_v4(),
                                                 business_partner_number: format!("BPNL-{:04}", i) });
                }
                match service.provision_process(ProcessTypeId::ClearinghouseWorklist,
                                                &[StepTypeId::ProcessWorklistItem]) {
                    Ok(p) => println!("Proceso creado: {}", p.id),
                    Err(e) => eprintln!("Error creando proceso: {}", e),
                }
            }
            "3" => {
                let id_s = prompt("Process id (UUID): ")?;
                let pid = match Uuid::parse_str(id_s.trim()) {
                    Ok(u) => u,
                    Err(_) => { eprintln!("UUID inválido"); continue; }
                };
                // Si el proceso tiene lock asociado, adquirirlo (fail-closed)
                // antes de correr y liberarlo al terminar.
                let mut locked = false;
                if let Some(lock) = locks.get_mut(&pid) {
                    let until = chrono::Utc::now() + chrono::Duration::minutes(5);
                    if !lock.try_lock(until) {
                        eprintln!("Recurso bloqueado por otro worker; reintente más tarde");
                        continue;
                    }
                    locked = true;
                }
                let token = CancellationToken::new();
                match service.run(&pid, &token) {
                    Ok(summary) => {
                        println!("Corrida terminada: {} checkpoints", summary.checkpoints);
                        for (t, s) in &summary.resolved {
                            println!("  {:?} -> {:?}", t, s);
                        }
                    }
                    Err(e) => eprintln!("Error corriendo proceso: {}", e),
                }
                if locked {
                    if let Some(lock) = locks.get_mut(&pid) {
                        lock.release();
                    }
                }
            }
            "4" => {
                let id_s = prompt("Process id (UUID): ")?;
                let pid = match Uuid::parse_str(id_s.trim()) {
                    Ok(u) => u,
                    Err(_) => { eprintln!("UUID inválido"); continue; }
                };
                match store.steps_of(&pid) {
                    Ok(steps) if steps.is_empty() => println!("Sin pasos para {}", pid),
                    Ok(steps) => {
                        println!("\nID                                   | TIPO                   | ESTADO    | MENSAJE");
                        println!("----------------------------------------------------------------------------------------");
                        for s in steps {
                            println!("{} | {:<22} | {:<9} | {}",
                                     s.id,
                                     format!("{:?}", s.step_type),
                                     format!("{:?}", s.status),
                                     s.message.unwrap_or_else(|| "-".into()));
                        }
                    }
                    Err(e) => eprintln!("Error listando pasos: {}", e),
                }
            }
            "5" => {
                println!("Saliendo...");
                break;
            }
            other => {
                println!("Opción inválida: {}", other);
            }
        }
    }

    Ok(())
}

fn prompt(msg: &str) -> io::Result<String> {
    print!("{}", msg);
    io::stdout().flush()?;
    let mut s = String::new();
    io::stdin().read_line(&mut s)?;
    Ok(s)
}
