//! Ejecución simulada de un build que ejercita el stream completo: eventos
//! fuera de orden, named sets compartidos, eventos info repetidos, salida
//! capturada y un paso anunciado que nunca llega.
use std::time::Duration;

use eventcast_core::{CapturedOutput, Event, EventId, NamedSet, StreamHandle};
use log::info;
use serde_json::json;

use crate::errors::AppError;

/// Pasos anunciados por el evento de inicio.
pub const STAGES: [&str; 4] = ["fetch", "compile", "test", "package"];

/// Paso que la simulación nunca envía: el stream lo cerrará como abortado.
pub const MISSING_STAGE: &str = "package";

pub async fn simulate_build(handle: &StreamHandle, capture: &CapturedOutput, pause: Duration) -> Result<(), AppError> {
    capture.append_stdout("Loading packages...\n");
    handle.flush_output()?;

    handle.submit(Event::new(EventId::RunStarted, json!({"command": "build", "targets": ["//app:bin"]}))
                  .with_children(STAGES))?;
    handle.submit(Event::info("workspace-status", json!({"rev": "4f2c1a"})))?;

    let headers = NamedSet::leaf(["include/app.h", "include/util.h"]);
    let objects = NamedSet::new(["obj/app.o", "obj/util.o"], vec![headers.clone()]);
    let report = NamedSet::new(["test/report.xml"], vec![headers]);

    // compile depende de fetch, pero llega antes
    handle.submit(Event::new("compile", json!({"actions": 2})).after(["fetch"])
                                                             .referencing(&objects)
                                                             .with_children(["action/cc-app", "action/cc-util"]))?;
    tokio::time::sleep(pause).await;
    capture.append_stdout("Fetching @deps...\n");
    handle.submit(Event::new("fetch", json!({"repositories": 3})))?;

    for action in ["action/cc-app", "action/cc-util"] {
        handle.submit(Event::detail(action, json!({"exit_code": 0})))?;
    }
    tokio::time::sleep(pause).await;
    capture.append_stderr("warning: unused variable `x`\n");

    handle.submit(Event::new("test", json!({"passed": 12, "failed": 0})).after(["compile"])
                                                                        .referencing(&report))?;
    handle.submit(Event::info("workspace-status", json!({"rev": "4f2c1a"})))?;
    info!("simulated build submitted; {MISSING_STAGE} never reports");
    Ok(())
}
