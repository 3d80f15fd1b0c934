//! Demo: lanza el stream con los sinks configurados, simula un build y
//! muestra el resumen.
use std::sync::Arc;
use std::time::Duration;

use eventcast::pipeline::simulate_build;
use eventcast::{AppError, CONFIG};
use eventcast_core::{CapturedOutput, EventStream};
use eventcast_sinks::{DigestSink, JsonlSink, MemorySink};
use log::info;
use serde_json::json;
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let filter = EnvFilter::try_from_env("EVENTCAST_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_target(false).try_init();
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    init_logging();
    let config = &*CONFIG;
    info!("configuration: {}", serde_json::to_string(config)?);

    let memory = Arc::new(MemorySink::new("memory"));
    let digest = Arc::new(DigestSink::new());
    let capture = Arc::new(CapturedOutput::new());
    let mut builder = EventStream::builder().options(config.stream_options())
                                            .sink(memory.clone())
                                            .sink(digest.clone())
                                            .output_capture(capture.clone());
    if let Some(path) = &config.jsonl_path {
        builder = builder.sink(Arc::new(JsonlSink::create(path)?));
    }
    let handle = builder.spawn();

    simulate_build(&handle, &capture, Duration::from_millis(50)).await?;
    let summary = handle.complete().await?;

    for event in memory.events() {
        println!("{:>3} {:<28} {}{}",
                 event.seq,
                 event.id.to_string(),
                 event.kind.variant_name(),
                 if event.last_message { " (last)" } else { "" });
    }
    let report = json!({
        "summary": summary,
        "digest": digest.digest(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
