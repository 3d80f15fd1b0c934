use std::fs;

use eventcast_core::constants::STREAM_FORMAT_VERSION;
use eventcast_core::{Event, EventId, EventStreamer, Sink, SinkError, StreamEvent};
use eventcast_sinks::{DigestSink, JsonlSink};
use serde_json::{json, Value};
use uuid::Uuid;

fn simple_run() -> Vec<StreamEvent> {
    let mut streamer = EventStreamer::new(Uuid::new_v4());
    let mut out = Vec::new();
    streamer.submit(Event::new(EventId::RunStarted, json!({"cmd": "build"})).with_children(["compile", "test"]),
                    &mut out)
            .unwrap();
    streamer.submit(Event::new("test", json!({"ok": true})).after(["compile"]), &mut out)
            .unwrap();
    streamer.submit(Event::new("compile", json!({"ok": true})), &mut out)
            .unwrap();
    streamer.finish(None, &mut out).unwrap();
    out
}

#[test]
fn jsonl_sink_writes_one_line_per_event() {
    let path = std::env::temp_dir().join(format!("eventcast-{}.jsonl", Uuid::new_v4()));
    let sink = JsonlSink::create(&path).unwrap();
    let events = simple_run();
    for ev in &events {
        sink.accept(ev).unwrap();
    }
    tokio_test::block_on(sink.close()).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), events.len() + 1);
    let header: Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(header["format_version"], json!(STREAM_FORMAT_VERSION));
    let parsed: StreamEvent = serde_json::from_str(lines[1]).unwrap();
    assert_eq!(parsed.id, EventId::RunStarted);
    let last: Value = serde_json::from_str(lines[lines.len() - 1]).unwrap();
    assert_eq!(last["last_message"], json!(true));

    assert_eq!(sink.accept(&events[0]), Err(SinkError::AlreadyClosed));
    let _ = fs::remove_file(&path);
}

#[test]
fn digest_is_stable_across_runs() {
    let first = DigestSink::new();
    let second = DigestSink::new();
    for ev in simple_run() {
        first.accept(&ev).unwrap();
    }
    for ev in simple_run() {
        second.accept(&ev).unwrap();
    }
    assert_eq!(first.digest(), None);
    tokio_test::block_on(first.close()).unwrap();
    tokio_test::block_on(second.close()).unwrap();

    let digest = first.digest().unwrap();
    assert_eq!(digest.len(), 64);
    assert_eq!(Some(digest), second.digest());
    assert_eq!(first.events(), simple_run().len() as u64);
}
