use eventcast_core::{Event, EventId, EventKind, EventStreamer, StreamEvent};
use serde_json::{json, Value};
use uuid::Uuid;

fn ids(events: &[StreamEvent]) -> Vec<EventId> {
    events.iter().map(|e| e.id.clone()).collect()
}

fn position(events: &[StreamEvent], id: &EventId) -> usize {
    events.iter()
          .position(|e| &e.id == id)
          .unwrap_or_else(|| panic!("{id} was not delivered"))
}

/// Todas las permutaciones de `items` (algoritmo de Heap).
fn permutations<T: Clone>(items: Vec<T>) -> Vec<Vec<T>> {
    fn heap<T: Clone>(k: usize, items: &mut Vec<T>, acc: &mut Vec<Vec<T>>) {
        if k <= 1 {
            acc.push(items.clone());
            return;
        }
        for i in 0..k {
            heap(k - 1, items, acc);
            let j = if k % 2 == 0 { i } else { 0 };
            items.swap(j, k - 1);
        }
    }
    let mut items = items;
    let mut acc = Vec::new();
    let n = items.len();
    heap(n, &mut items, &mut acc);
    acc
}

#[test]
fn announced_children_complete_after_out_of_order_prerequisite() {
    // R anuncia X e Y; Y llega primero; X espera a Y.
    let mut streamer = EventStreamer::new(Uuid::new_v4());
    let mut out = Vec::new();
    streamer.submit(Event::new(EventId::RunStarted, Value::Null).with_children(["x", "y"]), &mut out)
            .unwrap();
    streamer.submit(Event::new("y", json!({"n": 1})), &mut out).unwrap();
    streamer.submit(Event::new("x", json!({"n": 2})).after(["y"]), &mut out)
            .unwrap();
    streamer.finish(None, &mut out).unwrap();

    assert_eq!(ids(&out),
               vec![EventId::RunStarted, EventId::key("y"), EventId::key("x"), EventId::Progress(0)]);
    assert!(streamer.ledger().is_complete());
    assert_eq!(streamer.pending_len(), 0);
    assert!(out.iter().all(|e| !matches!(e.kind, EventKind::Aborted { .. })));
}

#[test]
fn released_dependents_are_processed_depth_first() {
    let mut streamer = EventStreamer::new(Uuid::new_v4());
    let mut out = Vec::new();
    streamer.submit(Event::new(EventId::RunStarted, Value::Null).with_children(["a", "b", "a1", "b1"]),
                    &mut out)
            .unwrap();
    streamer.submit(Event::new("a", Value::Null).after(["gate"]), &mut out).unwrap();
    streamer.submit(Event::new("b", Value::Null).after(["gate"]), &mut out).unwrap();
    streamer.submit(Event::new("a1", Value::Null).after(["a"]), &mut out).unwrap();
    streamer.submit(Event::new("b1", Value::Null).after(["b"]), &mut out).unwrap();
    assert_eq!(streamer.pending_len(), 4);

    streamer.submit(Event::new("gate", Value::Null), &mut out).unwrap();
    let keys: Vec<EventId> = ids(&out).into_iter()
                                      .filter(|id| matches!(id, EventId::Key(_)))
                                      .collect();
    assert_eq!(keys,
               ["gate", "a", "a1", "b", "b1"].into_iter().map(EventId::key).collect::<Vec<_>>());
}

#[test]
fn every_submission_order_respects_prerequisites() {
    let events = vec![Event::new(EventId::RunStarted, Value::Null).with_children(["a", "b", "c"]),
                      Event::new("a", Value::Null),
                      Event::new("b", Value::Null).after(["a"]),
                      Event::new("c", Value::Null).after(["b", "a"]),];

    for order in permutations(events) {
        let mut streamer = EventStreamer::new(Uuid::new_v4());
        let mut out = Vec::new();
        for event in order {
            streamer.submit(event, &mut out).unwrap();
        }
        streamer.finish(None, &mut out).unwrap();

        let (a, b, c) = (EventId::key("a"), EventId::key("b"), EventId::key("c"));
        assert!(position(&out, &a) < position(&out, &b));
        assert!(position(&out, &b) < position(&out, &c));
        for id in [&EventId::RunStarted, &a, &b, &c] {
            assert_eq!(out.iter().filter(|e| &e.id == id).count(), 1, "{id} delivered more than once");
        }
        assert!(streamer.ledger().is_complete());
        assert!(streamer.ledger().posted_is_subset());
        let last: Vec<u64> = out.iter().filter(|e| e.last_message).map(|e| e.seq).collect();
        assert_eq!(last, vec![out.len() as u64 - 1]);
        assert!(out.windows(2).all(|w| w[0].seq + 1 == w[1].seq));
    }
}

#[test]
fn interleaved_flushes_never_release_early() {
    use eventcast_core::CapturedOutput;
    use std::sync::Arc;

    let capture = Arc::new(CapturedOutput::new());
    let mut streamer = EventStreamer::new(Uuid::new_v4());
    streamer.register_output_capture(capture.clone());
    let mut out = Vec::new();

    streamer.submit(Event::new(EventId::RunStarted, Value::Null).with_children(["link", "test"]), &mut out)
            .unwrap();
    streamer.submit(Event::new("test", Value::Null).after(["link"]), &mut out)
            .unwrap();
    for line in ["one\n", "two\n"] {
        capture.append_stdout(line);
        streamer.flush_output(&mut out).unwrap();
        assert!(!ids(&out).contains(&EventId::key("test")));
    }
    streamer.submit(Event::new("link", Value::Null), &mut out).unwrap();
    assert!(position(&out, &EventId::key("link")) < position(&out, &EventId::key("test")));
    assert_eq!(ids(&out)[1..3], [EventId::Progress(0), EventId::Progress(1)]);
}

#[test]
fn repeated_info_event_is_delivered_once() {
    let mut streamer = EventStreamer::new(Uuid::new_v4());
    let mut out = Vec::new();
    streamer.submit(Event::new(EventId::RunStarted, Value::Null), &mut out).unwrap();
    streamer.submit(Event::info("workspace", json!({"rev": 1})), &mut out).unwrap();
    streamer.submit(Event::info("workspace", json!({"rev": 2})), &mut out).unwrap();
    streamer.finish(None, &mut out).unwrap();

    let copies: Vec<&StreamEvent> = out.iter().filter(|e| e.id == EventId::key("workspace")).collect();
    assert_eq!(copies.len(), 1);
    assert_eq!(copies[0].payload, json!({"rev": 1}));
}
