use eventcast_core::{Event, EventId, EventKind, EventStreamer, NamedSet, SetName, StreamEvent};
use serde_json::Value;
use uuid::Uuid;

fn declarations(events: &[StreamEvent]) -> Vec<(SetName, Vec<SetName>)> {
    events.iter()
          .filter_map(|e| match (&e.id, &e.kind) {
              (EventId::NamedSet(name), EventKind::NamedSetDeclaration { children, .. }) => {
                  Some((*name, children.clone()))
              }
              _ => None,
          })
          .collect()
}

fn position(events: &[StreamEvent], id: &EventId) -> usize {
    events.iter().position(|e| &e.id == id).unwrap()
}

#[test]
fn shared_subset_is_declared_once_before_its_first_reference() {
    let mut streamer = EventStreamer::new(Uuid::new_v4());
    let mut out = Vec::new();
    streamer.submit(Event::new(EventId::RunStarted, Value::Null).with_children(["lib", "bin"]), &mut out)
            .unwrap();

    let headers = NamedSet::leaf(["include/a.h", "include/b.h"]);
    let lib = NamedSet::new(["liba.a"], vec![headers.clone()]);
    let bin = NamedSet::new(["app"], vec![headers.clone(), lib.clone()]);

    streamer.submit(Event::new("lib", Value::Null).referencing(&lib), &mut out)
            .unwrap();
    let after_lib = out.len();
    streamer.submit(Event::new("bin", Value::Null).referencing(&bin), &mut out)
            .unwrap();

    let decls = declarations(&out);
    assert_eq!(decls.len(), 3, "headers, lib and bin declared exactly once");

    let name = |set: &NamedSet| streamer.namer().name_of(set).unwrap();
    // los hijos se declaran antes que el padre
    let headers_at = position(&out, &EventId::NamedSet(name(&headers)));
    let lib_at = position(&out, &EventId::NamedSet(name(&lib)));
    assert!(headers_at < lib_at);
    assert!(lib_at < position(&out, &EventId::key("lib")));

    // la segunda referencia sólo declara lo nuevo
    let bin_decls = declarations(&out[after_lib..]);
    assert_eq!(bin_decls, vec![(name(&bin), vec![name(&headers), name(&lib)])]);
    let bin_event = &out[position(&out, &EventId::key("bin"))];
    assert_eq!(bin_event.named_sets, vec![name(&bin)]);
}

#[test]
fn equal_content_in_distinct_sets_gets_distinct_names() {
    let mut streamer = EventStreamer::new(Uuid::new_v4());
    let mut out = Vec::new();
    let first = NamedSet::leaf(["out/report.txt"]);
    let second = NamedSet::leaf(["out/report.txt"]);

    streamer.submit(Event::new(EventId::RunStarted, Value::Null).referencing(&first)
                                                                .referencing(&second),
                    &mut out)
            .unwrap();

    let names: Vec<SetName> = declarations(&out).into_iter().map(|(n, _)| n).collect();
    assert_eq!(names.len(), 2);
    assert_ne!(names[0], names[1]);
    assert_eq!(out.last().map(|e| e.named_sets.len()), Some(2));
}

#[test]
fn declarations_seed_the_stream_when_the_first_event_references_sets() {
    let mut streamer = EventStreamer::new(Uuid::new_v4());
    let mut out = Vec::new();
    let outputs = NamedSet::leaf(["bazel-out/app"]);

    streamer.submit(Event::new(EventId::RunStarted, Value::Null).referencing(&outputs), &mut out)
            .unwrap();
    streamer.finish(None, &mut out).unwrap();

    let set = EventId::NamedSet(streamer.namer().name_of(&outputs).unwrap());
    assert_eq!(out.iter().map(|e| e.id.clone()).collect::<Vec<_>>(),
               vec![set, EventId::Progress(0), EventId::RunStarted, EventId::Progress(1)]);
    // el enlace anuncia el RunStarted que la declaración no anunció
    assert_eq!(out[1].children, vec![EventId::Progress(1), EventId::RunStarted]);
    assert!(out[3].last_message);
    assert!(streamer.ledger().is_complete());
}
