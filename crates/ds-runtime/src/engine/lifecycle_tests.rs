use super::runtime_test_support::*;
use super::*;

const INN: &str = r#"{
  "start": "start",
  "header": "init",
  "labels": { "shop": "shopLine" },
  "nodes": [
    { "id": "init", "kind": "setVariable", "target": "visits", "value": "{visits} + 1", "edges": [{ "to": "initEnd" }] },
    { "id": "initEnd", "kind": "end" },
    { "id": "start", "kind": "start", "edges": [{ "to": "greet" }] },
    { "id": "greet", "kind": "text", "speakerId": "Innkeeper", "text": "Visit number {visits}", "edges": [{ "to": "pick" }] },
    { "id": "pick", "kind": "choice", "edges": [
      { "id": "room", "text": "A room, please", "to": "shopLine" },
      { "id": "bye", "text": "Goodbye" }
    ] },
    { "id": "shopLine", "kind": "text", "speakerId": "Innkeeper", "text": "Welcome to the shop" }
  ]
}"#;

#[test]
fn default_options_bound_the_walk() {
    assert_eq!(DialogueOptions::default().max_walk_steps, DEFAULT_MAX_WALK_STEPS);
    let dialogue = dialogue(INN);
    assert_eq!(dialogue.options().max_walk_steps, 10_000);
    assert_eq!(dialogue.graph().node_count(), 6);
}

#[test]
fn start_at_label_runs_header_first() {
    let mut dialogue = dialogue(INN);
    let recorder = Recorder::default();
    recorder.attach(&mut dialogue);

    assert!(dialogue.start(Some("shop")).expect("start"));
    assert_eq!(dialogue.text(), "Welcome to the shop");
    assert_eq!(dialogue.variable_int("visits"), 1);
    assert_eq!(
        recorder.take().first(),
        Some(&DialogueEvent::Starting {
            label: Some("shop".to_string())
        })
    );
}

#[test]
fn unknown_label_fails_without_moving() {
    let mut dialogue = dialogue(INN);
    dialogue.start(None).expect("start");
    let error = dialogue.start(Some("cellar")).expect_err("label should be unknown");
    assert_eq!(error.code, "ENGINE_LABEL_NOT_FOUND");
    assert_eq!(dialogue.current_node_id(), Some("greet"));
    assert_eq!(dialogue.variable_int("visits"), 1);
}

#[test]
fn restart_controls_state_and_header() {
    let mut dialogue = dialogue(INN);
    dialogue.start(None).expect("start");
    assert_eq!(dialogue.text(), "Visit number 1");

    dialogue.restart(false, None, false).expect("restart");
    assert_eq!(dialogue.text(), "Visit number 1");

    dialogue.restart(false, None, true).expect("restart");
    assert_eq!(dialogue.text(), "Visit number 2");

    dialogue.restart(true, None, true).expect("restart");
    assert_eq!(dialogue.text(), "Visit number 1");
}

#[test]
fn start_forgets_taken_choices_but_keeps_variables() {
    let mut dialogue = dialogue(INN);
    dialogue.start(None).expect("start");
    dialogue.continue_dialogue().expect("continue");
    dialogue.choose(0).expect("choose");
    assert!(dialogue.saved_state().taken_edge_ids.contains("room"));

    dialogue.start(None).expect("start");
    assert!(dialogue.saved_state().taken_edge_ids.is_empty());
    assert_eq!(dialogue.variable_int("visits"), 2);
}

#[test]
fn choice_without_destination_ends() {
    let mut dialogue = dialogue(INN);
    dialogue.start(None).expect("start");
    dialogue.continue_dialogue().expect("continue");
    assert!(!dialogue.choose(1).expect("choose"));
    assert!(dialogue.is_ended());
}

#[test]
fn end_raises_finished_unless_quiet() {
    let mut dialogue = dialogue(INN);
    let recorder = Recorder::default();
    recorder.attach(&mut dialogue);
    dialogue.start(None).expect("start");
    recorder.take();

    dialogue.end(true);
    assert!(dialogue.is_ended());
    assert!(recorder.take().is_empty());

    dialogue.start(None).expect("start");
    recorder.take();
    dialogue.end(false);
    assert_eq!(recorder.take(), vec![DialogueEvent::Finished]);
}

#[test]
fn reset_state_clears_selected_parts() {
    let mut dialogue = dialogue(INN);
    dialogue.start(None).expect("start");
    dialogue.continue_dialogue().expect("continue");
    dialogue.choose(0).expect("choose");

    dialogue.reset_state(false, false, true);
    assert!(dialogue.saved_state().taken_edge_ids.is_empty());
    assert_eq!(dialogue.current_node_id(), Some("shopLine"));

    dialogue.reset_state(false, true, false);
    assert!(!dialogue.is_started());
    assert!(!dialogue.is_ended());
    assert_eq!(dialogue.current_node_id(), None);
    assert_eq!(dialogue.variable_int("visits"), 1);

    dialogue.reset_state(true, false, false);
    assert!(dialogue.variables().is_empty());
}

#[test]
fn header_stops_at_observable_node() {
    let mut dialogue = dialogue(
        r#"{
      "start": "start",
      "header": "init",
      "nodes": [
        { "id": "init", "kind": "setVariable", "target": "ready", "value": "true", "edges": [{ "to": "oops" }] },
        { "id": "oops", "kind": "text", "speakerId": "NPC", "text": "Not here" },
        { "id": "start", "kind": "start", "edges": [{ "to": "line" }] },
        { "id": "line", "kind": "text", "speakerId": "NPC", "text": "Ready: {ready}" }
      ]
    }"#,
    );
    dialogue.start(None).expect("start");
    assert_eq!(dialogue.text(), "Ready: true");
    assert_eq!(
        dialogue
            .diagnostics()
            .iter()
            .map(|diagnostic| diagnostic.code.clone())
            .collect::<Vec<_>>(),
        vec!["ENGINE_HEADER_OBSERVABLE"]
    );
}

#[test]
fn debug_output_names_position() {
    let mut dialogue = dialogue(INN);
    dialogue.start(None).expect("start");
    let rendered = format!("{:?}", dialogue);
    assert!(rendered.contains("greet"));
}
