use std::cell::RefCell;
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;

use ds_core::{
    fill_placeholders, ChoiceItem, DialogueError, DialogueState, Diagnostic, EdgeRef, Expression,
    NodeIndex, NodeKind, ScriptGraph, StateCodec, Value,
};

mod choices;
mod lifecycle;
mod notify;
mod snapshot;
mod step;
mod text;
mod variables;

use lifecycle::Phase;

pub use lifecycle::{Dialogue, DialogueOptions, DEFAULT_MAX_WALK_STEPS};
pub use notify::{DialogueEvent, Participant, VariableScope};

#[cfg(test)]
pub(super) mod runtime_test_support {
    use super::*;

    pub(super) const GREETING: &str = r#"{
      "start": "start",
      "nodes": [
        { "id": "start", "kind": "start", "edges": [{ "to": "hello" }] },
        { "id": "hello", "kind": "text", "speakerId": "Player", "text": "Hello", "edges": [{ "to": "ask" }] },
        { "id": "ask", "kind": "choice", "edges": [
          { "id": "yes", "text": "Yes", "to": "yesLine" },
          { "id": "no", "text": "No", "to": "noLine" }
        ] },
        { "id": "yesLine", "kind": "text", "speakerId": "NPC", "text": "Great", "edges": [{ "to": "end" }] },
        { "id": "noLine", "kind": "text", "speakerId": "NPC", "text": "Pity", "edges": [{ "to": "end" }] },
        { "id": "end", "kind": "end" }
      ]
    }"#;

    pub(super) const HEALTH_CHECK: &str = r#"{
      "start": "start",
      "nodes": [
        { "id": "start", "kind": "start", "edges": [{ "to": "check" }] },
        { "id": "check", "kind": "select", "edges": [
          { "guard": "{health} > 0", "to": "alive" },
          { "to": "dead" }
        ] },
        { "id": "alive", "kind": "text", "speakerId": "NPC", "text": "Still standing", "edges": [] },
        { "id": "dead", "kind": "text", "speakerId": "NPC", "text": "Down", "edges": [] }
      ]
    }"#;

    pub(super) const NESTED_CHOICES: &str = r#"{
      "start": "start",
      "nodes": [
        { "id": "start", "kind": "start", "edges": [{ "to": "intro" }] },
        { "id": "intro", "kind": "text", "speakerId": "NPC", "text": "Pick one", "edges": [{ "to": "outer" }] },
        { "id": "outer", "kind": "choice", "edges": [{ "to": "inner" }] },
        { "id": "inner", "kind": "choice", "edges": [
          { "id": "left", "text": "Left", "to": "leftLine" },
          { "id": "right", "text": "Right", "to": "rightLine" }
        ] },
        { "id": "leftLine", "kind": "text", "speakerId": "NPC", "text": "Went left", "edges": [] },
        { "id": "rightLine", "kind": "text", "speakerId": "NPC", "text": "Went right", "edges": [] }
      ]
    }"#;

    pub(super) fn graph(source: &str) -> Arc<ScriptGraph> {
        Arc::new(ScriptGraph::from_json(source).expect("graph should load"))
    }

    pub(super) fn dialogue(source: &str) -> Dialogue {
        Dialogue::new(graph(source))
    }

    pub(super) fn drive_to_end(dialogue: &mut Dialogue) -> Vec<String> {
        let mut lines = Vec::new();
        for _ in 0..1_000usize {
            if dialogue.is_ended() {
                return lines;
            }
            if dialogue.choice_count() > 0 {
                dialogue.choose(0).expect("choose should pass");
            } else {
                lines.push(dialogue.text());
                dialogue.continue_dialogue().expect("continue should pass");
            }
        }
        lines
    }

    #[derive(Default)]
    pub(super) struct Recorder {
        pub(super) events: Arc<std::sync::Mutex<Vec<DialogueEvent>>>,
    }

    impl Recorder {
        pub(super) fn attach(&self, dialogue: &mut Dialogue) {
            let events = Arc::clone(&self.events);
            dialogue.subscribe(move |event| {
                events.lock().expect("recorder lock").push(event.clone());
            });
        }

        pub(super) fn take(&self) -> Vec<DialogueEvent> {
            std::mem::take(&mut *self.events.lock().expect("recorder lock"))
        }
    }
}

#[cfg(test)]
mod lifecycle_tests;
