use super::*;

/// Everything a dialogue tells the outside world while it runs.
#[derive(Debug, Clone, PartialEq)]
pub enum DialogueEvent {
    Starting {
        label: Option<String>,
    },
    /// Arrived at a speaker line.
    SpeakerLine {
        node_id: String,
        speaker_id: String,
    },
    /// Arrived at a fork; the options are available through `choices()`.
    ChoicesPresented {
        node_id: String,
        count: usize,
    },
    Choice {
        index: usize,
    },
    /// Leaving the current line or fork.
    Proceeding,
    Event {
        name: String,
        args: Vec<Value>,
    },
    VariableChanged {
        name: String,
        value: Value,
        from_script: bool,
    },
    VariableRequested {
        name: String,
    },
    Finished,
}

/// A host object that takes part in a dialogue. Participants run in
/// descending priority order, before plain subscribers.
pub trait Participant: Send {
    fn priority(&self) -> i32 {
        0
    }

    /// Called before an expression reads `name`. Values written to `scope`
    /// become dialogue variables.
    fn supply_variable(&mut self, _name: &str, _scope: &mut VariableScope<'_>) {}

    /// Called on arrival at a line or fork with the parameter names the
    /// displayed text uses.
    fn update_parameters(&mut self, _params: &BTreeSet<String>, _scope: &mut VariableScope<'_>) {}

    fn on_event(&mut self, _event: &DialogueEvent) {}
}

/// Write access to dialogue variables handed to participants. Changes are
/// collected so the dialogue can announce them afterwards.
pub struct VariableScope<'a> {
    variables: &'a mut BTreeMap<String, Value>,
    changed: Vec<String>,
}

impl<'a> VariableScope<'a> {
    pub(super) fn new(variables: &'a mut BTreeMap<String, Value>) -> Self {
        Self {
            variables,
            changed: Vec::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        let value = value.into();
        if self.variables.get(name) == Some(&value) {
            return;
        }
        self.variables.insert(name.to_string(), value);
        if !self.changed.iter().any(|changed| changed == name) {
            self.changed.push(name.to_string());
        }
    }

    fn into_changed(self) -> Vec<String> {
        self.changed
    }
}

impl Dialogue {
    pub fn add_participant(&mut self, participant: Box<dyn Participant>) {
        self.participants.push(participant);
        self.sort_participants();
    }

    pub fn set_participants(&mut self, participants: Vec<Box<dyn Participant>>) {
        self.participants = participants;
        self.sort_participants();
    }

    pub fn participants_len(&self) -> usize {
        self.participants.len()
    }

    pub fn subscribe(&mut self, callback: impl FnMut(&DialogueEvent) + Send + 'static) {
        self.subscribers.push(Box::new(callback));
    }

    fn sort_participants(&mut self) {
        // stable: equal priorities keep registration order
        self.participants
            .sort_by_key(|participant| Reverse(participant.priority()));
    }

    pub(super) fn raise(&mut self, event: DialogueEvent) {
        for participant in &mut self.participants {
            participant.on_event(&event);
        }
        for subscriber in &mut self.subscribers {
            subscriber(&event);
        }
    }

    pub(super) fn raise_variable_changed(&mut self, name: &str, from_script: bool) {
        let Some(value) = self.variables.get(name).cloned() else {
            return;
        };
        self.raise(DialogueEvent::VariableChanged {
            name: name.to_string(),
            value,
            from_script,
        });
    }

    /// Gives participants a chance to supply each variable an expression is
    /// about to read.
    pub(super) fn request_variables(&mut self, names: &[String]) {
        if self.restoring {
            return;
        }
        for name in names {
            let mut scope = VariableScope::new(&mut self.variables);
            for participant in &mut self.participants {
                participant.supply_variable(name, &mut scope);
            }
            let changed = scope.into_changed();
            for changed_name in changed {
                self.raise_variable_changed(&changed_name, false);
            }
            self.raise(DialogueEvent::VariableRequested { name: name.clone() });
        }
    }

    pub(super) fn update_participant_parameters(&mut self) {
        if self.participants.is_empty() {
            return;
        }
        let params = self.parameters_in_use();
        let mut scope = VariableScope::new(&mut self.variables);
        for participant in &mut self.participants {
            participant.update_parameters(&params, &mut scope);
        }
        let changed = scope.into_changed();
        for name in changed {
            self.raise_variable_changed(&name, false);
        }
    }
}
