use super::*;

pub const DEFAULT_MAX_WALK_STEPS: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialogueOptions {
    /// Upper bound on non-observable nodes visited by a single walk. A walk
    /// that exceeds it is treated as a cycle.
    pub max_walk_steps: usize,
}

impl Default for DialogueOptions {
    fn default() -> Self {
        Self {
            max_walk_steps: DEFAULT_MAX_WALK_STEPS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Phase {
    NotStarted,
    Active,
    Ended,
}

pub(super) type Subscriber = Box<dyn FnMut(&DialogueEvent) + Send>;

/// One playthrough of a [`ScriptGraph`]. The graph is shared; everything that
/// changes while playing (cursor, variables, taken choices) lives here.
pub struct Dialogue {
    pub(super) graph: Arc<ScriptGraph>,
    pub(super) options: DialogueOptions,
    pub(super) phase: Phase,
    pub(super) current: Option<NodeIndex>,
    pub(super) speaker: Option<NodeIndex>,
    pub(super) choices: Vec<ChoiceItem>,
    /// Options of the fork most recently chosen from, kept so index queries
    /// still resolve after the walk has moved on.
    pub(super) last_choices: Vec<ChoiceItem>,
    pub(super) variables: BTreeMap<String, Value>,
    pub(super) taken_edge_ids: BTreeSet<String>,
    pub(super) participants: Vec<Box<dyn Participant>>,
    pub(super) subscribers: Vec<Subscriber>,
    pub(super) diagnostics: RefCell<Vec<Diagnostic>>,
    /// Set while a restore rebuilds the option list; participants are not
    /// consulted then.
    pub(super) restoring: bool,
}

impl std::fmt::Debug for Dialogue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dialogue")
            .field("phase", &self.phase)
            .field("current", &self.current_node_id())
            .field("choices", &self.choices.len())
            .field("variables", &self.variables)
            .field("taken_edge_ids", &self.taken_edge_ids)
            .field("participants", &self.participants.len())
            .finish()
    }
}

impl Dialogue {
    pub fn new(graph: Arc<ScriptGraph>) -> Self {
        Self::with_options(graph, DialogueOptions::default())
    }

    pub fn with_options(graph: Arc<ScriptGraph>, options: DialogueOptions) -> Self {
        Self {
            graph,
            options,
            phase: Phase::NotStarted,
            current: None,
            speaker: None,
            choices: Vec::new(),
            last_choices: Vec::new(),
            variables: BTreeMap::new(),
            taken_edge_ids: BTreeSet::new(),
            participants: Vec::new(),
            subscribers: Vec::new(),
            diagnostics: RefCell::new(Vec::new()),
            restoring: false,
        }
    }

    pub fn graph(&self) -> &Arc<ScriptGraph> {
        &self.graph
    }

    pub fn options(&self) -> DialogueOptions {
        self.options
    }

    /// Starts from the top of the script, or from `label` when given. Any
    /// previous position and taken-choice history is discarded; variables are
    /// kept. Returns whether the dialogue is still running afterwards.
    pub fn start(&mut self, label: Option<&str>) -> Result<bool, DialogueError> {
        self.start_internal(label, true)
    }

    /// Optionally wipes all state, then starts again.
    pub fn restart(
        &mut self,
        reset_state: bool,
        label: Option<&str>,
        rerun_header: bool,
    ) -> Result<bool, DialogueError> {
        if reset_state {
            self.reset_state(true, true, true);
        }
        self.start_internal(label, rerun_header)
    }

    fn start_internal(&mut self, label: Option<&str>, run_header: bool) -> Result<bool, DialogueError> {
        let entry = match label {
            None => self.graph.start_index(),
            Some(label) => self.graph.label_index(label).ok_or_else(|| {
                DialogueError::new(
                    "ENGINE_LABEL_NOT_FOUND",
                    format!("Label \"{}\" does not exist in the script.", label),
                )
            })?,
        };

        self.reset_state(false, true, true);
        self.phase = Phase::Active;
        tracing::debug!(label = label.unwrap_or(""), "dialogue starting");
        self.raise(DialogueEvent::Starting {
            label: label.map(str::to_string),
        });

        if run_header {
            if let Some(header) = self.graph.header_index() {
                self.run_header(header)?;
            }
        }
        self.walk_from(Some(entry))
    }

    /// Clears selected parts of the running state. Clearing the position
    /// puts the dialogue back into the not-started state.
    pub fn reset_state(&mut self, variables: bool, position: bool, visited: bool) {
        if variables {
            self.variables.clear();
        }
        if position {
            self.phase = Phase::NotStarted;
            self.current = None;
            self.speaker = None;
            self.choices.clear();
            self.last_choices.clear();
        }
        if visited {
            self.taken_edge_ids.clear();
        }
    }

    /// Forces the dialogue into the ended state. A finished notification is
    /// raised unless `quiet` is set.
    pub fn end(&mut self, quiet: bool) {
        self.phase = Phase::Ended;
        self.current = None;
        self.speaker = None;
        self.choices.clear();
        if !quiet {
            self.raise(DialogueEvent::Finished);
        }
    }

    pub fn is_ended(&self) -> bool {
        self.phase == Phase::Ended
    }

    pub fn is_started(&self) -> bool {
        self.phase != Phase::NotStarted
    }

    pub fn current_node_id(&self) -> Option<&str> {
        self.current
            .and_then(|index| self.graph.node(index))
            .map(|node| node.id.as_str())
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().clone()
    }

    pub fn take_diagnostics(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.diagnostics.borrow_mut())
    }

    pub(super) fn record_diagnostic(&self, code: &str, message: impl Into<String>) {
        let diagnostic = Diagnostic::new(code, message);
        tracing::warn!(code = %diagnostic.code, "{}", diagnostic.message);
        self.diagnostics.borrow_mut().push(diagnostic);
    }
}
