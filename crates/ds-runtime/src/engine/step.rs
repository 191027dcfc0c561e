use super::*;

/// Outcome of running one non-observable node.
enum Step {
    Next(Option<NodeIndex>),
    Stop,
}

impl Dialogue {
    /// Walks from `from` until the next line or fork, or the end. Returns
    /// whether the dialogue is still running.
    pub(super) fn walk_from(&mut self, from: Option<NodeIndex>) -> Result<bool, DialogueError> {
        let graph = Arc::clone(&self.graph);
        let mut next = from;
        let mut guard = 0usize;
        while guard < self.options.max_walk_steps {
            guard += 1;

            let Some(index) = next else {
                self.finish();
                return Ok(false);
            };
            let Some(node) = graph.node(index) else {
                self.finish();
                return Ok(false);
            };
            tracing::trace!(node = %node.id, kind = node.kind.name(), "walk");

            match &node.kind {
                NodeKind::Text { .. } => {
                    self.arrive_at_line(index);
                    return Ok(true);
                }
                NodeKind::Choice => {
                    // a fork with one silent edge is just a connector
                    if node.edges.len() == 1 && node.edges[0].is_silent() {
                        next = node.edges[0].target();
                        continue;
                    }
                    return Ok(self.arrive_at_fork(index));
                }
                NodeKind::End => {
                    self.finish();
                    return Ok(false);
                }
                _ => match self.run_silent_node(index) {
                    Step::Next(target) => next = target,
                    Step::Stop => {
                        self.finish();
                        return Ok(false);
                    }
                },
            }
        }
        Err(self.abort_cycle())
    }

    /// Runs the header chain. It may only contain non-observable nodes; a
    /// line or fork stops it early.
    pub(super) fn run_header(&mut self, header: NodeIndex) -> Result<(), DialogueError> {
        let graph = Arc::clone(&self.graph);
        let mut next = Some(header);
        let mut guard = 0usize;
        while guard < self.options.max_walk_steps {
            guard += 1;

            let Some(node) = next.and_then(|index| graph.node(index)) else {
                return Ok(());
            };
            match &node.kind {
                NodeKind::End => return Ok(()),
                NodeKind::Text { .. } | NodeKind::Choice => {
                    self.record_diagnostic(
                        "ENGINE_HEADER_OBSERVABLE",
                        format!(
                            "Header stopped at {} node \"{}\"; headers cannot show lines or choices.",
                            node.kind.name(),
                            node.id
                        ),
                    );
                    return Ok(());
                }
                _ => {
                    let Some(index) = next else {
                        return Ok(());
                    };
                    match self.run_silent_node(index) {
                        Step::Next(target) => next = target,
                        Step::Stop => return Ok(()),
                    }
                }
            }
        }
        Err(self.abort_cycle())
    }

    fn run_silent_node(&mut self, index: NodeIndex) -> Step {
        let graph = Arc::clone(&self.graph);
        let Some(node) = graph.node(index) else {
            return Step::Stop;
        };
        let first_target = || node.edges.first().and_then(|edge| edge.target());

        match &node.kind {
            NodeKind::Start => Step::Next(first_target()),
            NodeKind::SetVariable { target, value } => {
                self.run_set_variable(&node.id, target, value);
                Step::Next(first_target())
            }
            NodeKind::Event { name, args } => {
                let args = args
                    .iter()
                    .map(|arg| self.evaluate(arg, &node.id).unwrap_or(Value::Int(0)))
                    .collect();
                tracing::debug!(event = %name, "dialogue event");
                self.raise(DialogueEvent::Event {
                    name: name.clone(),
                    args,
                });
                Step::Next(first_target())
            }
            NodeKind::Select => match self.select_edge(&graph, index) {
                Some(edge) => Step::Next(node.edges[edge].target()),
                None => {
                    self.record_diagnostic(
                        "ENGINE_SELECT_NO_PATH",
                        format!(
                            "Select node \"{}\" has no passing condition and no fallback.",
                            node.id
                        ),
                    );
                    Step::Stop
                }
            },
            NodeKind::End | NodeKind::Text { .. } | NodeKind::Choice => Step::Stop,
        }
    }

    fn run_set_variable(&mut self, node_id: &str, target: &str, value: &Expression) {
        // a failed evaluation leaves the variable untouched
        let Some(value) = self.evaluate(value, node_id) else {
            return;
        };
        tracing::debug!(variable = %target, value = %value, "set variable");
        self.variables.insert(target.to_string(), value);
        self.raise_variable_changed(target, true);
    }

    /// Index of the edge a select node takes: the first passing guard in
    /// order, else the unguarded fallback.
    pub(super) fn select_edge(&mut self, graph: &ScriptGraph, index: NodeIndex) -> Option<usize> {
        let node = graph.node(index)?;
        for (position, edge) in node.edges.iter().enumerate() {
            let Some(guard) = &edge.guard else {
                continue;
            };
            if self.evaluate_condition(guard, &node.id) {
                return Some(position);
            }
        }
        node.edges.iter().position(|edge| edge.guard.is_none())
    }

    /// Evaluates after letting participants supply the referenced variables.
    /// Failures are recorded and yield `None`.
    pub(super) fn evaluate(&mut self, expression: &Expression, node_id: &str) -> Option<Value> {
        self.request_variables(&expression.variable_names());
        match expression.evaluate(&self.variables) {
            Ok(value) => Some(value),
            Err(error) => {
                self.record_diagnostic(
                    &error.code,
                    format!(
                        "Evaluating \"{}\" at node \"{}\" failed: {}",
                        expression, node_id, error.message
                    ),
                );
                None
            }
        }
    }

    pub(super) fn evaluate_condition(&mut self, expression: &Expression, node_id: &str) -> bool {
        self.evaluate(expression, node_id)
            .map(|value| value.is_truthy())
            .unwrap_or(false)
    }

    fn arrive_at_line(&mut self, index: NodeIndex) {
        self.phase = Phase::Active;
        self.current = Some(index);
        self.speaker = Some(index);
        self.choices.clear();
        self.update_participant_parameters();

        let Some(node) = self.graph.node(index) else {
            return;
        };
        let speaker_id = match &node.kind {
            NodeKind::Text { speaker_id, .. } => speaker_id.clone(),
            _ => String::new(),
        };
        let node_id = node.id.clone();
        self.raise(DialogueEvent::SpeakerLine {
            node_id,
            speaker_id,
        });
    }

    /// Parks at a fork. A fork with nothing to offer ends the dialogue.
    fn arrive_at_fork(&mut self, index: NodeIndex) -> bool {
        let choices = self.collect_choices(index);
        let node_id = self
            .graph
            .node(index)
            .map(|node| node.id.clone())
            .unwrap_or_default();
        if choices.is_empty() {
            self.record_diagnostic(
                "ENGINE_NO_CHOICES",
                format!("Choice node \"{}\" has no options to offer.", node_id),
            );
            self.finish();
            return false;
        }

        self.phase = Phase::Active;
        self.current = Some(index);
        self.choices = choices;
        self.last_choices.clear();
        self.update_participant_parameters();
        let count = self.choices.len();
        self.raise(DialogueEvent::ChoicesPresented { node_id, count });
        true
    }

    fn finish(&mut self) {
        tracing::debug!("dialogue finished");
        self.end(false);
    }

    fn abort_cycle(&mut self) -> DialogueError {
        let error = DialogueError::new(
            "ENGINE_GRAPH_CYCLE",
            format!(
                "Walked more than {} nodes without reaching a line, choice or end.",
                self.options.max_walk_steps
            ),
        );
        tracing::error!(code = %error.code, "{}", error.message);
        self.diagnostics.borrow_mut().push(error.clone().into());
        self.end(true);
        error
    }
}
