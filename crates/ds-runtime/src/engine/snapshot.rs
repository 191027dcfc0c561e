use super::*;

impl Dialogue {
    /// Captures the running state keyed by stable node and edge ids.
    pub fn saved_state(&self) -> DialogueState {
        let node_id = |index: Option<NodeIndex>| {
            index
                .and_then(|index| self.graph.node(index))
                .map(|node| node.id.clone())
        };
        DialogueState {
            current_node_id: node_id(self.current),
            speaker_node_id: node_id(self.speaker),
            variables: self.variables.clone(),
            taken_edge_ids: self.taken_edge_ids.clone(),
        }
    }

    /// Replaces the running state. Nothing changes when the state does not fit
    /// the graph. A state without a position leaves the dialogue ended; the
    /// walk is never resumed here.
    pub fn restore_saved_state(&mut self, state: &DialogueState) -> Result<(), DialogueError> {
        let diagnostics = StateCodec::validate(state, &self.graph)?;
        for diagnostic in diagnostics {
            self.record_diagnostic(&diagnostic.code, diagnostic.message);
        }

        let lookup = |id: &Option<String>| id.as_deref().and_then(|id| self.graph.node_index(id));
        let current = lookup(&state.current_node_id);
        let speaker = lookup(&state.speaker_node_id);

        self.variables = state.variables.clone();
        self.taken_edge_ids = state.taken_edge_ids.clone();
        self.choices.clear();
        self.last_choices.clear();
        self.current = current;
        self.speaker = match current {
            Some(index) if self.is_line(index) => Some(index),
            _ => speaker,
        };
        self.phase = if current.is_some() {
            Phase::Active
        } else {
            Phase::Ended
        };

        if let Some(index) = current.filter(|index| !self.is_line(*index)) {
            // guards see the restored variables as saved
            self.restoring = true;
            self.choices = self.collect_choices(index);
            self.restoring = false;
        }
        tracing::debug!(
            node = state.current_node_id.as_deref().unwrap_or(""),
            "dialogue state restored"
        );
        Ok(())
    }

    pub fn save_state_json(&self) -> Result<String, DialogueError> {
        StateCodec::serialize(&self.saved_state())
    }

    pub fn restore_state_json(&mut self, raw: &str) -> Result<(), DialogueError> {
        let state = StateCodec::deserialize(raw, &self.graph)?;
        self.restore_saved_state(&state)
    }

    fn is_line(&self, index: NodeIndex) -> bool {
        self.graph
            .node(index)
            .is_some_and(|node| matches!(node.kind, NodeKind::Text { .. }))
    }
}
