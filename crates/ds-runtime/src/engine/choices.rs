use super::*;

impl Dialogue {
    pub fn choice_count(&self) -> usize {
        self.choices.len()
    }

    pub fn choices(&self) -> &[ChoiceItem] {
        &self.choices
    }

    /// Picks one of the options offered at the current fork.
    pub fn choose(&mut self, index: usize) -> Result<bool, DialogueError> {
        if !self.is_at_fork() {
            return Err(DialogueError::new(
                "ENGINE_NO_PENDING_CHOICE",
                "There is no choice to make at this point of the dialogue.",
            ));
        }
        let Some(item) = self.choices.get(index).cloned() else {
            tracing::warn!(index, count = self.choices.len(), "choice index out of range");
            return Err(DialogueError::new(
                "ENGINE_CHOICE_INDEX",
                format!(
                    "Choice index {} is out of range; {} options are available.",
                    index,
                    self.choices.len()
                ),
            ));
        };

        if let Some(edge_id) = &item.edge_id {
            self.taken_edge_ids.insert(edge_id.clone());
        }
        self.raise(DialogueEvent::Choice { index });
        self.raise(DialogueEvent::Proceeding);

        let target = self.graph.edge(item.edge).and_then(|edge| edge.target());
        self.last_choices = std::mem::take(&mut self.choices);
        self.walk_from(target)
    }

    /// Moves past the current line. At a fork this only works when a single
    /// option is on offer. Returns whether the dialogue is still running.
    pub fn continue_dialogue(&mut self) -> Result<bool, DialogueError> {
        if self.phase != Phase::Active {
            return Ok(false);
        }
        let Some(index) = self.current else {
            return Ok(false);
        };

        if self.is_at_fork() {
            return match self.choices.len() {
                1 => self.choose(0),
                count => Err(DialogueError::new(
                    "ENGINE_CONTINUE_UNAVAILABLE",
                    format!(
                        "Cannot continue past a choice with {} options; choose one instead.",
                        count
                    ),
                )),
            };
        }

        let target = self
            .graph
            .node(index)
            .and_then(|node| node.edges.first())
            .and_then(|edge| edge.target());
        self.raise(DialogueEvent::Proceeding);
        self.walk_from(target)
    }

    /// Resolves `index` against the pending fork, or against the fork most
    /// recently chosen from when none is pending.
    pub fn has_choice_index_been_taken_previously(&self, index: usize) -> bool {
        let options = if self.choices.is_empty() {
            &self.last_choices
        } else {
            &self.choices
        };
        options
            .get(index)
            .is_some_and(|item| self.has_choice_been_taken_previously(item))
    }

    /// Options without a stable edge id are never remembered.
    pub fn has_choice_been_taken_previously(&self, item: &ChoiceItem) -> bool {
        item.edge_id
            .as_ref()
            .is_some_and(|edge_id| self.taken_edge_ids.contains(edge_id))
    }

    pub(super) fn is_at_fork(&self) -> bool {
        self.phase == Phase::Active
            && self
                .current
                .and_then(|index| self.graph.node(index))
                .is_some_and(|node| matches!(node.kind, NodeKind::Choice))
    }

    /// Builds the option list for a fork. Silent edges into other forks or
    /// selects are followed so their options appear inline; a silent edge
    /// anywhere else is offered as a blank option.
    pub(super) fn collect_choices(&mut self, fork: NodeIndex) -> Vec<ChoiceItem> {
        let graph = Arc::clone(&self.graph);
        let mut visited = HashSet::new();
        let mut edges = Vec::new();
        self.append_fork_edges(&graph, fork, &mut visited, &mut edges);

        edges
            .into_iter()
            .enumerate()
            .filter_map(|(index, edge_ref)| {
                let edge = graph.edge(edge_ref)?;
                Some(ChoiceItem {
                    index,
                    edge_id: edge.id.clone(),
                    text: edge.display_text().to_string(),
                    edge: edge_ref,
                })
            })
            .collect()
    }

    fn append_fork_edges(
        &mut self,
        graph: &ScriptGraph,
        index: NodeIndex,
        visited: &mut HashSet<NodeIndex>,
        out: &mut Vec<EdgeRef>,
    ) {
        if !visited.insert(index) {
            return;
        }
        let Some(node) = graph.node(index) else {
            return;
        };

        match node.kind {
            NodeKind::Choice => {
                for (position, edge) in node.edges.iter().enumerate() {
                    let edge_ref = EdgeRef {
                        node: index,
                        edge: position,
                    };
                    self.append_edge(graph, edge_ref, visited, out);
                }
            }
            NodeKind::Select => {
                if let Some(position) = self.select_edge(graph, index) {
                    let edge_ref = EdgeRef {
                        node: index,
                        edge: position,
                    };
                    self.append_edge(graph, edge_ref, visited, out);
                }
            }
            _ => {}
        }
    }

    fn append_edge(
        &mut self,
        graph: &ScriptGraph,
        edge_ref: EdgeRef,
        visited: &mut HashSet<NodeIndex>,
        out: &mut Vec<EdgeRef>,
    ) {
        let Some(edge) = graph.edge(edge_ref) else {
            return;
        };
        if !edge.is_silent() {
            out.push(edge_ref);
            return;
        }
        let nested = edge.target().filter(|target| {
            graph
                .node(*target)
                .is_some_and(|node| matches!(node.kind, NodeKind::Choice | NodeKind::Select))
        });
        match nested {
            Some(target) => self.append_fork_edges(graph, target, visited, out),
            None => out.push(edge_ref),
        }
    }
}
