use std::collections::BTreeMap;
use std::sync::Arc;

use ds_core::{DialogueError, DialogueState, ScriptGraph, StateCodec, Value};
use ds_runtime::{Dialogue, DialogueOptions};

#[derive(Debug, Clone, Default)]
pub struct CreateDialogueFromJsonOptions {
    pub script_json: String,
    pub label: Option<String>,
    pub variables: BTreeMap<String, Value>,
    pub dialogue_options: Option<DialogueOptions>,
}

#[derive(Debug, Clone)]
pub struct ResumeDialogueFromJsonOptions {
    pub script_json: String,
    pub state: DialogueState,
    pub dialogue_options: Option<DialogueOptions>,
}

pub fn load_graph_from_json(script_json: &str) -> Result<Arc<ScriptGraph>, DialogueError> {
    ScriptGraph::from_json(script_json).map(Arc::new)
}

/// Builds a dialogue from a JSON script and starts it.
pub fn create_dialogue_from_json(
    options: CreateDialogueFromJsonOptions,
) -> Result<Dialogue, DialogueError> {
    let graph = load_graph_from_json(&options.script_json)?;
    let label = resolve_label(&graph, options.label)?;

    let mut dialogue =
        Dialogue::with_options(graph, options.dialogue_options.unwrap_or_default());
    for (name, value) in options.variables {
        dialogue.set_variable(&name, value);
    }
    dialogue.start(label.as_deref())?;
    Ok(dialogue)
}

/// Builds a dialogue and restores a saved state into it without advancing.
pub fn resume_dialogue_from_json(
    options: ResumeDialogueFromJsonOptions,
) -> Result<Dialogue, DialogueError> {
    let graph = load_graph_from_json(&options.script_json)?;
    restore_into(graph, &options.state, options.dialogue_options)
}

/// Same as [`resume_dialogue_from_json`] with the state still in its
/// persisted JSON form.
pub fn resume_dialogue_from_state_json(
    script_json: &str,
    state_json: &str,
) -> Result<Dialogue, DialogueError> {
    let graph = load_graph_from_json(script_json)?;
    let state = StateCodec::deserialize(state_json, &graph)?;
    restore_into(graph, &state, None)
}

fn restore_into(
    graph: Arc<ScriptGraph>,
    state: &DialogueState,
    options: Option<DialogueOptions>,
) -> Result<Dialogue, DialogueError> {
    let mut dialogue = Dialogue::with_options(graph, options.unwrap_or_default());
    dialogue.restore_saved_state(state)?;
    Ok(dialogue)
}

fn resolve_label(
    graph: &ScriptGraph,
    explicit: Option<String>,
) -> Result<Option<String>, DialogueError> {
    match explicit {
        Some(label) if graph.label_index(&label).is_none() => Err(DialogueError::new(
            "API_LABEL_NOT_FOUND",
            format!("Label \"{}\" is not defined by the script.", label),
        )),
        other => Ok(other),
    }
}
