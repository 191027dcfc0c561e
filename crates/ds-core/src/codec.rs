use crate::error::{DialogueError, Diagnostic};
use crate::graph::{NodeKind, ScriptGraph};
use crate::types::{DialogueState, SavedStateV1};
use crate::value::Value;

pub const DIALOGUE_STATE_SCHEMA_V1: &str = "dialogue-state.v1";

/// Persists [`DialogueState`] as JSON keyed by stable node ids, so a save
/// survives recompiling a script as long as the ids are kept.
pub struct StateCodec;

impl StateCodec {
    pub fn to_record(state: &DialogueState) -> SavedStateV1 {
        SavedStateV1 {
            schema_version: DIALOGUE_STATE_SCHEMA_V1.to_string(),
            current_node_id: state.current_node_id.clone(),
            speaker_node_id: state.speaker_node_id.clone(),
            variables: state.variables.clone(),
            choices_taken: state.taken_edge_ids.iter().cloned().collect(),
        }
    }

    pub fn from_record(record: SavedStateV1) -> Result<DialogueState, DialogueError> {
        if record.schema_version != DIALOGUE_STATE_SCHEMA_V1 {
            return Err(DialogueError::new(
                "STATE_SCHEMA",
                format!(
                    "Unsupported dialogue state schema \"{}\".",
                    record.schema_version
                ),
            ));
        }
        Ok(DialogueState {
            current_node_id: record.current_node_id,
            speaker_node_id: record.speaker_node_id,
            variables: record.variables,
            taken_edge_ids: record.choices_taken.into_iter().collect(),
        })
    }

    /// Fails instead of writing a save that could not be read back: JSON has
    /// no encoding for infinite or NaN floats.
    pub fn serialize(state: &DialogueState) -> Result<String, DialogueError> {
        if let Some((name, value)) = state
            .variables
            .iter()
            .find(|(_, value)| matches!(value, Value::Float(float) if !float.is_finite()))
        {
            return Err(DialogueError::new(
                "STATE_FORMAT",
                format!("Variable \"{}\" holds a non-finite float {}.", name, value),
            ));
        }
        serde_json::to_string(&Self::to_record(state))
            .map_err(|error| DialogueError::new("STATE_FORMAT", error.to_string()))
    }

    pub fn deserialize(raw: &str, graph: &ScriptGraph) -> Result<DialogueState, DialogueError> {
        let record: SavedStateV1 = serde_json::from_str(raw)
            .map_err(|error| DialogueError::new("STATE_FORMAT", error.to_string()))?;
        let state = Self::from_record(record)?;
        Self::validate(&state, graph)?;
        Ok(state)
    }

    /// Checks a state against a graph. Hard failures are returned as errors;
    /// taken-choice ids the graph no longer has are kept and reported.
    pub fn validate(
        state: &DialogueState,
        graph: &ScriptGraph,
    ) -> Result<Vec<Diagnostic>, DialogueError> {
        if let Some(node_id) = &state.current_node_id {
            let node = graph.node_by_id(node_id).ok_or_else(|| {
                DialogueError::new(
                    "STATE_UNKNOWN_NODE",
                    format!("Saved node \"{}\" does not exist in the script.", node_id),
                )
            })?;
            if !node.is_observable_kind() {
                return Err(DialogueError::new(
                    "STATE_CURSOR_NOT_OBSERVABLE",
                    format!(
                        "Saved node \"{}\" is a {} node, not a line or choice.",
                        node_id,
                        node.kind.name()
                    ),
                ));
            }
        }
        if let Some(node_id) = &state.speaker_node_id {
            let is_text = graph
                .node_by_id(node_id)
                .map(|node| matches!(node.kind, NodeKind::Text { .. }))
                .ok_or_else(|| {
                    DialogueError::new(
                        "STATE_UNKNOWN_NODE",
                        format!("Saved speaker line \"{}\" does not exist in the script.", node_id),
                    )
                })?;
            if !is_text {
                return Err(DialogueError::new(
                    "STATE_CURSOR_NOT_OBSERVABLE",
                    format!("Saved speaker node \"{}\" is not a text node.", node_id),
                ));
            }
        }

        Ok(state
            .taken_edge_ids
            .iter()
            .filter(|edge_id| !graph.has_edge_id(edge_id))
            .map(|edge_id| {
                Diagnostic::new(
                    "STATE_UNKNOWN_EDGE",
                    format!("Saved choice \"{}\" does not exist in the script.", edge_id),
                )
            })
            .collect())
    }
}
