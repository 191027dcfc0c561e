use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::graph::EdgeRef;
use crate::value::Value;

/// One caller-visible option at a choice. `edge` always names the real
/// underlying edge, even when it was reached through silent forks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceItem {
    pub index: usize,
    pub edge_id: Option<String>,
    pub text: String,
    pub edge: EdgeRef,
}

/// Mutable per-dialogue data: cursor, variables and the memory of taken
/// choices. A graph is never mutated; this is everything a dialogue owns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueState {
    /// Node the dialogue is parked on; `None` when not started or ended.
    pub current_node_id: Option<String>,
    /// Most recent speaker line, still shown while parked on a choice.
    pub speaker_node_id: Option<String>,
    pub variables: BTreeMap<String, Value>,
    pub taken_edge_ids: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedStateV1 {
    pub schema_version: String,
    pub current_node_id: Option<String>,
    #[serde(default)]
    pub speaker_node_id: Option<String>,
    #[serde(default)]
    pub variables: BTreeMap<String, Value>,
    #[serde(default)]
    pub choices_taken: Vec<String>,
}
