use serde::{Deserialize, Serialize};
use ds_core::SavedStateV1;

pub(crate) const PLAYER_STATE_SCHEMA: &str = "player-state.v1";
pub(crate) const DEFAULT_STATE_FILE: &str = ".dialogscript/save.json";

#[derive(Debug, Clone)]
pub(crate) struct LoadedScript {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) script_json: String,
}

/// What the agent writes to `--state-out`: the dialogue state plus a
/// reference back to the script it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PlayerStateV1 {
    pub(crate) schema_version: String,
    pub(crate) script_id: String,
    pub(crate) dialogue: SavedStateV1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BoundaryEvent {
    Line,
    Choices,
    End,
}

#[derive(Debug, Clone)]
pub(crate) struct BoundaryResult {
    pub(crate) event: BoundaryEvent,
    pub(crate) speaker: Option<String>,
    pub(crate) text: Option<String>,
    pub(crate) choices: Vec<(usize, String)>,
    pub(crate) diagnostics: Vec<(String, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PlayCommandAction {
    NotHandled,
    Continue,
    RefreshBoundary,
    Quit,
}

pub(crate) struct PlayCommandContext<'a> {
    pub(crate) state_file: &'a str,
    pub(crate) script: &'a LoadedScript,
    pub(crate) label: Option<&'a str>,
}
