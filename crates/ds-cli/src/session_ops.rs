use std::path::Path;

use ds_api::{
    create_dialogue_from_json, resume_dialogue_from_json, CreateDialogueFromJsonOptions,
    ResumeDialogueFromJsonOptions,
};
use ds_core::{DialogueError, StateCodec};
use ds_runtime::Dialogue;

use crate::{
    emit_boundary, load_player_state, load_script_by_ref, save_player_state, BoundaryEvent,
    BoundaryResult, LoadedScript, PlayerStateV1, PLAYER_STATE_SCHEMA,
};

pub(crate) fn create_dialogue_for_script(
    script: &LoadedScript,
    label: Option<&str>,
) -> Result<Dialogue, DialogueError> {
    create_dialogue_from_json(CreateDialogueFromJsonOptions {
        script_json: script.script_json.clone(),
        label: label.map(str::to_string),
        ..CreateDialogueFromJsonOptions::default()
    })
}

pub(crate) fn resume_dialogue_for_state(
    script: &LoadedScript,
    state: &PlayerStateV1,
) -> Result<Dialogue, DialogueError> {
    let dialogue_state = StateCodec::from_record(state.dialogue.clone())?;
    resume_dialogue_from_json(ResumeDialogueFromJsonOptions {
        script_json: script.script_json.clone(),
        state: dialogue_state,
        dialogue_options: None,
    })
}

pub(crate) fn save_dialogue_state(
    path: &Path,
    dialogue: &Dialogue,
    script_id: &str,
) -> Result<(), DialogueError> {
    let state = PlayerStateV1 {
        schema_version: PLAYER_STATE_SCHEMA.to_string(),
        script_id: script_id.to_string(),
        dialogue: StateCodec::to_record(&dialogue.saved_state()),
    };
    save_player_state(path, &state)
}

pub(crate) fn load_dialogue_from_state_for_ref(
    path: &Path,
) -> Result<(LoadedScript, PlayerStateV1, Dialogue), DialogueError> {
    let state = load_player_state(path)?;
    let script = load_script_by_ref(&state.script_id)?;
    let dialogue = resume_dialogue_for_state(&script, &state)?;
    Ok((script, state, dialogue))
}

pub(crate) fn load_dialogue_from_state_for_script(
    path: &Path,
    script: &LoadedScript,
) -> Result<(PlayerStateV1, Dialogue), DialogueError> {
    let state = load_player_state(path)?;
    if state.script_id != script.id {
        return Err(DialogueError::new(
            "PLAY_STATE_SCRIPT_MISMATCH",
            format!(
                "State script mismatch. expected={} actual={}",
                script.id, state.script_id
            ),
        ));
    }
    let dialogue = resume_dialogue_for_state(script, &state)?;
    Ok((state, dialogue))
}

/// Prints the boundary, saving the state first when the dialogue can go on.
pub(crate) fn emit_boundary_with_saved_state(
    dialogue: &Dialogue,
    boundary: BoundaryResult,
    state_out: &str,
    script_id: &str,
) -> Result<i32, DialogueError> {
    if boundary.event != BoundaryEvent::End {
        save_dialogue_state(Path::new(state_out), dialogue, script_id)?;
        emit_boundary(boundary, Some(state_out.to_string()));
        return Ok(0);
    }

    emit_boundary(boundary, None);
    Ok(0)
}
