use std::path::Path;

use ds_core::DialogueError;
use ds_runtime::Dialogue;

use crate::{
    capture_boundary, create_dialogue_for_script, emit_boundary_with_saved_state,
    load_player_state, load_script_by_path, load_script_by_ref, resume_dialogue_for_state,
    AgentArgs, AgentCommand, ChooseArgs, ContinueArgs, StartArgs,
};

pub(super) fn run_agent(args: AgentArgs) -> Result<i32, DialogueError> {
    match args.command {
        AgentCommand::Start(args) => run_start(args),
        AgentCommand::Continue(args) => run_continue(args),
        AgentCommand::Choose(args) => run_choose(args),
    }
}

pub(super) fn run_start(args: StartArgs) -> Result<i32, DialogueError> {
    let script = load_script_by_path(&args.script)?;
    let dialogue = create_dialogue_for_script(&script, args.label.as_deref())?;

    let boundary = capture_boundary(&dialogue);
    emit_boundary_with_saved_state(&dialogue, boundary, &args.state_out, &script.id)
}

pub(super) fn run_continue(args: ContinueArgs) -> Result<i32, DialogueError> {
    run_state_transition(&args.state_in, &args.state_out, |dialogue| {
        dialogue.continue_dialogue()
    })
}

pub(super) fn run_choose(args: ChooseArgs) -> Result<i32, DialogueError> {
    run_state_transition(&args.state_in, &args.state_out, |dialogue| {
        dialogue.choose(args.choice)
    })
}

fn run_state_transition(
    state_in: &str,
    state_out: &str,
    transition: impl FnOnce(&mut Dialogue) -> Result<bool, DialogueError>,
) -> Result<i32, DialogueError> {
    let state = load_player_state(Path::new(state_in))?;
    let script = load_script_by_ref(&state.script_id)?;
    let mut dialogue = resume_dialogue_for_state(&script, &state)?;
    if let Err(error) = transition(&mut dialogue) {
        tracing::warn!(code = %error.code, state_in, "agent transition rejected");
        return Err(error);
    }
    let boundary = capture_boundary(&dialogue);
    emit_boundary_with_saved_state(&dialogue, boundary, state_out, &state.script_id)
}
