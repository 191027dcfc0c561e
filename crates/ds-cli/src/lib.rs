use std::ffi::OsString;

use clap::Parser;
use ds_core::DialogueError;

mod agent;
mod boundary_runner;
mod cli_args;
mod error_map;
mod line_play;
mod logging;
mod models;
mod session_ops;
mod source_loader;
mod state_store;

pub(crate) use boundary_runner::{capture_boundary, emit_boundary};
pub(crate) use cli_args::{
    AgentArgs, AgentCommand, ChooseArgs, Cli, ContinueArgs, Mode, PlayArgs, StartArgs,
};
pub(crate) use error_map::{
    emit_error, json_string, map_cli_source_path, map_cli_source_read, map_cli_state_encode,
    map_cli_state_invalid, map_cli_state_read, map_cli_state_write, map_play_io,
};
pub(crate) use line_play::run_play_line_mode;
#[cfg(test)]
pub(crate) use line_play::{handle_play_command, run_play_line_mode_with_io};
pub(crate) use models::{
    BoundaryEvent, BoundaryResult, LoadedScript, PlayCommandAction, PlayCommandContext,
    PlayerStateV1, DEFAULT_STATE_FILE, PLAYER_STATE_SCHEMA,
};
pub(crate) use session_ops::{
    create_dialogue_for_script, emit_boundary_with_saved_state,
    load_dialogue_from_state_for_script, resume_dialogue_for_state, save_dialogue_state,
};
#[cfg(test)]
pub(crate) use session_ops::load_dialogue_from_state_for_ref;
pub(crate) use source_loader::{load_script_by_path, load_script_by_ref};
pub(crate) use state_store::{load_player_state, save_player_state};

pub fn run_cli_from_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return error.exit_code();
        }
    };
    logging::init_tracing();
    match run(cli) {
        Ok(code) => code,
        Err(error) => emit_error(error),
    }
}

fn run(cli: Cli) -> Result<i32, DialogueError> {
    match cli.command {
        Mode::Agent(args) => agent::run_agent(args),
        Mode::Play(args) => run_play(args),
    }
}

fn run_play(args: PlayArgs) -> Result<i32, DialogueError> {
    let state_file = args
        .state_file
        .unwrap_or_else(|| DEFAULT_STATE_FILE.to_string());
    let script = load_script_by_path(&args.script)?;
    let mut dialogue = create_dialogue_for_script(&script, args.label.as_deref())?;

    run_play_line_mode(&state_file, &script, args.label.as_deref(), &mut dialogue)
}
