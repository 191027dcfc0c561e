use std::io::{self, BufRead, Write};
use std::path::Path;

use ds_core::DialogueError;
use ds_runtime::Dialogue;

use crate::{
    create_dialogue_for_script, load_dialogue_from_state_for_script, map_play_io,
    save_dialogue_state, LoadedScript, PlayCommandAction, PlayCommandContext,
};

const HELP_LINE: &str = "commands: :help :save :load :restart :quit";

pub(crate) fn run_play_line_mode(
    state_file: &str,
    script: &LoadedScript,
    label: Option<&str>,
    dialogue: &mut Dialogue,
) -> Result<i32, DialogueError> {
    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let mut writer = io::stdout();
    run_play_line_mode_with_io(state_file, script, label, dialogue, &mut reader, &mut writer)
}

pub(crate) fn run_play_line_mode_with_io(
    state_file: &str,
    script: &LoadedScript,
    label: Option<&str>,
    dialogue: &mut Dialogue,
    reader: &mut dyn BufRead,
    writer: &mut dyn Write,
) -> Result<i32, DialogueError> {
    writeln!(writer, "Dialogue player: {}", script.title).map_err(map_play_io)?;
    writeln!(writer, "{}", HELP_LINE).map_err(map_play_io)?;
    let context = PlayCommandContext {
        state_file,
        script,
        label,
    };

    loop {
        if dialogue.is_ended() {
            writeln!(writer).map_err(map_play_io)?;
            writeln!(writer, "[END]").map_err(map_play_io)?;
            return Ok(0);
        }

        writeln!(writer).map_err(map_play_io)?;
        let text = dialogue.text();
        if !text.is_empty() {
            writeln!(writer, "{}: {}", dialogue.speaker_display_name(), text)
                .map_err(map_play_io)?;
        }
        let at_fork = dialogue.choice_count() > 0;
        if at_fork {
            for item in dialogue.choices() {
                let marker = if dialogue.has_choice_been_taken_previously(item) {
                    "*"
                } else {
                    " "
                };
                let text = dialogue.choice_text(item.index).unwrap_or_default();
                writeln!(writer, " {}[{}] {}", marker, item.index, text).map_err(map_play_io)?;
            }
        }

        loop {
            let Some(raw) = prompt_input_from("> ", reader, writer)? else {
                return Ok(0);
            };
            let mut emit = |line: String| {
                let _ = writeln!(writer, "{}", line);
            };
            match handle_play_command(raw.as_str(), &context, dialogue, &mut emit)? {
                PlayCommandAction::Continue => continue,
                PlayCommandAction::RefreshBoundary => break,
                PlayCommandAction::Quit => return Ok(0),
                PlayCommandAction::NotHandled => {}
            }

            if !at_fork {
                dialogue.continue_dialogue()?;
                break;
            }
            let choice = raw.trim().parse::<usize>().map_err(|_| {
                DialogueError::new("PLAY_CHOICE_PARSE", format!("Invalid choice index: {}", raw))
            })?;
            dialogue.choose(choice)?;
            break;
        }
    }
}

pub(crate) fn handle_play_command(
    raw: &str,
    context: &PlayCommandContext<'_>,
    dialogue: &mut Dialogue,
    emit: &mut dyn FnMut(String),
) -> Result<PlayCommandAction, DialogueError> {
    match raw.trim() {
        ":help" => {
            emit(HELP_LINE.to_string());
            Ok(PlayCommandAction::Continue)
        }
        ":save" => {
            save_dialogue_state(Path::new(context.state_file), dialogue, &context.script.id)?;
            emit(format!("saved: {}", context.state_file));
            Ok(PlayCommandAction::Continue)
        }
        ":load" => {
            let (_, resumed) =
                load_dialogue_from_state_for_script(Path::new(context.state_file), context.script)?;
            *dialogue = resumed;
            emit(format!("loaded: {}", context.state_file));
            Ok(PlayCommandAction::RefreshBoundary)
        }
        ":restart" => {
            let mut restarted = create_dialogue_for_script(context.script, context.label)?;
            std::mem::swap(dialogue, &mut restarted);
            emit("restarted".to_string());
            Ok(PlayCommandAction::RefreshBoundary)
        }
        ":quit" => {
            emit("bye".to_string());
            Ok(PlayCommandAction::Quit)
        }
        _ => Ok(PlayCommandAction::NotHandled),
    }
}

/// `None` once the input is exhausted.
pub(crate) fn prompt_input_from(
    prefix: &str,
    reader: &mut dyn BufRead,
    writer: &mut dyn Write,
) -> Result<Option<String>, DialogueError> {
    write!(writer, "{}", prefix).map_err(map_play_io)?;
    writer.flush().map_err(map_play_io)?;
    let mut input = String::new();
    let read = reader.read_line(&mut input).map_err(map_play_io)?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim_end_matches(&['\r', '\n'][..]).to_string()))
}
