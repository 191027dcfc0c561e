use ds_runtime::Dialogue;

use crate::{json_string, BoundaryEvent, BoundaryResult};

/// Describes where the dialogue is parked, draining its diagnostics.
pub(crate) fn capture_boundary(dialogue: &Dialogue) -> BoundaryResult {
    let diagnostics = dialogue
        .take_diagnostics()
        .into_iter()
        .map(|diagnostic| (diagnostic.code, diagnostic.message))
        .collect();

    if dialogue.is_ended() || !dialogue.is_started() {
        return BoundaryResult {
            event: BoundaryEvent::End,
            speaker: None,
            text: None,
            choices: Vec::new(),
            diagnostics,
        };
    }

    let choices: Vec<(usize, String)> = dialogue
        .choices()
        .iter()
        .map(|item| {
            let text = dialogue.choice_text(item.index).unwrap_or_default();
            (item.index, text)
        })
        .collect();
    let event = if choices.is_empty() {
        BoundaryEvent::Line
    } else {
        BoundaryEvent::Choices
    };
    let speaker = Some(dialogue.speaker_display_name()).filter(|name| !name.is_empty());
    let text = Some(dialogue.text()).filter(|text| !text.is_empty());

    BoundaryResult {
        event,
        speaker,
        text,
        choices,
        diagnostics,
    }
}

pub(crate) fn emit_boundary(boundary: BoundaryResult, state_out: Option<String>) {
    println!("RESULT:OK");
    match boundary.event {
        BoundaryEvent::Line => println!("EVENT:LINE"),
        BoundaryEvent::Choices => println!("EVENT:CHOICES"),
        BoundaryEvent::End => println!("EVENT:END"),
    }

    if let Some(speaker) = boundary.speaker {
        println!("SPEAKER_JSON:{}", json_string(&speaker));
    }

    if let Some(text) = boundary.text {
        println!("TEXT_JSON:{}", json_string(&text));
    }

    for (index, text) in boundary.choices {
        println!("CHOICE:{}|{}", index, json_string(&text));
    }

    for (code, message) in boundary.diagnostics {
        println!("DIAGNOSTIC:{}|{}", code, json_string(&message));
    }

    println!(
        "STATE_OUT:{}",
        state_out.unwrap_or_else(|| "NONE".to_string())
    );
}

#[cfg(test)]
mod boundary_runner_tests {
    use super::*;
    use crate::cli_test_support::*;
    use crate::{create_dialogue_for_script, load_script_by_path};

    #[test]
    fn capture_boundary_follows_the_greeting_demo() {
        let script = load_script_by_path(&demo_dir("01-greeting")).expect("script");
        let mut dialogue = create_dialogue_for_script(&script, None).expect("dialogue");

        let line = capture_boundary(&dialogue);
        assert_eq!(line.event, BoundaryEvent::Line);
        assert_eq!(line.text.as_deref(), Some("Hello, traveller."));

        dialogue.continue_dialogue().expect("continue");
        let choices = capture_boundary(&dialogue);
        assert_eq!(choices.event, BoundaryEvent::Choices);
        assert_eq!(choices.choices.len(), 2);
        assert_eq!(choices.text.as_deref(), Some("Hello, traveller."));

        dialogue.end(true);
        let end = capture_boundary(&dialogue);
        assert_eq!(end.event, BoundaryEvent::End);
        assert!(end.text.is_none());
    }

    #[test]
    fn capture_boundary_drains_diagnostics() {
        let script = load_script_by_path(&demo_dir("01-greeting")).expect("script");
        let mut dialogue = create_dialogue_for_script(&script, None).expect("dialogue");
        dialogue.set_variable_text("gold", "lots");
        assert_eq!(dialogue.variable_int("gold"), 0);

        let boundary = capture_boundary(&dialogue);
        assert_eq!(boundary.diagnostics.len(), 1);
        assert_eq!(boundary.diagnostics[0].0, "VALUE_TYPE_MISMATCH");
        assert!(dialogue.diagnostics().is_empty());
    }
}
