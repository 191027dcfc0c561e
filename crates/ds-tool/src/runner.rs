use std::path::Path;

use ds_api::{create_dialogue_from_json, CreateDialogueFromJsonOptions};

use crate::source::{read_script, read_test_case};
use crate::{DsToolError, ExpectedEvent, TestAction, TestCase};

const MAX_STEPS: usize = 5_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub observed_events: Vec<ExpectedEvent>,
    pub consumed_actions: usize,
    pub steps: usize,
}

/// Plays a demo to the end. Lines are continued automatically; every fork
/// consumes the next scripted action.
pub fn run_case(demo_dir: &Path, case: &TestCase) -> Result<RunReport, DsToolError> {
    let script_json = read_script(demo_dir)?;
    let mut dialogue = create_dialogue_from_json(CreateDialogueFromJsonOptions {
        script_json,
        label: case.label.clone(),
        variables: case.variables.clone(),
        dialogue_options: None,
    })?;

    let mut observed_events = Vec::new();
    let mut action_index = 0usize;

    for step in 1..=MAX_STEPS {
        if dialogue.is_ended() {
            observed_events.push(ExpectedEvent::End);
            if action_index != case.actions.len() {
                return Err(DsToolError::UnusedActions {
                    used: action_index,
                    total: case.actions.len(),
                });
            }
            return Ok(RunReport {
                observed_events,
                consumed_actions: action_index,
                steps: step,
            });
        }

        let count = dialogue.choice_count();
        if count == 0 {
            observed_events.push(ExpectedEvent::Line {
                speaker: dialogue.speaker_display_name(),
                text: dialogue.text(),
            });
            dialogue.continue_dialogue()?;
            continue;
        }

        let choices = (0..count)
            .map(|index| dialogue.choice_text(index).unwrap_or_default())
            .collect();
        observed_events.push(ExpectedEvent::Choices { choices });
        let event_index = observed_events.len() - 1;
        let action = case
            .actions
            .get(action_index)
            .ok_or_else(|| DsToolError::MissingAction {
                event_index,
                expected_action_kind: "choose".to_string(),
            })?;
        match action {
            TestAction::Choose { index } => {
                dialogue.choose(*index)?;
            }
            TestAction::Continue if count == 1 => {
                dialogue.continue_dialogue()?;
            }
            TestAction::Continue => {
                return Err(DsToolError::ActionKindMismatch {
                    event_index,
                    expected_action_kind: "choose".to_string(),
                    actual_action_kind: action.kind_name().to_string(),
                })
            }
        }
        action_index += 1;
    }

    Err(DsToolError::GuardExceeded {
        max_steps: MAX_STEPS,
    })
}

pub fn assert_case(demo_dir: &Path, case_path: &Path) -> Result<(), DsToolError> {
    let case = read_test_case(case_path)?;
    let report = run_case(demo_dir, &case)?;

    if report.observed_events.len() != case.expected_events.len() {
        let observed = serde_json::to_string_pretty(&report.observed_events)
            .map_err(DsToolError::EventSerialize)?;
        return Err(DsToolError::EventCountMismatch {
            expected: case.expected_events.len(),
            actual: report.observed_events.len(),
            observed,
        });
    }

    for (index, (expected, actual)) in case
        .expected_events
        .iter()
        .zip(report.observed_events.iter())
        .enumerate()
    {
        if expected != actual {
            let expected = serde_json::to_string(expected).map_err(DsToolError::EventSerialize)?;
            let actual = serde_json::to_string(actual).map_err(DsToolError::EventSerialize)?;
            return Err(DsToolError::EventMismatch {
                index,
                expected,
                actual,
            });
        }
    }

    Ok(())
}
