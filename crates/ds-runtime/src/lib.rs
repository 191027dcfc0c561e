mod engine;

pub use engine::{
    Dialogue, DialogueEvent, DialogueOptions, Participant, VariableScope, DEFAULT_MAX_WALK_STEPS,
};
