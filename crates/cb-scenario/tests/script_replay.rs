//! Integration test: the code-blue script replays identically for a diagnosis.

use cb_scenario::{CodeBluePhase, DiagnosisCatalog, ScriptState, advance_phase, roll_arrhythmia};
use proptest::prelude::*;

fn replay(id: &str, step_ms: f64, steps: usize) -> Vec<(f64, CodeBluePhase)> {
    let mut state = ScriptState::initial(id);
    let mut transitions = Vec::new();
    for i in 1..=steps {
        let now = i as f64 * step_ms;
        let next = advance_phase(&state, now, id);
        if next.phase != state.phase {
            transitions.push((now, next.phase));
        }
        state = next;
    }
    transitions
}

#[test]
fn identical_inputs_give_identical_schedules() {
    for id in DiagnosisCatalog::builtin().ids() {
        assert_eq!(replay(id, 500.0, 1_600), replay(id, 500.0, 1_600));
        assert_eq!(roll_arrhythmia(id), roll_arrhythmia(id));
    }
}

#[test]
fn phases_visit_in_linear_order_and_stop_at_rosc() {
    let transitions = replay("dx_acute_mi", 1_000.0, 1_200);
    let phases: Vec<_> = transitions.iter().map(|(_, p)| *p).collect();
    assert_eq!(
        phases,
        vec![
            CodeBluePhase::Deterioration,
            CodeBluePhase::ArrestWindow,
            CodeBluePhase::CodeBlue,
            CodeBluePhase::Rosc,
        ]
    );
    assert_eq!(transitions[0].0, 30_000.0);
}

proptest! {
    #[test]
    fn any_key_advances_one_phase_at_a_time(
        id in "[a-z_]{1,16}",
        step_ms in 50.0_f64..5_000.0,
    ) {
        let steps = (400_000.0 / step_ms) as usize;
        let mut prev = CodeBluePhase::Prebrief;
        for (_, phase) in replay(&id, step_ms, steps) {
            prop_assert_eq!(prev.next(), Some(phase));
            prev = phase;
        }
        prop_assert_eq!(roll_arrhythmia(&id), roll_arrhythmia(&id));
    }
}
