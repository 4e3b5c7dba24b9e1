// tests/reconcile_properties.rs

use proptest::prelude::*;

use livesync::state::{ExecutionState, LogEntry, StepPatch, LOG_CAPACITY};
use livesync::sync::{apply, ServerEvent};
use livesync::types::{ExecutionId, LogLevel, StepStatus};

fn fresh_state() -> ExecutionState {
    ExecutionState::new(ExecutionId::new("prop"))
}

fn step_status_strategy() -> impl Strategy<Value = Option<StepStatus>> {
    prop_oneof![
        Just(None),
        Just(Some(StepStatus::Pending)),
        Just(Some(StepStatus::Running)),
        Just(Some(StepStatus::Completed)),
        Just(Some(StepStatus::Failed)),
        Just(Some(StepStatus::Skipped)),
    ]
}

fn step_patch_strategy() -> impl Strategy<Value = StepPatch> {
    (
        0u32..20,
        step_status_strategy(),
        proptest::option::of("[a-z ]{0,12}"),
        proptest::option::of(0u64..10_000),
    )
        .prop_map(|(step_number, status, description, duration_ms)| StepPatch {
            step_number,
            status,
            description,
            duration_ms,
            ..StepPatch::default()
        })
}

proptest! {
    #[test]
    fn steps_stay_unique_and_sorted(
        patches in proptest::collection::vec(step_patch_strategy(), 0..60)
    ) {
        let mut state = fresh_state();
        let mut distinct: Vec<u32> = patches.iter().map(|p| p.step_number).collect();
        distinct.sort_unstable();
        distinct.dedup();

        for patch in patches {
            apply(&mut state, ServerEvent::StepUpdate(patch));
        }

        let numbers: Vec<u32> = state.steps.iter().map(|s| s.step_number).collect();
        prop_assert_eq!(numbers, distinct);
    }

    #[test]
    fn applying_a_step_update_twice_equals_once(
        prefix in proptest::collection::vec(step_patch_strategy(), 0..20),
        patch in step_patch_strategy(),
    ) {
        let mut state = fresh_state();
        for p in prefix {
            apply(&mut state, ServerEvent::StepUpdate(p));
        }

        let mut once = state.clone();
        apply(&mut once, ServerEvent::StepUpdate(patch.clone()));

        let mut twice = once.clone();
        apply(&mut twice, ServerEvent::StepUpdate(patch));

        prop_assert_eq!(once, twice);
    }

    #[test]
    fn log_buffer_keeps_the_newest_hundred(count in 0usize..400) {
        let mut state = fresh_state();
        for i in 0..count {
            apply(&mut state, ServerEvent::Log(LogEntry::new(LogLevel::Info, format!("line {i}"))));
        }

        prop_assert!(state.logs.len() <= LOG_CAPACITY);
        prop_assert_eq!(state.logs.len(), count.min(LOG_CAPACITY));

        let expected: Vec<String> = (count.saturating_sub(LOG_CAPACITY)..count)
            .map(|i| format!("line {i}"))
            .collect();
        let actual: Vec<String> = state.logs.iter().map(|e| e.message.clone()).collect();
        prop_assert_eq!(actual, expected);
    }
}
