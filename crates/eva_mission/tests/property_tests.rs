//! Property-based tests for eva_mission sequence parsing, running and logging.

use eva_core::{Astronaut, EvaError, PhysiologyProfile, Variable};
use eva_mission::{EvaLog, LogOptions, MissionRunner, TaskSequence};
use proptest::prelude::*;
use std::sync::Arc;

// ============================================================================
// Strategies
// ============================================================================

const LETTERS: [char; 8] = ['R', 'L', 'N', 'H', 'C', 'E', 'T', 'P'];

fn arb_sequence() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(LETTERS.to_vec()), 0..30)
        .prop_map(|letters| letters.into_iter().collect())
}

fn run(text: &str, granularity: i64) -> (Astronaut, TaskSequence, EvaLog) {
    let profile = Arc::new(PhysiologyProfile::default());
    let sequence = TaskSequence::parse(text, &profile).unwrap();
    let mut astronaut = Astronaut::new(profile);
    let log = MissionRunner::new(granularity)
        .unwrap()
        .run(&mut astronaut, &sequence)
        .unwrap();
    (astronaut, sequence, log)
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// One record per letter, after the three reference records, and mission
    /// time is work letters x granularity + one minute per shock.
    #[test]
    fn record_count_and_clock(text in arb_sequence(), granularity in 1i64..=20) {
        let (astronaut, sequence, log) = run(&text, granularity);
        prop_assert_eq!(log.records().len(), 3 + sequence.len());

        let shocks = text.chars().filter(|c| *c == 'T' || *c == 'P').count() as u64;
        let work = text.chars().count() as u64 - shocks;
        let expected = work * granularity as u64 + shocks;
        prop_assert_eq!(astronaut.state().mission_elapsed_time, expected);
        prop_assert_eq!(log.last().mission_elapsed_time, expected);
    }

    /// Logged values never leave the MIN/MAX records.
    #[test]
    fn logged_values_within_reference_bounds(text in arb_sequence(), granularity in 1i64..=20) {
        let (_, _, log) = run(&text, granularity);
        let min = &log.records()[1];
        let max = &log.records()[2];
        for record in log.steps() {
            for var in Variable::ALL {
                let v = record.get(var);
                prop_assert!(v >= min.get(var) && v <= max.get(var),
                    "{} = {} at {}", var, v, record.label);
            }
        }
    }

    /// Labels are strictly increasing mission minutes.
    #[test]
    fn labels_strictly_increase(text in arb_sequence(), granularity in 1i64..=20) {
        let (_, _, log) = run(&text, granularity);
        let mut previous = 0u64;
        for record in log.steps() {
            let label: u64 = record.label.parse().unwrap();
            prop_assert!(label > previous);
            prop_assert_eq!(label, record.mission_elapsed_time);
            previous = label;
        }
    }

    /// Any character outside the vocabulary rejects the whole sequence.
    #[test]
    fn unknown_letter_rejected(
        prefix in arb_sequence(),
        bad in "[A-Za-z0-9]".prop_filter("not a task letter", |s| {
            !s.chars().all(|c| LETTERS.contains(&c))
        }),
    ) {
        let profile = PhysiologyProfile::default();
        let text = format!("{}{}N", prefix, bad);
        prop_assert_eq!(
            TaskSequence::parse(&text, &profile).unwrap_err(),
            EvaError::UnknownTask(bad)
        );
    }

    /// Every written row has the same number of fields.
    #[test]
    fn csv_is_rectangular(text in arb_sequence(), transpose in any::<bool>()) {
        let (_, _, log) = run(&text, 10);
        let mut buf = Vec::new();
        log.write_csv(&mut buf, LogOptions { precision: 4, transpose }).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let widths: Vec<usize> = text.lines().map(|l| l.split(',').count()).collect();
        prop_assert!(widths.windows(2).all(|w| w[0] == w[1]), "{:?}", widths);
    }
}

// ============================================================================
// Concrete scenarios
// ============================================================================

#[test]
fn test_full_eva_plan() {
    let (astronaut, _, log) = run("LLNNHHNTNNCCRR", 10);
    assert_eq!(log.steps().len(), 14);
    assert_eq!(astronaut.state().mission_elapsed_time, 131);
    // two rest periods bring fear back down after the tether scare
    assert!(astronaut.state().fear < 1.0);
}

#[test]
fn test_same_plan_same_log() {
    let (_, _, a) = run("NHTCPER", 7);
    let (_, _, b) = run("NHTCPER", 7);
    assert_eq!(a, b);
}
