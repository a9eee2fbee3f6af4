//! Property-based test generators using proptest.
//!
//! Generated data keeps the guarantees the assembler gives the merger:
//! non-empty histories sorted by time, one history per ID within a segment,
//! and segments whose start times do not go backwards.

use nstrack_core::{Observation, Segment, StarHistory, StarId, TypeCode};
use proptest::prelude::*;

/// Strategy for star IDs in a small range so segments share stars.
pub fn star_id_strategy() -> impl Strategy<Value = StarId> {
    (1i64..40).prop_map(StarId::new)
}

/// Strategy for stellar type codes, biased towards neutron stars.
pub fn type_code_strategy() -> impl Strategy<Value = TypeCode> {
    prop_oneof![
        3 => Just(TypeCode::NEUTRON_STAR),
        1 => (0i32..15).prop_map(TypeCode::new),
    ]
}

/// Strategy for a non-empty ascending list of times in `[0, span)`.
pub fn sorted_times_strategy(span: u32) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0..span.max(1), 1..12).prop_map(|mut raw| {
        raw.sort_unstable();
        raw.into_iter().map(|t| f64::from(t) / 8.0).collect()
    })
}

/// Strategy for one star history starting at or after `offset`.
pub fn star_history_strategy(id: StarId, offset: f64) -> impl Strategy<Value = StarHistory> {
    (
        sorted_times_strategy(400),
        type_code_strategy(),
        prop::option::of(0u32..400),
    )
        .prop_map(move |(times, code, escape)| {
            let observations = times
                .into_iter()
                .map(|t| Observation::single(offset + t, code).with_attribute("mass", 1.4))
                .collect();
            let history = StarHistory::from_observations(id, observations);
            match escape {
                Some(t) => history.with_escape(offset + f64::from(t)),
                None => history,
            }
        })
}

/// Strategy for a segment named `name` starting at `offset`.
///
/// The segment start is `offset` itself, as if a snapshot was written there
/// even when no generated history begins that early.
pub fn segment_strategy(name: String, offset: f64) -> impl Strategy<Value = Segment> {
    prop::collection::btree_set(star_id_strategy(), 0..8)
        .prop_flat_map(move |ids| {
            ids.into_iter()
                .map(|id| star_history_strategy(id, offset))
                .collect::<Vec<_>>()
        })
        .prop_map(move |histories| Segment::new(name.clone(), Some(offset), histories))
}

/// Strategy for a restarted run: 1 to 5 segments with non-decreasing offsets.
pub fn restarted_run_strategy() -> impl Strategy<Value = Vec<Segment>> {
    prop::collection::vec(0u32..200, 1..6).prop_flat_map(|mut offsets| {
        offsets.sort_unstable();
        offsets
            .into_iter()
            .enumerate()
            .map(|(index, offset)| segment_strategy(format!("save{:02}", index + 1), f64::from(offset)))
            .collect::<Vec<_>>()
    })
}
