//! Run reconstruction.
//!
//! Consecutive save segments are checkpointed restarts of one simulation. A
//! restarted segment recomputes part of the previous segment's tail, so for
//! every star seen again the old history is cut at the new history's earliest
//! time and the new observations are appended:
//!
//! ```text
//! existing: 1 2 3 4 5
//! new:          3 3.5 6
//! merged:   1 2 3 3.5 6
//! ```
//!
//! Truncation uses `time >= start`, so a tie goes to the new segment. The
//! start is the minimum over the whole new history, not only the overlapping
//! part.

use crate::error::{CoreError, CoreResult};
use crate::types::{RunHistory, Segment, StarHistory, StarId};
use std::collections::BTreeMap;
use tracing::debug;

/// Folds segments, in run order, into one history per star.
#[derive(Debug, Default)]
pub struct RunMerger {
    histories: BTreeMap<StarId, StarHistory>,
    last_segment: Option<(String, f64)>,
    segments_applied: usize,
}

impl RunMerger {
    /// Creates an empty merger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges one segment on top of everything applied so far.
    ///
    /// The segment is checked before anything is changed, so a failed call
    /// leaves the merger as it was.
    ///
    /// # Errors
    ///
    /// - [`CoreError::OutOfOrderSegments`] if the segment starts before the
    ///   previously applied one.
    /// - [`CoreError::ContractViolation`] if a history has no observations or
    ///   an ID appears twice within the segment.
    pub fn apply(&mut self, segment: Segment) -> CoreResult<()> {
        self.check_order(&segment)?;
        check_histories(&segment)?;

        let mut truncated = 0usize;
        let mut adopted = 0usize;
        for incoming in segment.histories {
            match self.histories.get_mut(&incoming.id) {
                Some(existing) => truncated += splice(existing, incoming),
                None => {
                    adopted += 1;
                    self.histories.insert(incoming.id, incoming);
                }
            }
        }

        debug!(
            segment = %segment.name,
            adopted,
            truncated,
            stars = self.histories.len(),
            "merged segment"
        );

        if let Some(start) = segment.start_time {
            self.last_segment = Some((segment.name, start));
        }
        self.segments_applied += 1;
        Ok(())
    }

    /// Number of segments applied so far.
    #[must_use]
    pub fn segments_applied(&self) -> usize {
        self.segments_applied
    }

    /// Returns the merged run, ordered by star ID.
    #[must_use]
    pub fn finish(self) -> RunHistory {
        RunHistory {
            histories: self.histories.into_values().collect(),
        }
    }

    fn check_order(&self, segment: &Segment) -> CoreResult<()> {
        let (Some((previous, previous_start)), Some(start)) =
            (&self.last_segment, segment.start_time)
        else {
            return Ok(());
        };
        if start < *previous_start {
            return Err(CoreError::OutOfOrderSegments {
                previous: previous.clone(),
                previous_start: *previous_start,
                segment: segment.name.clone(),
                start,
            });
        }
        Ok(())
    }
}

/// Merges `segments` in the order given.
///
/// # Errors
///
/// See [`RunMerger::apply`].
pub fn merge(segments: impl IntoIterator<Item = Segment>) -> CoreResult<RunHistory> {
    let mut merger = RunMerger::new();
    for segment in segments {
        merger.apply(segment)?;
    }
    Ok(merger.finish())
}

fn check_histories(segment: &Segment) -> CoreResult<()> {
    let mut seen = std::collections::HashSet::with_capacity(segment.histories.len());
    for history in &segment.histories {
        if history.observations.is_empty() {
            return Err(CoreError::empty_history(&segment.name, history.id));
        }
        if !seen.insert(history.id) {
            return Err(CoreError::contract_violation(
                &segment.name,
                format!("{} appears more than once", history.id),
            ));
        }
    }
    Ok(())
}

/// Cuts `existing` at the start of `incoming` and appends it.
///
/// Returns how many existing observations were dropped.
fn splice(existing: &mut StarHistory, incoming: StarHistory) -> usize {
    let Some(start) = incoming.start_time() else {
        // rejected by check_histories
        return 0;
    };

    let before = existing.observations.len();
    existing.observations.retain(|obs| obs.time < start);
    let dropped = before - existing.observations.len();

    existing.observations.extend(incoming.observations);
    if incoming.escape.is_some() {
        existing.escape = incoming.escape;
    }
    dropped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Observation, TypeCode};
    use proptest::prelude::*;

    fn history(id: i64, times: &[f64]) -> StarHistory {
        StarHistory::from_observations(
            StarId::new(id),
            times
                .iter()
                .map(|&t| Observation::single(t, TypeCode::NEUTRON_STAR))
                .collect(),
        )
    }

    fn segment(name: &str, histories: Vec<StarHistory>) -> Segment {
        let start = histories
            .iter()
            .filter_map(StarHistory::start_time)
            .min_by(f64::total_cmp);
        Segment::new(name, start, histories)
    }

    fn times(run: &RunHistory, id: i64) -> Vec<f64> {
        run.get(StarId::new(id)).unwrap().times().collect()
    }

    #[test]
    fn single_segment_is_identity() {
        let only = segment("save01", vec![history(1, &[0.0, 1.0]), history(2, &[0.5])]);
        let run = merge([only.clone()]).unwrap();
        assert_eq!(run.histories, only.histories);
    }

    #[test]
    fn overlap_truncates_existing_tail() {
        let run = merge([
            segment("save01", vec![history(1, &[1.0, 2.0, 3.0, 4.0, 5.0])]),
            segment("save02", vec![history(1, &[3.0, 3.5, 6.0])]),
        ])
        .unwrap();
        assert_eq!(times(&run, 1), vec![1.0, 2.0, 3.0, 3.5, 6.0]);
    }

    #[test]
    fn tie_goes_to_new_segment() {
        let mut newer = history(1, &[2.0]);
        newer.observations[0].type_code = TypeCode::new(14);
        let run = merge([
            segment("save01", vec![history(1, &[1.0, 2.0])]),
            segment("save02", vec![newer]),
        ])
        .unwrap();

        let star = run.get(StarId::new(1)).unwrap();
        assert_eq!(star.times().collect::<Vec<_>>(), vec![1.0, 2.0]);
        assert_eq!(star.observations[1].type_code, TypeCode::new(14));
    }

    #[test]
    fn disjoint_segments_concatenate() {
        let run = merge([
            segment("save01", vec![history(1, &[1.0, 2.0])]),
            segment("save02", vec![history(1, &[5.0, 6.0])]),
        ])
        .unwrap();
        assert_eq!(times(&run, 1), vec![1.0, 2.0, 5.0, 6.0]);
    }

    #[test]
    fn stale_tail_dropped_even_when_new_data_starts_late() {
        let run = merge([
            segment("save01", vec![history(1, &[1.0, 2.0, 3.0]), history(2, &[2.5])]),
            segment("save02", vec![history(1, &[2.5, 4.0])]),
        ])
        .unwrap();
        assert_eq!(times(&run, 1), vec![1.0, 2.0, 2.5, 4.0]);
    }

    #[test]
    fn absent_ids_carry_through() {
        let run = merge([
            segment("save01", vec![history(1, &[1.0]), history(2, &[1.0, 2.0])]),
            segment("save02", vec![history(1, &[3.0])]),
        ])
        .unwrap();
        assert_eq!(run.len(), 2);
        assert_eq!(times(&run, 2), vec![1.0, 2.0]);
    }

    #[test]
    fn later_escape_overwrites() {
        let run = merge([
            segment("save01", vec![history(7, &[1.0]).with_escape(10.0)]),
            segment("save02", vec![history(7, &[2.0]).with_escape(12.0)]),
        ])
        .unwrap();
        assert_eq!(run.get(StarId::new(7)).unwrap().escape, Some(12.0));
    }

    #[test]
    fn missing_escape_does_not_clear() {
        let run = merge([
            segment("save01", vec![history(7, &[1.0]).with_escape(10.0)]),
            segment("save02", vec![history(7, &[2.0])]),
        ])
        .unwrap();
        assert_eq!(run.get(StarId::new(7)).unwrap().escape, Some(10.0));
    }

    #[test]
    fn empty_history_is_contract_violation() {
        let mut merger = RunMerger::new();
        merger
            .apply(segment("save01", vec![history(1, &[1.0])]))
            .unwrap();

        let bad = Segment::new("save02", Some(2.0), vec![history(2, &[2.0]), history(1, &[])]);
        let err = merger.apply(bad).unwrap_err();
        assert!(matches!(err, CoreError::ContractViolation { ref segment, .. } if segment == "save02"));

        // nothing from the rejected segment leaked in
        let run = merger.finish();
        assert_eq!(run.len(), 1);
        assert_eq!(times(&run, 1), vec![1.0]);
    }

    #[test]
    fn duplicate_id_in_segment_is_contract_violation() {
        let bad = segment("save01", vec![history(1, &[1.0]), history(1, &[2.0])]);
        assert!(matches!(merge([bad]), Err(CoreError::ContractViolation { .. })));
    }

    #[test]
    fn out_of_order_segments_rejected() {
        let result = merge([
            segment("save02", vec![history(1, &[5.0])]),
            segment("save01", vec![history(1, &[1.0])]),
        ]);
        match result {
            Err(CoreError::OutOfOrderSegments {
                previous,
                previous_start,
                segment,
                start,
            }) => {
                assert_eq!(previous, "save02");
                assert_eq!(previous_start, 5.0);
                assert_eq!(segment, "save01");
                assert_eq!(start, 1.0);
            }
            other => panic!("expected OutOfOrderSegments, got {other:?}"),
        }
    }

    #[test]
    fn segment_without_start_skips_order_check() {
        let mut merger = RunMerger::new();
        merger.apply(segment("save01", vec![history(1, &[5.0])])).unwrap();
        merger.apply(Segment::new("save02", None, Vec::new())).unwrap();
        merger.apply(segment("save03", vec![history(1, &[6.0])])).unwrap();
        assert_eq!(merger.segments_applied(), 3);
        assert_eq!(times(&merger.finish(), 1), vec![5.0, 6.0]);
    }

    #[test]
    fn equal_start_replaces_whole_history() {
        let run = merge([
            segment("save01", vec![history(1, &[0.0, 1.0, 2.0])]),
            segment("save02", vec![history(1, &[0.0, 1.5])]),
        ])
        .unwrap();
        assert_eq!(times(&run, 1), vec![0.0, 1.5]);
    }

    fn sorted_times() -> impl Strategy<Value = Vec<f64>> {
        prop::collection::vec(0u32..1_000, 1..20).prop_map(|mut raw| {
            raw.sort_unstable();
            raw.into_iter().map(|t| f64::from(t) / 10.0).collect()
        })
    }

    proptest! {
        #[test]
        fn merged_times_never_decrease(
            restarts in prop::collection::vec((0u32..1_000, sorted_times()), 1..6)
        ) {
            // segment k starts at its offset; offsets ascend like real restarts
            let mut offsets: Vec<f64> = restarts.iter().map(|(o, _)| f64::from(*o)).collect();
            offsets.sort_by(f64::total_cmp);

            let segments: Vec<Segment> = restarts
                .iter()
                .zip(&offsets)
                .enumerate()
                .map(|(index, ((_, times), offset))| {
                    let shifted: Vec<f64> = times.iter().map(|t| t + offset).collect();
                    Segment::new(format!("save{index:02}"), Some(*offset), vec![history(1, &shifted)])
                })
                .collect();

            let run = merge(segments).unwrap();
            let merged: Vec<f64> = run.get(StarId::new(1)).unwrap().times().collect();
            prop_assert!(merged.windows(2).all(|pair| pair[0] <= pair[1]));

            // everything from the last segment survives
            let (_, last_times) = restarts.last().unwrap();
            prop_assert!(merged.len() >= last_times.len());
        }
    }
}
