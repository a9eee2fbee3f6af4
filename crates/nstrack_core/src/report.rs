//! Binned time summaries of stored histories.
//!
//! Three series are counted over time: observations of selected stars from
//! the single catalog, the same from the binary catalog, and escape times of
//! stars whose last observation is selected. All three share one set of bin
//! edges so they can be compared column by column.

use crate::error::{CoreError, CoreResult};
use crate::selector::Selector;
use crate::types::StarHistory;
use serde::Serialize;

/// Equal-width histogram over explicit edges.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    /// `counts.len() + 1` ascending edges.
    pub edges: Vec<f64>,
    /// Count per bin.
    pub counts: Vec<u64>,
}

impl Histogram {
    /// Counts `values` into bins bounded by `edges`.
    ///
    /// Bins are half-open `[lo, hi)` except the last, which is closed. Values
    /// outside the edges are not counted.
    #[must_use]
    pub fn with_edges(edges: Vec<f64>, values: &[f64]) -> Self {
        let bins = edges.len().saturating_sub(1);
        let mut counts = vec![0u64; bins];
        if let (Some(&first), Some(&last)) = (edges.first(), edges.last()) {
            for &value in values {
                if bins == 0 || value < first || value > last {
                    continue;
                }
                let above = edges.partition_point(|&edge| edge <= value);
                counts[above.saturating_sub(1).min(bins - 1)] += 1;
            }
        }
        Self { edges, counts }
    }

    /// Total number of counted values.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

/// `bins + 1` equal-width edges spanning `values`.
///
/// A single distinct value `v` spans `[v - 0.5, v + 0.5]`; no values span
/// `[0, 1]`.
#[must_use]
pub fn equal_width_edges(values: &[f64], bins: usize) -> Vec<f64> {
    let range = values.iter().fold(None, |range: Option<(f64, f64)>, &v| match range {
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        None => Some((v, v)),
    });
    let (lo, hi) = match range {
        Some((lo, hi)) if lo < hi => (lo, hi),
        Some((v, _)) => (v - 0.5, v + 0.5),
        None => (0.0, 1.0),
    };

    let width = (hi - lo) / bins as f64;
    let mut edges: Vec<f64> = (0..bins).map(|i| lo + width * i as f64).collect();
    edges.push(hi);
    edges
}

/// Shared-edge histograms of one or more runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinnedSummary {
    /// Edges shared by every series.
    pub edges: Vec<f64>,
    /// Single-catalog observations per bin.
    pub singles: Vec<u64>,
    /// Binary-catalog observations per bin.
    pub binaries: Vec<u64>,
    /// Escapes per bin.
    pub escapes: Vec<u64>,
}

impl BinnedSummary {
    /// Bins the histories selected by `selector` into `bins` bins.
    ///
    /// Each series proposes edges over its own range; the proposal reaching
    /// furthest in time is used for all three, preferring singles, then
    /// binaries, then escapes on a tie.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] if `bins` is zero.
    pub fn from_histories(
        histories: &[StarHistory],
        selector: &dyn Selector,
        bins: usize,
    ) -> CoreResult<Self> {
        if bins == 0 {
            return Err(CoreError::invalid_config("bin count must be at least 1"));
        }

        let mut singles = Vec::new();
        let mut binaries = Vec::new();
        let mut escapes = Vec::new();
        for history in histories {
            for obs in &history.observations {
                if selector.matches(obs.type_code) {
                    if obs.binary {
                        binaries.push(obs.time);
                    } else {
                        singles.push(obs.time);
                    }
                }
            }
            let ends_selected = history
                .last()
                .is_some_and(|obs| selector.matches(obs.type_code));
            if let (true, Some(time)) = (ends_selected, history.escape) {
                escapes.push(time);
            }
        }

        let mut edges = equal_width_edges(&singles, bins);
        for candidate in [equal_width_edges(&binaries, bins), equal_width_edges(&escapes, bins)] {
            if candidate.last() > edges.last() {
                edges = candidate;
            }
        }

        Ok(Self {
            singles: Histogram::with_edges(edges.clone(), &singles).counts,
            binaries: Histogram::with_edges(edges.clone(), &binaries).counts,
            escapes: Histogram::with_edges(edges.clone(), &escapes).counts,
            edges,
        })
    }

    /// Number of bins.
    #[must_use]
    pub fn bins(&self) -> usize {
        self.singles.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::TypeSelector;
    use crate::types::{Companion, Observation, StarId, TypeCode};

    const NS: TypeCode = TypeCode::NEUTRON_STAR;

    fn single(time: f64, code: TypeCode) -> Observation {
        Observation::single(time, code)
    }

    fn paired(time: f64) -> Observation {
        Observation::binary(
            time,
            NS,
            Companion {
                id: StarId::new(99),
                type_code: TypeCode::new(1),
            },
        )
    }

    #[test]
    fn last_edge_is_inclusive() {
        let hist = Histogram::with_edges(vec![0.0, 1.0, 2.0], &[0.0, 0.5, 1.0, 2.0, 2.5, -0.1]);
        assert_eq!(hist.counts, vec![2, 2]);
        assert_eq!(hist.total(), 4);
    }

    #[test]
    fn edges_cover_range() {
        assert_eq!(equal_width_edges(&[4.0, 0.0, 2.0], 2), vec![0.0, 2.0, 4.0]);
        assert_eq!(equal_width_edges(&[3.0, 3.0], 1), vec![2.5, 3.5]);
        assert_eq!(equal_width_edges(&[], 2), vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn widest_series_sets_edges() {
        let histories = vec![
            StarHistory::from_observations(StarId::new(1), vec![single(0.0, NS), single(10.0, NS)]),
            StarHistory::from_observations(StarId::new(2), vec![paired(2.0), paired(4.0)]).with_escape(20.0),
        ];
        let summary = BinnedSummary::from_histories(&histories, &TypeSelector::neutron_stars(), 2).unwrap();

        assert_eq!(summary.edges, vec![19.5, 20.0, 20.5]);
        assert_eq!(summary.escapes, vec![0, 1]);
        assert_eq!(summary.singles, vec![0, 0]);
        assert_eq!(summary.binaries, vec![0, 0]);
    }

    #[test]
    fn tie_prefers_singles() {
        let histories = vec![
            StarHistory::from_observations(StarId::new(1), vec![single(0.0, NS), single(8.0, NS)]),
            StarHistory::from_observations(StarId::new(2), vec![paired(4.0), paired(8.0)]),
        ];
        let summary = BinnedSummary::from_histories(&histories, &TypeSelector::neutron_stars(), 4).unwrap();

        assert_eq!(summary.edges, vec![0.0, 2.0, 4.0, 6.0, 8.0]);
        assert_eq!(summary.singles, vec![1, 0, 0, 1]);
        assert_eq!(summary.binaries, vec![0, 0, 1, 1]);
        assert_eq!(summary.bins(), 4);
    }

    #[test]
    fn only_selected_observations_and_escapes_count() {
        let histories = vec![
            StarHistory::from_observations(StarId::new(1), vec![single(0.0, TypeCode::new(1)), single(4.0, NS)]),
            // escaped before becoming a neutron star
            StarHistory::from_observations(StarId::new(2), vec![single(0.5, TypeCode::new(1))]).with_escape(1.0),
            StarHistory::from_observations(StarId::new(3), vec![single(0.2, NS)]).with_escape(1.0),
        ];
        let summary = BinnedSummary::from_histories(&histories, &TypeSelector::neutron_stars(), 1).unwrap();

        assert_eq!(summary.singles, vec![2]);
        assert_eq!(summary.escapes, vec![1]);
    }

    #[test]
    fn zero_bins_rejected() {
        assert!(matches!(
            BinnedSummary::from_histories(&[], &TypeSelector::neutron_stars(), 0),
            Err(CoreError::InvalidConfig { .. })
        ));
    }
}
