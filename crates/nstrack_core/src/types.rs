//! Core type definitions for nstrack.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identifier of a simulated star.
///
/// Unique within a segment and within a reconstructed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StarId(pub i64);

impl StarId {
    /// Creates a new star ID.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0
    }
}

impl fmt::Display for StarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "star:{}", self.0)
    }
}

/// Stellar type tag as written by the simulation.
///
/// The only code this crate gives a name to is [`TypeCode::NEUTRON_STAR`];
/// everything else is an opaque integer used for selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeCode(pub i32);

impl TypeCode {
    /// Neutron star.
    pub const NEUTRON_STAR: Self = Self(13);

    /// Creates a new type code.
    #[must_use]
    pub const fn new(code: i32) -> Self {
        Self(code)
    }

    /// Returns the raw code.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }
}

impl fmt::Display for TypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The partner star reported on the same binary-catalog row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Companion {
    /// Companion's star ID.
    pub id: StarId,
    /// Companion's type at the same instant.
    pub type_code: TypeCode,
}

/// One star at one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Physical time of the snapshot.
    pub time: f64,
    /// Stellar type at that time.
    pub type_code: TypeCode,
    /// Named numeric columns of the catalog row.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, f64>,
    /// Whether the star was reported by the binary catalog.
    pub binary: bool,
    /// The other member of the binary, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub companion: Option<Companion>,
}

impl Observation {
    /// Creates a single-star observation with no attributes.
    #[must_use]
    pub fn single(time: f64, type_code: TypeCode) -> Self {
        Self {
            time,
            type_code,
            attributes: BTreeMap::new(),
            binary: false,
            companion: None,
        }
    }

    /// Creates a binary-catalog observation paired with `companion`.
    #[must_use]
    pub fn binary(time: f64, type_code: TypeCode, companion: Companion) -> Self {
        Self {
            time,
            type_code,
            attributes: BTreeMap::new(),
            binary: true,
            companion: Some(companion),
        }
    }

    /// Attaches a named attribute.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: f64) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }
}

/// Time-ordered life of one star.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StarHistory {
    /// The star.
    pub id: StarId,
    /// Observations sorted ascending by time.
    pub observations: Vec<Observation>,
    /// Physical time of escape from the cluster, if it escaped.
    pub escape: Option<f64>,
}

impl StarHistory {
    /// Creates a history holding a single observation.
    #[must_use]
    pub fn new(id: StarId, first: Observation) -> Self {
        Self {
            id,
            observations: vec![first],
            escape: None,
        }
    }

    /// Creates a history from observations already in time order.
    #[must_use]
    pub fn from_observations(id: StarId, observations: Vec<Observation>) -> Self {
        Self {
            id,
            observations,
            escape: None,
        }
    }

    /// Sets the escape time.
    #[must_use]
    pub fn with_escape(mut self, time: f64) -> Self {
        self.escape = Some(time);
        self
    }

    /// Earliest observation time, `None` for an empty history.
    #[must_use]
    pub fn start_time(&self) -> Option<f64> {
        self.observations
            .iter()
            .map(|obs| obs.time)
            .min_by(f64::total_cmp)
    }

    /// The most recent observation.
    #[must_use]
    pub fn last(&self) -> Option<&Observation> {
        self.observations.last()
    }

    /// Observation times in stored order.
    pub fn times(&self) -> impl Iterator<Item = f64> + '_ {
        self.observations.iter().map(|obs| obs.time)
    }
}

/// All retained star histories of one save segment.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Segment {
    /// Segment name, e.g. `save03`.
    pub name: String,
    /// Earliest snapshot time decoded for the segment, regardless of selection.
    pub start_time: Option<f64>,
    /// One history per retained star, ordered by ID.
    pub histories: Vec<StarHistory>,
}

impl Segment {
    /// Creates a segment.
    #[must_use]
    pub fn new(name: impl Into<String>, start_time: Option<f64>, histories: Vec<StarHistory>) -> Self {
        Self {
            name: name.into(),
            start_time,
            histories,
        }
    }

    /// Number of retained stars.
    #[must_use]
    pub fn len(&self) -> usize {
        self.histories.len()
    }

    /// Whether no star was retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.histories.is_empty()
    }
}

/// The merged histories of a whole run, ordered by star ID.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RunHistory {
    /// One history per star ID.
    pub histories: Vec<StarHistory>,
}

impl RunHistory {
    /// Looks up a star by ID.
    #[must_use]
    pub fn get(&self, id: StarId) -> Option<&StarHistory> {
        self.histories
            .binary_search_by_key(&id, |history| history.id)
            .ok()
            .map(|index| &self.histories[index])
    }

    /// Number of stars.
    #[must_use]
    pub fn len(&self) -> usize {
        self.histories.len()
    }

    /// Whether the run holds no star.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.histories.is_empty()
    }

    /// Consumes the run and returns its histories.
    #[must_use]
    pub fn into_histories(self) -> Vec<StarHistory> {
        self.histories
    }
}

/// A star leaving the cluster, as reported by a segment's escape file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EscapeEvent {
    /// The escaping star.
    pub id: StarId,
    /// Physical time of escape.
    pub time: f64,
    /// Type of the star when it escaped.
    pub type_code: TypeCode,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn star_id_display() {
        assert_eq!(StarId::new(1042).to_string(), "star:1042");
    }

    #[test]
    fn start_time_is_minimum_not_first() {
        let history = StarHistory::from_observations(
            StarId::new(1),
            vec![
                Observation::single(4.0, TypeCode::new(1)),
                Observation::single(2.0, TypeCode::new(1)),
            ],
        );
        assert_eq!(history.start_time(), Some(2.0));
    }

    #[test]
    fn empty_history_has_no_start() {
        let history = StarHistory::from_observations(StarId::new(1), Vec::new());
        assert_eq!(history.start_time(), None);
        assert!(history.last().is_none());
    }

    #[test]
    fn run_lookup_by_id() {
        let run = RunHistory {
            histories: vec![
                StarHistory::new(StarId::new(3), Observation::single(0.0, TypeCode::new(1))),
                StarHistory::new(StarId::new(9), Observation::single(0.0, TypeCode::NEUTRON_STAR)),
            ],
        };
        assert_eq!(run.get(StarId::new(9)).map(|h| h.id), Some(StarId::new(9)));
        assert!(run.get(StarId::new(4)).is_none());
    }

    #[test]
    fn observation_json_skips_empty_fields() {
        let json = serde_json::to_string(&Observation::single(1.5, TypeCode::NEUTRON_STAR)).unwrap();
        assert_eq!(json, r#"{"time":1.5,"type_code":13,"binary":false}"#);
    }
}
