//! Selection predicates over stellar type codes.
//!
//! Selection is history-level: a star is kept when any one of its
//! observations matches, and then its whole history is kept.

use crate::types::{StarHistory, TypeCode};

/// Decides whether a type code makes a star interesting.
pub trait Selector: Send + Sync {
    /// Returns true if `code` is a target type.
    fn matches(&self, code: TypeCode) -> bool;

    /// Returns true if any observation of `history` matches.
    fn retains(&self, history: &StarHistory) -> bool {
        history
            .observations
            .iter()
            .any(|obs| self.matches(obs.type_code))
    }
}

impl<F> Selector for F
where
    F: Fn(TypeCode) -> bool + Send + Sync,
{
    fn matches(&self, code: TypeCode) -> bool {
        self(code)
    }
}

/// Matches a fixed set of type codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSelector {
    targets: Vec<TypeCode>,
}

impl TypeSelector {
    /// Matches exactly the given codes.
    #[must_use]
    pub fn new(targets: impl IntoIterator<Item = TypeCode>) -> Self {
        let mut targets: Vec<TypeCode> = targets.into_iter().collect();
        targets.sort_unstable();
        targets.dedup();
        Self { targets }
    }

    /// Matches neutron stars only.
    #[must_use]
    pub fn neutron_stars() -> Self {
        Self::new([TypeCode::NEUTRON_STAR])
    }

    /// The codes this selector matches, ascending.
    #[must_use]
    pub fn targets(&self) -> &[TypeCode] {
        &self.targets
    }
}

impl Selector for TypeSelector {
    fn matches(&self, code: TypeCode) -> bool {
        self.targets.binary_search(&code).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Observation, StarId};

    #[test]
    fn type_selector_matches_targets() {
        let selector = TypeSelector::new([TypeCode::new(14), TypeCode::NEUTRON_STAR, TypeCode::new(14)]);
        assert_eq!(selector.targets(), &[TypeCode::new(13), TypeCode::new(14)]);
        assert!(selector.matches(TypeCode::NEUTRON_STAR));
        assert!(selector.matches(TypeCode::new(14)));
        assert!(!selector.matches(TypeCode::new(1)));
    }

    #[test]
    fn closure_selector() {
        let compact = |code: TypeCode| code.as_i32() >= 10;
        assert!(compact.matches(TypeCode::new(12)));
        assert!(!compact.matches(TypeCode::new(9)));
    }

    #[test]
    fn retains_when_any_observation_matches() {
        let history = StarHistory::from_observations(
            StarId::new(7),
            vec![
                Observation::single(1.0, TypeCode::new(1)),
                Observation::single(2.0, TypeCode::NEUTRON_STAR),
            ],
        );
        assert!(TypeSelector::neutron_stars().retains(&history));
        assert!(!TypeSelector::new([TypeCode::new(14)]).retains(&history));
    }
}
