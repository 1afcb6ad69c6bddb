//! Disjunction cardinality and mandatory-visit rule.

use std::collections::BTreeSet;

use super::{DeltaView, FeasibilityRule};
use crate::models::NodeState;

/// Rejects deltas that deactivate a mandatory index or break a
/// disjunction's cardinality.
///
/// An index in no disjunction can never be inactive. A disjunction never
/// has more than `max_cardinality` active members; a hard one also keeps
/// enough members undecided or active to still reach exactly
/// `max_cardinality`.
#[derive(Debug, Default)]
pub struct DisjunctionRule;

impl DisjunctionRule {
    /// Creates the rule.
    pub fn new() -> Self {
        Self
    }
}

impl FeasibilityRule for DisjunctionRule {
    fn name(&self) -> &str {
        "disjunction"
    }

    fn accept(&mut self, view: &DeltaView<'_>) -> bool {
        let model = view.model();
        let mut touched = BTreeSet::new();
        for &(index, value) in view.changes() {
            let disjunctions = model.disjunctions_of(index);
            if value == index && disjunctions.is_empty() {
                return false;
            }
            touched.extend(disjunctions.iter().copied());
        }

        touched.into_iter().all(|d| {
            let disjunction = model.disjunction(d);
            let mut active = 0;
            let mut inactive = 0;
            for &index in disjunction.indices() {
                match view.state(index) {
                    NodeState::Active { .. } => active += 1,
                    NodeState::Inactive => inactive += 1,
                    NodeState::Unassigned => {}
                }
            }
            let max = disjunction.max_cardinality();
            active <= max && (!disjunction.is_hard() || inactive <= disjunction.indices().len() - max)
        })
    }
}
