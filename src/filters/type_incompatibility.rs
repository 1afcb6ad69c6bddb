//! Visit type incompatibility rule.

use std::collections::BTreeMap;

use super::{DeltaView, FeasibilityRule};

/// Rejects routes carrying two incompatible visit types.
#[derive(Debug, Default)]
pub struct TypeIncompatibilityRule;

impl TypeIncompatibilityRule {
    /// Creates the rule.
    pub fn new() -> Self {
        Self
    }
}

impl FeasibilityRule for TypeIncompatibilityRule {
    fn name(&self) -> &str {
        "type_incompatibility"
    }

    fn accept(&mut self, view: &DeltaView<'_>) -> bool {
        let model = view.model();
        if !model.has_type_incompatibilities() {
            return true;
        }
        view.touched_routes().all(|(_, route)| {
            let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
            for t in route.iter().filter_map(|&i| model.visit_type(i)) {
                *counts.entry(t).or_default() += 1;
            }
            let types: Vec<(usize, usize)> = counts.into_iter().collect();
            types.iter().enumerate().all(|(k, &(a, count))| {
                !(count > 1 && model.are_types_incompatible(a, a))
                    && types[k + 1..]
                        .iter()
                        .all(|&(b, _)| !model.are_types_incompatible(a, b))
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::tests::{committed, two_vehicle_model};
    use crate::models::Delta;

    #[test]
    fn test_incompatible_types() {
        let mut model = two_vehicle_model();
        model.set_visit_type(0, 1).expect("valid");
        model.set_visit_type(1, 2).expect("valid");
        model.set_visit_type(2, 3).expect("valid");
        model.add_type_incompatibility(1, 2);
        let assignment = committed(&model, &[&[0], &[]]);
        let mut rule = TypeIncompatibilityRule::new();

        let mut delta = Delta::new(model.size());
        delta.set(0, 1);
        delta.set(1, 7);
        let view = DeltaView::new(&model, &assignment, &delta).expect("well formed");
        assert!(!rule.accept(&view));

        let mut delta = Delta::new(model.size());
        delta.set(0, 2);
        delta.set(2, 7);
        let view = DeltaView::new(&model, &assignment, &delta).expect("well formed");
        assert!(rule.accept(&view));

        let mut delta = Delta::new(model.size());
        delta.set(6, 1);
        delta.set(1, 8);
        let view = DeltaView::new(&model, &assignment, &delta).expect("well formed");
        assert!(rule.accept(&view));
    }

    #[test]
    fn test_self_incompatible_type() {
        let mut model = two_vehicle_model();
        model.set_visit_type(0, 4).expect("valid");
        model.set_visit_type(1, 4).expect("valid");
        model.add_type_incompatibility(4, 4);
        let assignment = committed(&model, &[&[0], &[]]);
        let mut delta = Delta::new(model.size());
        delta.set(0, 1);
        delta.set(1, 7);
        let view = DeltaView::new(&model, &assignment, &delta).expect("well formed");
        assert!(!TypeIncompatibilityRule::new().accept(&view));
    }
}
