//! Filtered construction core: pending changes, atomic commits, and
//! cancellation polling.

use log::trace;

use crate::filters::{DeltaView, FeasibilityRule};
use crate::models::{Assignment, BuildStats, Delta, RoutingModel};

/// A predicate polled after every commit; returning `true` stops the build.
pub type StopCheck<'a> = Box<dyn FnMut() -> bool + 'a>;

/// Holds the committed assignment and a pending delta, and commits the delta
/// only if every feasibility rule accepts it.
///
/// A rejected commit leaves the committed assignment untouched. The pending
/// delta is cleared by every commit, accepted or not.
///
/// # Examples
///
/// ```
/// use u_routing_init::construction::FilteredBuilder;
/// use u_routing_init::distance::CostMatrix;
/// use u_routing_init::filters::DisjunctionRule;
/// use u_routing_init::models::{RoutingModel, Vehicle};
///
/// let model = RoutingModel::new(2, vec![Vehicle::new(0)], CostMatrix::new(2)).unwrap();
/// let mut builder = FilteredBuilder::new(&model, vec![Box::new(DisjunctionRule::new())]);
/// let (start, end) = (model.start(0), model.end(0));
///
/// builder.set_value(start, 0);
/// builder.set_value(0, end);
/// assert!(builder.commit());
/// assert_eq!(builder.value(start), Some(0));
///
/// // The visit cannot be dropped: it is in no disjunction.
/// builder.set_value(start, end);
/// builder.set_value(0, 0);
/// assert!(!builder.commit());
/// assert_eq!(builder.value(0), Some(end));
/// assert_eq!(builder.stats().rejects, 1);
/// ```
pub struct FilteredBuilder<'a> {
    model: &'a RoutingModel,
    assignment: Assignment,
    delta: Delta,
    rules: Vec<Box<dyn FeasibilityRule + 'a>>,
    stop: Option<StopCheck<'a>>,
    stopped: bool,
    stats: BuildStats,
}

impl<'a> FilteredBuilder<'a> {
    /// Creates a builder with an empty assignment.
    pub fn new(model: &'a RoutingModel, rules: Vec<Box<dyn FeasibilityRule + 'a>>) -> Self {
        let assignment = Assignment::new(model.size(), model.num_vehicles());
        let mut rules = rules;
        for rule in rules.iter_mut() {
            rule.synchronize(&assignment);
        }
        Self {
            model,
            assignment,
            delta: Delta::new(model.size()),
            rules,
            stop: None,
            stopped: false,
            stats: BuildStats::default(),
        }
    }

    /// Installs a cancellation predicate.
    pub fn with_stop(mut self, stop: StopCheck<'a>) -> Self {
        self.stop = Some(stop);
        self
    }

    /// The model being solved.
    pub fn model(&self) -> &'a RoutingModel {
        self.model
    }

    /// Number of successor variables.
    pub fn size(&self) -> usize {
        self.model.size()
    }

    /// Records a pending `next(index) = value`; the last write wins.
    pub fn set_value(&mut self, index: usize, value: usize) {
        debug_assert!(index < self.size(), "index {index} has no successor variable");
        self.delta.set(index, value);
    }

    /// Committed successor of an index.
    pub fn value(&self, index: usize) -> Option<usize> {
        self.assignment.value(index)
    }

    /// `true` if the index has a committed successor.
    pub fn contains(&self, index: usize) -> bool {
        self.assignment.contains(index)
    }

    /// Committed assignment.
    pub fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    /// Commit counters.
    pub fn stats(&self) -> BuildStats {
        self.stats
    }

    /// `true` once the cancellation predicate has fired.
    pub fn should_stop(&self) -> bool {
        self.stopped
    }

    /// Checks the pending delta against every rule and applies it if all
    /// accept. Returns whether the delta was applied.
    pub fn commit(&mut self) -> bool {
        self.stats.decisions += 1;
        let accepted = match DeltaView::new(self.model, &self.assignment, &self.delta) {
            Some(view) => {
                let rejected_by = self.rules.iter_mut().position(|rule| !rule.accept(&view));
                match rejected_by {
                    None => {
                        let routes = view.into_routes();
                        self.assignment.apply(&self.delta, routes);
                        true
                    }
                    Some(rule) => {
                        trace!(
                            "commit of {} changes rejected by {}",
                            self.delta.len(),
                            self.rules[rule].name()
                        );
                        false
                    }
                }
            }
            None => {
                trace!("commit of {} changes breaks path structure", self.delta.len());
                false
            }
        };

        if accepted {
            for rule in self.rules.iter_mut() {
                rule.synchronize(&self.assignment);
            }
        } else {
            self.stats.rejects += 1;
        }
        self.delta.clear();
        self.poll_stop();
        accepted
    }

    fn poll_stop(&mut self) {
        if self.stopped {
            return;
        }
        if let Some(stop) = self.stop.as_mut() {
            self.stopped = stop();
        }
    }

    /// Consumes the builder, returning the committed assignment.
    pub fn into_assignment(self) -> Assignment {
        self.assignment
    }
}
