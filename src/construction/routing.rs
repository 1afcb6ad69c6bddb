//! Path-aware construction on top of the filtered core.

use log::{debug, warn};

use super::{FilteredBuilder, StopCheck};
use crate::filters::FeasibilityRule;
use crate::models::{Assignment, BuildStats, RoutingModel};

/// The filtered core extended with route skeletons.
///
/// Each vehicle's route is made of a locked prefix ending at its *start
/// chain end*, a locked suffix beginning at its *end chain start*, and the
/// free segment between them where heuristics insert visits.
pub struct RoutingBuilder<'a> {
    core: FilteredBuilder<'a>,
    start_chain_ends: Vec<usize>,
    end_chain_starts: Vec<usize>,
}

impl<'a> RoutingBuilder<'a> {
    /// Creates a builder; routes are set up by
    /// [`initialize_routes`](Self::initialize_routes).
    pub fn new(model: &'a RoutingModel, rules: Vec<Box<dyn FeasibilityRule + 'a>>) -> Self {
        let start_chain_ends = (0..model.num_vehicles()).map(|v| model.start(v)).collect();
        let end_chain_starts = (0..model.num_vehicles()).map(|v| model.end(v)).collect();
        Self {
            core: FilteredBuilder::new(model, rules),
            start_chain_ends,
            end_chain_starts,
        }
    }

    /// Installs a cancellation predicate.
    pub fn with_stop(mut self, stop: StopCheck<'a>) -> Self {
        self.core = self.core.with_stop(stop);
        self
    }

    /// The model being solved.
    pub fn model(&self) -> &'a RoutingModel {
        self.core.model()
    }

    /// See [`FilteredBuilder::set_value`].
    pub fn set_value(&mut self, index: usize, value: usize) {
        self.core.set_value(index, value);
    }

    /// See [`FilteredBuilder::commit`].
    pub fn commit(&mut self) -> bool {
        self.core.commit()
    }

    /// See [`FilteredBuilder::value`].
    pub fn value(&self, index: usize) -> Option<usize> {
        self.core.value(index)
    }

    /// See [`FilteredBuilder::contains`].
    pub fn contains(&self, index: usize) -> bool {
        self.core.contains(index)
    }

    /// See [`FilteredBuilder::should_stop`].
    pub fn should_stop(&self) -> bool {
        self.core.should_stop()
    }

    /// Commit counters.
    pub fn stats(&self) -> BuildStats {
        self.core.stats()
    }

    /// Committed assignment.
    pub fn assignment(&self) -> &Assignment {
        self.core.assignment()
    }

    /// Consumes the builder, returning the committed assignment.
    pub fn into_assignment(self) -> Assignment {
        self.core.into_assignment()
    }

    /// Last index of the locked prefix of a vehicle's route.
    pub fn start_chain_end(&self, vehicle: usize) -> usize {
        self.start_chain_ends[vehicle]
    }

    /// First index of the locked suffix of a vehicle's route.
    pub fn end_chain_start(&self, vehicle: usize) -> usize {
        self.end_chain_starts[vehicle]
    }

    /// Number of locked arcs at the head of a vehicle's route.
    pub fn start_chain_length(&self, vehicle: usize) -> usize {
        self.assignment()
            .rank(self.start_chain_end(vehicle))
            .unwrap_or(0)
    }

    /// `true` if the committed route of the vehicle visits anything.
    pub fn is_vehicle_used(&self, vehicle: usize) -> bool {
        self.assignment().route(vehicle).len() > 2
    }

    /// Indices after which a visit may be inserted on a vehicle's route:
    /// the start chain end and everything up to, not including, the end
    /// chain start.
    pub fn insertion_anchors(&self, vehicle: usize) -> Vec<usize> {
        let model = self.model();
        let stop = self.end_chain_start(vehicle);
        let mut anchors = Vec::new();
        let mut anchor = self.start_chain_end(vehicle);
        while anchor != stop && !model.is_end(anchor) {
            anchors.push(anchor);
            match self.value(anchor) {
                Some(next) => anchor = next,
                None => break,
            }
        }
        anchors
    }

    /// Builds every vehicle's locked prefix and suffix, joins them, and
    /// commits. Returns `false` if the skeleton is infeasible.
    pub fn initialize_routes(&mut self) -> bool {
        let model = self.model();
        for vehicle in 0..model.num_vehicles() {
            let mut node = model.start(vehicle);
            while let Some(next) = model.locked_next(node) {
                self.set_value(node, next);
                node = next;
                if model.is_end(node) {
                    break;
                }
            }
            self.start_chain_ends[vehicle] = node;
        }

        for vehicle in 0..model.num_vehicles() {
            let mut first = model.end(vehicle);
            while let Some(prev) = model.locked_prev(first) {
                if model.is_start(prev) || prev == self.start_chain_ends[vehicle] {
                    break;
                }
                first = prev;
            }
            self.end_chain_starts[vehicle] = first;

            let chain_end = self.start_chain_ends[vehicle];
            if model.is_end(chain_end) {
                continue;
            }
            self.set_value(chain_end, first);
            let mut node = first;
            while !model.is_end(node) {
                let Some(next) = model.locked_next(node) else {
                    warn!("end chain of vehicle {vehicle} is broken at {node}");
                    return false;
                };
                self.set_value(node, next);
                node = next;
            }
        }

        let committed = self.commit();
        if committed {
            debug!("initialized {} routes", model.num_vehicles());
        } else {
            debug!("locked route skeletons are infeasible");
        }
        committed
    }

    /// Pending `next(predecessor) = index`, `next(index) = successor`,
    /// with the index's disjunction alternatives made unperformed.
    pub fn insert_between(&mut self, index: usize, predecessor: usize, successor: usize) {
        self.set_value(predecessor, index);
        self.set_value(index, successor);
        self.make_disjunction_nodes_unperformed(index);
    }

    /// Marks the other members of every disjunction containing `index` as
    /// unperformed once the disjunction has no room for more active members.
    ///
    /// Members already decided are left alone.
    pub fn make_disjunction_nodes_unperformed(&mut self, index: usize) {
        let model = self.model();
        for &d in model.disjunctions_of(index) {
            let disjunction = model.disjunction(d);
            let active = disjunction
                .indices()
                .iter()
                .filter(|&&i| i == index || self.assignment().vehicle_of(i).is_some())
                .count();
            if active < disjunction.max_cardinality() {
                continue;
            }
            for &alternative in disjunction.indices() {
                if alternative != index && !self.contains(alternative) {
                    self.set_value(alternative, alternative);
                }
            }
        }
    }

    /// Marks every index without a committed successor as unperformed.
    pub fn make_unassigned_nodes_unperformed(&mut self) {
        let model = self.model();
        for index in 0..model.size() {
            if !self.contains(index) && !model.is_start(index) {
                self.set_value(index, index);
            }
        }
    }
}
