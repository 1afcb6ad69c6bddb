//! Insertion pricing shared by the cheapest-insertion heuristics.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use super::RoutingBuilder;
use crate::distance::{Cost, MAX_COST};
use crate::models::RoutingModel;

/// Arc cost `(from, to, vehicle)`.
pub type ArcEvaluator<'a> = Box<dyn Fn(usize, usize, usize) -> Cost + 'a>;

/// Cost of leaving an index unperformed.
pub type PenaltyEvaluator<'a> = Box<dyn Fn(usize) -> Cost + 'a>;

/// A priced insertion of some index after `insert_after` on `vehicle`.
///
/// Ordered by cost, then anchor, then vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ValuedPosition {
    /// Insertion cost.
    pub cost: Cost,
    /// Index after which the visit goes.
    pub insert_after: usize,
    /// Vehicle of the route.
    pub vehicle: usize,
}

/// Distance from a vehicle's start to an index and back to its end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct StartEndValue {
    /// `cost(start, index) + cost(index, end)`.
    pub distance: Cost,
    /// The vehicle.
    pub vehicle: usize,
}

/// Prices insertions and unperformed visits.
///
/// # Examples
///
/// ```
/// use u_routing_init::construction::InsertionPricer;
/// use u_routing_init::distance::CostMatrix;
/// use u_routing_init::models::{RoutingModel, Vehicle};
///
/// let costs = CostMatrix::from_points(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]);
/// let model = RoutingModel::new(3, vec![Vehicle::new(0)], costs).unwrap();
/// let pricer = InsertionPricer::from_model(&model);
/// let (start, end) = (model.start(0), model.end(0));
/// // start -> 1 -> end instead of start -> end.
/// assert_eq!(pricer.insertion_cost(0, start, end, 0), 2);
/// ```
pub struct InsertionPricer<'a> {
    model: &'a RoutingModel,
    evaluator: ArcEvaluator<'a>,
    penalty_evaluator: Option<PenaltyEvaluator<'a>>,
}

impl<'a> InsertionPricer<'a> {
    /// Creates a pricer from explicit evaluators.
    pub fn new(
        model: &'a RoutingModel,
        evaluator: ArcEvaluator<'a>,
        penalty_evaluator: Option<PenaltyEvaluator<'a>>,
    ) -> Self {
        Self {
            model,
            evaluator,
            penalty_evaluator,
        }
    }

    /// Prices with the model's vehicle arc costs and disjunction penalties.
    pub fn from_model(model: &'a RoutingModel) -> Self {
        Self::new(
            model,
            Box::new(move |from, to, vehicle| model.arc_cost_for_vehicle(from, to, vehicle)),
            Some(Box::new(move |index| model.unperformed_penalty(index))),
        )
    }

    /// Arc cost on a vehicle.
    pub fn arc_cost(&self, from: usize, to: usize, vehicle: usize) -> Cost {
        (self.evaluator)(from, to, vehicle)
    }

    /// `cost(after, index) + cost(index, before) - cost(after, before)`,
    /// saturating.
    pub fn insertion_cost(&self, index: usize, insert_after: usize, insert_before: usize, vehicle: usize) -> Cost {
        self.arc_cost(insert_after, index, vehicle)
            .saturating_add(self.arc_cost(index, insert_before, vehicle))
            .saturating_sub(self.arc_cost(insert_after, insert_before, vehicle))
    }

    /// Cost of leaving the index unperformed; [`MAX_COST`] when no penalty
    /// evaluator is set or the index must be performed.
    pub fn unperformed_value(&self, index: usize) -> Cost {
        match &self.penalty_evaluator {
            Some(penalty) if self.model.can_be_inactive(index) => penalty(index),
            _ => MAX_COST,
        }
    }

    /// Prices inserting `index` after every anchor of the vehicle route
    /// walked from `start`, whose successor is taken to be
    /// `next_after_start`, up to the vehicle's end chain.
    pub fn append_evaluated_positions_after(
        &self,
        builder: &RoutingBuilder<'_>,
        index: usize,
        start: usize,
        next_after_start: usize,
        vehicle: usize,
        positions: &mut Vec<ValuedPosition>,
    ) {
        let model = builder.model();
        let stop = builder.end_chain_start(vehicle);
        let mut insert_after = start;
        while insert_after != stop && !model.is_end(insert_after) {
            let insert_before = if insert_after == start {
                next_after_start
            } else {
                match builder.value(insert_after) {
                    Some(next) => next,
                    None => break,
                }
            };
            positions.push(ValuedPosition {
                cost: self.insertion_cost(index, insert_after, insert_before, vehicle),
                insert_after,
                vehicle,
            });
            insert_after = insert_before;
        }
    }

    /// Every insertion position of `index` on every vehicle, cheapest first.
    pub fn sorted_positions(&self, builder: &RoutingBuilder<'_>, index: usize) -> Vec<ValuedPosition> {
        let mut positions = Vec::new();
        for vehicle in 0..builder.model().num_vehicles() {
            let start = builder.start_chain_end(vehicle);
            if let Some(next) = builder.value(start) {
                self.append_evaluated_positions_after(builder, index, start, next, vehicle, &mut positions);
            }
        }
        positions.sort_unstable();
        positions
    }

    /// For every candidate index, its start–end distance to every listed
    /// vehicle, sorted so that the closest vehicle is last.
    pub fn start_end_distances(&self, candidates: &[usize], vehicles: &[usize]) -> Vec<Vec<StartEndValue>> {
        let mut distances = vec![Vec::new(); self.model.size()];
        for &index in candidates {
            let values = &mut distances[index];
            for &vehicle in vehicles {
                let distance = self
                    .arc_cost(self.model.start(vehicle), index, vehicle)
                    .saturating_add(self.arc_cost(index, self.model.end(vehicle), vehicle));
                values.push(StartEndValue { distance, vehicle });
            }
            values.sort_unstable_by(|a, b| b.cmp(a));
        }
        distances
    }
}

/// Seed candidates ordered by their distance to their closest vehicle,
/// farthest or nearest first. Ties go to the lower vehicle, then the lower
/// index.
#[derive(Debug)]
pub struct SeedQueue {
    farthest_first: bool,
    heap: BinaryHeap<(Cost, Reverse<usize>, Reverse<usize>)>,
}

impl SeedQueue {
    /// Fills the queue with the closest vehicle of every candidate, popping
    /// it from the candidate's distance list.
    pub fn new(distances: &mut [Vec<StartEndValue>], farthest_first: bool) -> Self {
        let mut queue = Self {
            farthest_first,
            heap: BinaryHeap::new(),
        };
        for (index, values) in distances.iter_mut().enumerate() {
            if let Some(value) = values.pop() {
                queue.push(index, value);
            }
        }
        queue
    }

    /// Adds a candidate.
    pub fn push(&mut self, index: usize, value: StartEndValue) {
        let key = if self.farthest_first {
            value.distance
        } else {
            -value.distance
        };
        self.heap.push((key, Reverse(value.vehicle), Reverse(index)));
    }

    /// Pops the best `(index, vehicle)` candidate.
    pub fn pop(&mut self) -> Option<(usize, usize)> {
        self.heap
            .pop()
            .map(|(_, Reverse(vehicle), Reverse(index))| (index, vehicle))
    }

    /// `true` if no candidate is left.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

/// Pops seed candidates until one can open the route of an unused vehicle.
///
/// Returns the vehicle whose route was seeded, or `None` once the queue is
/// exhausted or the build is stopped.
pub fn insert_seed_node(
    builder: &mut RoutingBuilder<'_>,
    distances: &mut [Vec<StartEndValue>],
    queue: &mut SeedQueue,
    is_vehicle_used: &mut [bool],
) -> Option<usize> {
    while let Some((index, vehicle)) = queue.pop() {
        if builder.should_stop() {
            return None;
        }
        if builder.contains(index) {
            distances[index].clear();
            continue;
        }
        if !is_vehicle_used[vehicle] {
            let start = builder.start_chain_end(vehicle);
            if let Some(next) = builder.value(start) {
                builder.insert_between(index, start, next);
                if builder.commit() {
                    is_vehicle_used[vehicle] = true;
                    distances[index].clear();
                    return Some(vehicle);
                }
            }
        }
        if let Some(value) = distances[index].pop() {
            queue.push(index, value);
        }
    }
    None
}
