//! Top-level first-solution entry point.
//!
//! [`FirstSolutionBuilder`] registers the rules implied by the model, adds
//! the caller's rules, runs the selected heuristic, and turns the outcome
//! into a [`Solution`] or a [`BuildError`].

use std::fmt::Display;

use log::{error, info, warn};

use crate::construction::{InsertionPricer, RoutingBuilder, StopCheck};
use crate::constructive::{
    cheapest_addition, christofides, global_cheapest_insertion, local_cheapest_insertion, savings,
    sweep, SuccessorRanking,
};
use crate::evaluation::SolutionEvaluator;
use crate::filters::{DisjunctionRule, FeasibilityRule, PickupDeliveryRule, TypeIncompatibilityRule};
use crate::models::{RoutingModel, Solution};
use crate::parameters::{FirstSolutionStrategy, ParameterError, Parameters};

/// Why no first solution was returned.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildError {
    /// The heuristic could not place every mandatory index, or the rules
    /// rejected the locked route prefixes.
    Infeasible,
    /// The stop predicate fired.
    Cancelled,
    /// The parameters are out of range.
    InvalidParameters(ParameterError),
    /// [`FirstSolutionStrategy::Sweep`] was selected on a model without
    /// sweep coordinates.
    MissingCoordinates,
}

impl Display for BuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Infeasible => write!(f, "No feasible first solution found"),
            Self::Cancelled => write!(f, "First solution build was cancelled"),
            Self::InvalidParameters(e) => write!(f, "Invalid parameters: {e}"),
            Self::MissingCoordinates => write!(f, "Sweep strategy needs node coordinates on the model"),
        }
    }
}

impl std::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidParameters(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ParameterError> for BuildError {
    fn from(e: ParameterError) -> Self {
        Self::InvalidParameters(e)
    }
}

/// Builds a first solution for a routing model.
///
/// [`DisjunctionRule`] always runs first. [`PickupDeliveryRule`] and
/// [`TypeIncompatibilityRule`] follow when the model has pairs or
/// incompatible visit types; rules given with
/// [`with_rule`](Self::with_rule) run last, in the order given.
///
/// # Examples
///
/// ```
/// use u_routing_init::distance::CostMatrix;
/// use u_routing_init::filters::CapacityRule;
/// use u_routing_init::models::{RoutingModel, Vehicle};
/// use u_routing_init::parameters::Parameters;
/// use u_routing_init::solver::FirstSolutionBuilder;
///
/// let points = [(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0)];
/// let vehicles = vec![Vehicle::new(0), Vehicle::new(0)];
/// let model = RoutingModel::new(4, vehicles, CostMatrix::from_points(&points)).unwrap();
///
/// let solution = FirstSolutionBuilder::new(&model)
///     .with_rule(CapacityRule::from_node_demands(&model, &[0, 1, 1, 1], &[2, 2]))
///     .build(&Parameters::default())
///     .unwrap();
/// assert_eq!(solution.num_routes(), 2);
/// assert_eq!(solution.num_served(), 3);
/// ```
pub struct FirstSolutionBuilder<'a> {
    model: &'a RoutingModel,
    rules: Vec<Box<dyn FeasibilityRule + 'a>>,
    stop: Option<StopCheck<'a>>,
}

impl<'a> FirstSolutionBuilder<'a> {
    /// Creates a builder with only the rules the model implies.
    pub fn new(model: &'a RoutingModel) -> Self {
        Self {
            model,
            rules: Vec::new(),
            stop: None,
        }
    }

    /// Adds a feasibility rule.
    pub fn with_rule(mut self, rule: impl FeasibilityRule + 'a) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Adds a boxed feasibility rule.
    pub fn with_boxed_rule(mut self, rule: Box<dyn FeasibilityRule + 'a>) -> Self {
        self.rules.push(rule);
        self
    }

    /// Installs a predicate polled after every commit; once it returns
    /// `true` the build ends with [`BuildError::Cancelled`].
    pub fn with_stop(mut self, stop: impl FnMut() -> bool + 'a) -> Self {
        self.stop = Some(Box::new(stop));
        self
    }

    /// Runs the heuristic selected by `params`.
    pub fn build(self, params: &Parameters) -> Result<Solution, BuildError> {
        params.validate()?;
        let strategy = params.strategy;
        let model = self.model;
        if strategy == FirstSolutionStrategy::Sweep && model.sweep_coordinates().is_none() {
            warn!("sweep selected on a model without coordinates");
            return Err(BuildError::MissingCoordinates);
        }
        info!(
            "building first solution with {strategy:?}: {} indices, {} vehicles",
            model.size(),
            model.num_vehicles()
        );
        self.build_with(|builder| match strategy {
            FirstSolutionStrategy::GlobalCheapestInsertion | FirstSolutionStrategy::SequentialCheapestInsertion => {
                let pricer = InsertionPricer::from_model(model);
                global_cheapest_insertion(builder, &pricer, &params.global_cheapest_insertion_options())
            }
            FirstSolutionStrategy::LocalCheapestInsertion => {
                let pricer = InsertionPricer::from_model(model);
                local_cheapest_insertion(builder, &pricer)
            }
            FirstSolutionStrategy::Savings | FirstSolutionStrategy::ParallelSavings => {
                savings(builder, &params.savings_options())
            }
            FirstSolutionStrategy::PathCheapestArc => {
                let ranking =
                    SuccessorRanking::Evaluator(Box::new(|from, to| model.arc_cost_for_first_solution(from, to)));
                cheapest_addition(builder, &ranking)
            }
            FirstSolutionStrategy::Christofides => christofides(builder),
            FirstSolutionStrategy::Sweep => sweep(builder),
        })
    }

    /// Runs a caller-supplied heuristic on a builder carrying the
    /// registered rules and stop predicate.
    ///
    /// The heuristic returns `true` once it committed a complete
    /// assignment, as every function in [`constructive`](crate::constructive)
    /// does.
    ///
    /// # Examples
    ///
    /// ```
    /// use u_routing_init::constructive::{cheapest_addition, SuccessorRanking};
    /// use u_routing_init::distance::CostMatrix;
    /// use u_routing_init::models::{RoutingModel, Vehicle};
    /// use u_routing_init::solver::FirstSolutionBuilder;
    ///
    /// let points = [(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (3.0, 0.0)];
    /// let model = RoutingModel::new(4, vec![Vehicle::new(0)], CostMatrix::from_points(&points)).unwrap();
    ///
    /// // Farthest visit first.
    /// let ranking = SuccessorRanking::Comparator(Box::new(|from, a, b| {
    ///     model.arc_cost_for_first_solution(from, a) > model.arc_cost_for_first_solution(from, b)
    /// }));
    /// let solution = FirstSolutionBuilder::new(&model)
    ///     .build_with(|builder| cheapest_addition(builder, &ranking))
    ///     .unwrap();
    /// assert_eq!(solution.routes()[0].visits(), &[2, 0, 1]);
    /// ```
    pub fn build_with(self, heuristic: impl FnOnce(&mut RoutingBuilder<'a>) -> bool) -> Result<Solution, BuildError> {
        let model = self.model;
        let mut rules: Vec<Box<dyn FeasibilityRule + 'a>> = vec![Box::new(DisjunctionRule::new())];
        if !model.pickup_delivery_pairs().is_empty() {
            rules.push(Box::new(PickupDeliveryRule::new()));
        }
        if model.has_type_incompatibilities() {
            rules.push(Box::new(TypeIncompatibilityRule::new()));
        }
        rules.extend(self.rules);

        let mut builder = RoutingBuilder::new(model, rules);
        if let Some(stop) = self.stop {
            builder = builder.with_stop(stop);
        }

        let completed = heuristic(&mut builder);
        let stats = builder.stats();
        if !completed {
            if builder.should_stop() {
                warn!("first solution build cancelled after {} decisions", stats.decisions);
                return Err(BuildError::Cancelled);
            }
            warn!(
                "no feasible first solution: {} decisions, {} rejected",
                stats.decisions, stats.rejects
            );
            return Err(BuildError::Infeasible);
        }

        let assignment = builder.into_assignment();
        let evaluator = SolutionEvaluator::new(model);
        let violations = evaluator.check(&assignment);
        if !violations.is_empty() {
            error!("first solution breaks structural guarantees: {violations:?}");
            debug_assert!(violations.is_empty(), "invalid first solution: {violations:?}");
        }
        let solution = evaluator.build_solution(&assignment, stats);
        info!(
            "first solution: {} routes, {} unperformed, cost {}, {} decisions, {} rejected",
            solution.num_routes(),
            solution.unperformed().len(),
            solution.total_cost(),
            stats.decisions,
            stats.rejects
        );
        Ok(solution)
    }
}
