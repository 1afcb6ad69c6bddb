//! Heuristic selection and tuning parameters.
//!
//! Parameters are plain serde data so they can be stored next to a model
//! and loaded from JSON. Missing fields take their default values.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::constructive::{GlobalCheapestInsertionOptions, SavingsOptions};

/// First-solution heuristic run by [`FirstSolutionBuilder`](crate::solver::FirstSolutionBuilder).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FirstSolutionStrategy {
    /// Global cheapest insertion growing all routes at once.
    #[default]
    GlobalCheapestInsertion,
    /// Global cheapest insertion filling one route at a time.
    SequentialCheapestInsertion,
    /// Cheapest position for one visit at a time.
    LocalCheapestInsertion,
    /// Savings, one route at a time.
    Savings,
    /// Savings, all routes at once.
    ParallelSavings,
    /// Route extension by the cheapest outgoing arc.
    PathCheapestArc,
    /// Christofides tours sliced into routes.
    Christofides,
    /// Visits swept by polar angle into routes; needs sweep coordinates on
    /// the model.
    Sweep,
}

/// Parameters of a first-solution build.
///
/// # Examples
///
/// ```
/// use u_routing_init::parameters::{FirstSolutionStrategy, Parameters};
///
/// let params = Parameters::from_json(r#"{ "strategy": "Savings", "savings_add_reverse_arcs": true }"#).unwrap();
/// assert_eq!(params.strategy, FirstSolutionStrategy::Savings);
/// assert!(params.savings_add_reverse_arcs);
/// assert_eq!(params.savings_arc_coefficient, 1.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameters {
    /// Heuristic to run.
    pub strategy: FirstSolutionStrategy,
    /// Share of visits used as farthest-first seeds by global cheapest
    /// insertion, in `[0, 1]`.
    pub cheapest_insertion_farthest_seeds_ratio: f64,
    /// Share of nearest visits considered around each anchor by global
    /// cheapest insertion, in `(0, 1]`.
    pub cheapest_insertion_neighbors_ratio: f64,
    /// Share of nearest visits each visit builds savings with, in `(0, 1]`.
    pub savings_neighbors_ratio: f64,
    /// Also build the saving of every reversed neighbor arc.
    pub savings_add_reverse_arcs: bool,
    /// Weight of the joining arc in a saving; positive.
    pub savings_arc_coefficient: f64,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            strategy: FirstSolutionStrategy::default(),
            cheapest_insertion_farthest_seeds_ratio: 0.0,
            cheapest_insertion_neighbors_ratio: 1.0,
            savings_neighbors_ratio: 1.0,
            savings_add_reverse_arcs: false,
            savings_arc_coefficient: 1.0,
        }
    }
}

impl Parameters {
    /// Parameters running `strategy` with default tuning.
    pub fn with_strategy(strategy: FirstSolutionStrategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }

    /// Parses and validates parameters from JSON.
    pub fn from_json(json: &str) -> Result<Self, ParameterError> {
        let params: Self = serde_json::from_str(json).map_err(|e| ParameterError::Json(e.to_string()))?;
        params.validate()?;
        Ok(params)
    }

    /// Checks every tuning value against its allowed range.
    pub fn validate(&self) -> Result<(), ParameterError> {
        check(
            "cheapest_insertion_farthest_seeds_ratio",
            self.cheapest_insertion_farthest_seeds_ratio,
            |r| (0.0..=1.0).contains(&r),
        )?;
        check(
            "cheapest_insertion_neighbors_ratio",
            self.cheapest_insertion_neighbors_ratio,
            |r| r > 0.0 && r <= 1.0,
        )?;
        check("savings_neighbors_ratio", self.savings_neighbors_ratio, |r| r > 0.0 && r <= 1.0)?;
        check("savings_arc_coefficient", self.savings_arc_coefficient, |c| c.is_finite() && c > 0.0)
    }

    /// Options for global cheapest insertion.
    pub fn global_cheapest_insertion_options(&self) -> GlobalCheapestInsertionOptions {
        GlobalCheapestInsertionOptions {
            is_sequential: self.strategy == FirstSolutionStrategy::SequentialCheapestInsertion,
            farthest_seeds_ratio: self.cheapest_insertion_farthest_seeds_ratio,
            neighbors_ratio: self.cheapest_insertion_neighbors_ratio,
        }
    }

    /// Options for the savings heuristic.
    pub fn savings_options(&self) -> SavingsOptions {
        SavingsOptions {
            neighbors_ratio: self.savings_neighbors_ratio,
            add_reverse_arcs: self.savings_add_reverse_arcs,
            arc_coefficient: self.savings_arc_coefficient,
            is_parallel: self.strategy == FirstSolutionStrategy::ParallelSavings,
        }
    }
}

fn check(name: &'static str, value: f64, allowed: impl Fn(f64) -> bool) -> Result<(), ParameterError> {
    // NaN fails every range test.
    if allowed(value) {
        Ok(())
    } else {
        Err(ParameterError::OutOfRange { name, value })
    }
}

/// Invalid build parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterError {
    /// A tuning value is outside its allowed range.
    OutOfRange {
        /// Parameter name.
        name: &'static str,
        /// Rejected value.
        value: f64,
    },
    /// The JSON text could not be parsed.
    Json(String),
}

impl Display for ParameterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfRange { name, value } => write!(f, "Parameter {name} is out of range: {value}"),
            Self::Json(message) => write!(f, "Invalid parameter JSON: {message}"),
        }
    }
}

impl std::error::Error for ParameterError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let p = Parameters::default();
        assert_eq!(p.strategy, FirstSolutionStrategy::GlobalCheapestInsertion);
        assert_eq!(p.cheapest_insertion_farthest_seeds_ratio, 0.0);
        assert_eq!(p.cheapest_insertion_neighbors_ratio, 1.0);
        assert_eq!(p.savings_neighbors_ratio, 1.0);
        assert!(!p.savings_add_reverse_arcs);
        assert_eq!(p.savings_arc_coefficient, 1.0);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_empty_json_gives_defaults() {
        assert_eq!(Parameters::from_json("{}").expect("valid"), Parameters::default());
    }

    #[test]
    fn test_json_roundtrip_keeps_strategy() {
        let p = Parameters {
            cheapest_insertion_neighbors_ratio: 0.5,
            ..Parameters::with_strategy(FirstSolutionStrategy::Christofides)
        };
        let json = serde_json::to_string(&p).expect("serializable");
        assert!(json.contains("\"Christofides\""));
        assert_eq!(Parameters::from_json(&json).expect("valid"), p);
    }

    #[test]
    fn test_out_of_range_values_are_rejected() {
        let cases = [
            r#"{ "cheapest_insertion_farthest_seeds_ratio": 1.5 }"#,
            r#"{ "cheapest_insertion_neighbors_ratio": 0.0 }"#,
            r#"{ "savings_neighbors_ratio": -0.2 }"#,
            r#"{ "savings_arc_coefficient": 0.0 }"#,
        ];
        for json in cases {
            assert!(
                matches!(Parameters::from_json(json), Err(ParameterError::OutOfRange { .. })),
                "{json}"
            );
        }
    }

    #[test]
    fn test_nan_is_rejected() {
        let p = Parameters {
            savings_arc_coefficient: f64::NAN,
            ..Parameters::default()
        };
        assert!(matches!(
            p.validate(),
            Err(ParameterError::OutOfRange {
                name: "savings_arc_coefficient",
                ..
            })
        ));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            Parameters::from_json(r#"{ "strategy": "Radial" }"#),
            Err(ParameterError::Json(_))
        ));
    }

    #[test]
    fn test_sweep_strategy_from_json() {
        let p = Parameters::from_json(r#"{ "strategy": "Sweep" }"#).expect("valid");
        assert_eq!(p.strategy, FirstSolutionStrategy::Sweep);
    }

    #[test]
    fn test_strategy_selects_options() {
        let p = Parameters::with_strategy(FirstSolutionStrategy::SequentialCheapestInsertion);
        assert!(p.global_cheapest_insertion_options().is_sequential);
        assert!(!p.savings_options().is_parallel);
        let p = Parameters::with_strategy(FirstSolutionStrategy::ParallelSavings);
        assert!(p.savings_options().is_parallel);
        assert!(!p.global_cheapest_insertion_options().is_sequential);
    }

    #[test]
    fn test_display() {
        let e = ParameterError::OutOfRange {
            name: "savings_arc_coefficient",
            value: -1.0,
        };
        assert_eq!(e.to_string(), "Parameter savings_arc_coefficient is out of range: -1");
    }
}
