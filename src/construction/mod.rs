//! Building blocks shared by the first-solution heuristics.
//!
//! - [`FilteredBuilder`]: pending changes checked against feasibility rules
//!   and committed atomically, with decision counters and cancellation
//! - [`RoutingBuilder`]: route skeletons from locks, insertion between two
//!   indices, and unperformed sweeps
//! - [`InsertionPricer`]: insertion and penalty costs, sorted positions,
//!   seed ordering
//! - [`NeighborSets`]: per-cost-class pruning of insertion positions
//! - [`EntryQueue`]: arena-backed priority queue for incremental re-pricing

mod filtered;
mod insertion;
mod neighbors;
mod queue;
mod routing;

pub use filtered::{FilteredBuilder, StopCheck};
pub use insertion::{
    insert_seed_node, ArcEvaluator, InsertionPricer, PenaltyEvaluator, SeedQueue, StartEndValue,
    ValuedPosition,
};
pub use neighbors::NeighborSets;
pub use queue::{EntryId, EntryQueue, Prioritized};
pub use routing::RoutingBuilder;
