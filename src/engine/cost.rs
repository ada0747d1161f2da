//! Progressive action costs.
//!
//! One canonical formula for every scaled action: the actor's configured
//! reference stat is sampled from the authoritative ledger at request time,
//! and the cost multiplier grows linearly once the sample passes the
//! reference value, capped at the action's `max_multiplier`.
//!
//! ```text
//! ratio      = max(sample / reference_value, 1)
//! multiplier = clamp(1 + (ratio - 1) * scaling_constant, 1, max_multiplier)
//! cost_i     = floor(base_cost_i * multiplier)
//! ```
//!
//! An action without a scaling block always costs its base. The multiplier is
//! monotonically non-decreasing in the sample and never drops below 1, so a
//! cost never falls below base and never exceeds `max_multiplier × base`.

use crate::model::{ActionCost, ActionDefinition, CostScaling};

/// Compute the concrete cost of `def` for an actor whose sampled reference
/// stat is `stat_sample`.
pub fn compute_cost(def: &ActionDefinition, stat_sample: f64) -> ActionCost {
    let Some(scaling) = &def.scaling else {
        return def.base_cost;
    };
    let multiplier = cost_multiplier(scaling, stat_sample);
    ActionCost {
        action_points: (f64::from(def.base_cost.action_points) * multiplier).floor() as u32,
        funds: (def.base_cost.funds as f64 * multiplier).floor() as i64,
        political_capital: (f64::from(def.base_cost.political_capital) * multiplier).floor() as u32,
    }
}

/// The multiplier alone, exposed for diagnostics and tests.
pub fn cost_multiplier(scaling: &CostScaling, stat_sample: f64) -> f64 {
    let ratio = (stat_sample / scaling.reference_value).max(1.0);
    (1.0 + (ratio - 1.0) * scaling.scaling_constant).clamp(1.0, scaling.max_multiplier)
}
