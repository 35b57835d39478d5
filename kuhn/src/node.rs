use std::fmt::Display;

use more_asserts::debug_assert_ge;
use serde::{
    Deserialize,
    Serialize,
};

use crate::game::Action;

/// Turns accumulated regrets into a strategy proportional to the positive
/// regrets. Falls back to the uniform strategy when no regret is positive.
pub fn regret_matching(regrets: &[f64; Action::COUNT]) -> [f64; Action::COUNT] {
    let positive_sum: f64 = regrets.iter().map(|r| r.max(0.0)).sum();
    if positive_sum <= 0.0 {
        return [1.0 / Action::COUNT as f64; Action::COUNT];
    }

    let mut strategy = [0.0; Action::COUNT];
    for (i, regret) in regrets.iter().enumerate() {
        strategy[i] = regret.max(0.0) / positive_sum;
        debug_assert_ge!(strategy[i], 0.0);
    }
    strategy
}

/// Normalizes a vector of non-negative weights, uniform if they sum to zero.
pub fn normalize(weights: &[f64; Action::COUNT]) -> [f64; Action::COUNT] {
    let normalizing_sum: f64 = weights.iter().sum();
    if normalizing_sum <= 0.0 {
        return [1.0 / Action::COUNT as f64; Action::COUNT];
    }
    weights.map(|w| w / normalizing_sum)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Node {
    regrets: [f64; Action::COUNT],
    cumulative_strategy: [f64; Action::COUNT],
}

impl Node {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn regrets(&self) -> &[f64; Action::COUNT] {
        &self.regrets
    }

    pub fn cumulative_strategy(&self) -> &[f64; Action::COUNT] {
        &self.cumulative_strategy
    }

    pub fn current_strategy(&self) -> [f64; Action::COUNT] {
        regret_matching(&self.regrets)
    }

    pub fn average_strategy(&self) -> [f64; Action::COUNT] {
        normalize(&self.cumulative_strategy)
    }

    pub fn add_regret(&mut self, action: Action, delta: f64) {
        self.regrets[action.index()] += delta;
    }

    pub fn add_strategy_weight(&mut self, action: Action, delta: f64) {
        debug_assert_ge!(delta, 0.0);
        self.cumulative_strategy[action.index()] += delta;
    }

    pub fn merge(&mut self, other: &Node) {
        for i in 0..Action::COUNT {
            self.regrets[i] += other.regrets[i];
            self.cumulative_strategy[i] += other.cumulative_strategy[i];
        }
    }

    /// Adds the difference between `updated` and the `base` it grew from.
    pub fn merge_delta(&mut self, updated: &Node, base: &Node) {
        for i in 0..Action::COUNT {
            self.regrets[i] += updated.regrets[i] - base.regrets[i];
            self.cumulative_strategy[i] +=
                updated.cumulative_strategy[i] - base.cumulative_strategy[i];
        }
    }

    /// Checks what a loaded node must satisfy to be trained further.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(r) = self.regrets.iter().find(|r| !r.is_finite()) {
            return Err(format!("regret {} is not finite", r));
        }
        if let Some(s) = self.cumulative_strategy.iter().find(|s| !s.is_finite() || **s < 0.0) {
            return Err(format!("cumulative strategy weight {} is negative or not finite", s));
        }
        Ok(())
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let avg_strategy = self.average_strategy();

        write!(f, "Avg Strategy[")?;
        for (i, act) in Action::VALUES.iter().enumerate() {
            write!(f, "{:?}: {:.03}, ", act, avg_strategy[i])?;
        }
        write!(f, "]")?;

        write!(f, " Regret[")?;
        for (i, act) in Action::VALUES.iter().enumerate() {
            write!(f, "{:?}: {:.03}, ", act, self.regrets[i])?;
        }
        write!(f, "]")?;

        Ok(())
    }
}
