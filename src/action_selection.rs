use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::utils::SharedRng;

/// How epsilon moves after every training checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EpsilonUpdateStrategy {
    Multiplicative { factor: f64, final_epsilon: f64 },
    Additive { step: f64, final_epsilon: f64 },
    None,
}

impl Default for EpsilonUpdateStrategy {
    fn default() -> Self {
        EpsilonUpdateStrategy::Multiplicative {
            factor: 0.8,
            final_epsilon: 0.0,
        }
    }
}

impl EpsilonUpdateStrategy {
    fn update(&self, current_epsilon: f64) -> f64 {
        match *self {
            EpsilonUpdateStrategy::Multiplicative {
                factor,
                final_epsilon,
            } => (current_epsilon * factor).max(final_epsilon),
            EpsilonUpdateStrategy::Additive { step, final_epsilon } => {
                (current_epsilon - step).max(final_epsilon)
            }
            EpsilonUpdateStrategy::None => current_epsilon,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EpsilonGreedy {
    initial_epsilon: f64,
    epsilon: f64,
    update_strategy: EpsilonUpdateStrategy,
    rng: SharedRng,
}

impl EpsilonGreedy {
    pub fn new(epsilon: f64, update_strategy: EpsilonUpdateStrategy, rng: SharedRng) -> Self {
        Self {
            initial_epsilon: epsilon,
            epsilon,
            update_strategy,
            rng,
        }
    }

    /// Draws once: greedy when the draw exceeds epsilon.
    pub fn should_exploit(&self) -> bool {
        let draw: f64 = self.rng.borrow_mut().gen();
        draw > self.epsilon
    }

    pub fn get_epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn update(&mut self) {
        self.epsilon = self.update_strategy.update(self.epsilon)
    }

    pub fn force(&mut self, epsilon: f64) {
        self.epsilon = epsilon;
    }

    pub fn reset(&mut self) {
        self.epsilon = self.initial_epsilon;
    }
}
