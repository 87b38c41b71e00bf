mod neural_critic;
mod table_critic;

use enum_dispatch::enum_dispatch;
use fxhash::FxHashMap;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

pub use neural_critic::NeuralValueEstimator;
pub use table_critic::TableValueEstimator;

use crate::env::Observation;
use crate::error::RlError;
use crate::network::Activation;
use crate::utils::SharedRng;

#[enum_dispatch]
pub trait ValueEstimator<S: Observation> {
    fn evaluate(&self, state: &S) -> f64;
    fn assign(&mut self, state: &S, value: f64);
    fn update_single(&mut self, state: &S, td_error: f64, eligibility: f64);
    /// Fits the estimator on one episode worth of targets, returns the last loss.
    fn update_batch(&mut self, states: &[S], targets: &[f64]) -> Result<f64, RlError>;
    fn is_table(&self) -> bool;
}

#[derive(Debug)]
#[enum_dispatch(ValueEstimator<S>)]
pub enum EnumValueEstimator<S: Observation> {
    TableValueEstimator(TableValueEstimator<S>),
    NeuralValueEstimator(NeuralValueEstimator),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CriticConfig {
    pub table_critic: bool,
    /// Hidden layer widths followed by the output width, which must be 1.
    pub layers: Vec<usize>,
    pub activation: Activation,
    pub nn_lrate: f64,
    pub fit_iterations: usize,
    /// Seeds the network weights apart from the run's random source.
    pub seed: Option<u64>,
}

impl Default for CriticConfig {
    fn default() -> Self {
        Self {
            table_critic: true,
            layers: vec![20, 10, 1],
            activation: Activation::Tanh,
            nn_lrate: 0.01,
            fit_iterations: 10,
            seed: None,
        }
    }
}

#[derive(Debug)]
pub struct Critic<S: Observation> {
    estimator: EnumValueEstimator<S>,
    discount_factor: f64,
    trace_decay: f64,
    eligibility: FxHashMap<S, f64>,
}

impl<S: Observation> Critic<S> {
    pub fn new(estimator: EnumValueEstimator<S>, discount_factor: f64, trace_decay: f64) -> Self {
        Self {
            estimator,
            discount_factor,
            trace_decay,
            eligibility: FxHashMap::default(),
        }
    }

    pub fn table(learning_rate: f64, discount_factor: f64, trace_decay: f64, rng: SharedRng) -> Self {
        let estimator = TableValueEstimator::new(learning_rate, rng);
        Self::new(estimator.into(), discount_factor, trace_decay)
    }

    pub fn from_config(
        config: &CriticConfig,
        input_size: usize,
        learning_rate: f64,
        discount_factor: f64,
        trace_decay: f64,
        rng: SharedRng,
    ) -> Self {
        if config.table_critic {
            return Self::table(learning_rate, discount_factor, trace_decay, rng);
        }
        let estimator = match config.seed {
            Some(seed) => {
                NeuralValueEstimator::new(input_size, config, &mut StdRng::seed_from_u64(seed))
            }
            None => NeuralValueEstimator::new(input_size, config, &mut *rng.borrow_mut()),
        };
        Self::new(estimator.into(), discount_factor, trace_decay)
    }

    pub fn is_table(&self) -> bool {
        self.estimator.is_table()
    }

    pub fn initiate_eligibility(&mut self) {
        self.eligibility = FxHashMap::default();
    }

    pub fn get_state_value(&self, state: &S) -> f64 {
        self.estimator.evaluate(state)
    }

    /// Pins a table entry; the network has no per-state entries to pin.
    pub fn set_state_value(&mut self, state: &S, value: f64) {
        self.estimator.assign(state, value)
    }

    pub fn get_state_eligibility(&self, state: &S) -> f64 {
        *self.eligibility.get(state).unwrap_or(&0.0)
    }

    pub fn set_state_eligibility(&mut self, state: S, value: f64) {
        self.eligibility.insert(state, value);
    }

    /// Returns `(td_error, target)` where `target = reward + drate * V(new_state)`.
    pub fn get_td_error(&self, reward: f64, state: &S, new_state: &S) -> (f64, f64) {
        let target = reward + self.discount_factor * self.get_state_value(new_state);
        (target - self.get_state_value(state), target)
    }

    pub fn update_state_value(&mut self, state: &S, td_error: f64) {
        let eligibility = self.get_state_eligibility(state);
        self.estimator.update_single(state, td_error, eligibility);
    }

    pub fn update_state_eligibility(&mut self, state: &S) {
        if !self.is_table() {
            return;
        }
        let eligibility =
            self.discount_factor * self.trace_decay * self.get_state_eligibility(state);
        self.set_state_eligibility(state.clone(), eligibility);
    }

    pub fn update_state_values(&mut self, states: &[S], targets: &[f64]) -> Result<f64, RlError> {
        self.estimator.update_batch(states, targets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::GamblerState;
    use crate::utils::shared_rng;
    use approx::assert_relative_eq;

    fn state(coins: u32) -> GamblerState {
        GamblerState {
            coins,
            max_coins: 4,
        }
    }

    fn table_critic() -> Critic<GamblerState> {
        Critic::table(0.1, 0.9, 0.5, shared_rng(Some(3)))
    }

    fn neural_critic(seed: Option<u64>) -> Critic<GamblerState> {
        let config = CriticConfig {
            table_critic: false,
            layers: vec![6, 1],
            seed,
            ..CriticConfig::default()
        };
        Critic::from_config(&config, 5, 0.1, 0.9, 0.5, shared_rng(Some(3)))
    }

    #[test]
    fn unseen_states_read_a_small_positive_bias() {
        let critic = table_critic();
        for coins in 0..5 {
            for _ in 0..50 {
                let value = critic.get_state_value(&state(coins));
                assert!((0.0..0.5).contains(&value), "{value}");
            }
        }
    }

    #[test]
    fn td_error_identity() {
        let mut critic = table_critic();
        critic.set_state_value(&state(1), 0.7);
        critic.set_state_value(&state(2), -1.3);
        for reward in [-1000.0, -1.0, 0.0, 2.5] {
            let (td_error, target) = critic.get_td_error(reward, &state(1), &state(2));
            assert_eq!(target, reward + 0.9 * -1.3);
            assert_eq!(td_error, reward + 0.9 * -1.3 - 0.7);
        }
    }

    #[test]
    fn value_update_uses_state_eligibility() {
        let mut critic = table_critic();
        critic.set_state_value(&state(1), 1.0);
        critic.set_state_eligibility(state(1), 0.5);
        critic.update_state_value(&state(1), 4.0);
        assert_relative_eq!(critic.get_state_value(&state(1)), 1.0 + 0.1 * 4.0 * 0.5);
    }

    #[test]
    fn zero_eligibility_leaves_the_value_alone() {
        let mut critic = table_critic();
        critic.set_state_value(&state(2), 0.25);
        critic.update_state_value(&state(2), 10.0);
        assert_eq!(critic.get_state_value(&state(2)), 0.25);
    }

    #[test]
    fn eligibility_decay_and_reset() {
        let mut critic = table_critic();
        critic.set_state_eligibility(state(0), 1.0);
        critic.update_state_eligibility(&state(0));
        assert_relative_eq!(critic.get_state_eligibility(&state(0)), 0.45);
        for _ in 0..5 {
            critic.update_state_eligibility(&state(3));
        }
        assert_eq!(critic.get_state_eligibility(&state(3)), 0.0);
        critic.initiate_eligibility();
        assert_eq!(critic.get_state_eligibility(&state(0)), 0.0);
    }

    #[test]
    fn table_batch_update_is_a_no_op() {
        let mut critic = table_critic();
        critic.set_state_value(&state(1), 0.3);
        let loss = critic.update_state_values(&[state(1)], &[5.0]).unwrap();
        assert_eq!(loss, 0.0);
        assert_eq!(critic.get_state_value(&state(1)), 0.3);
        assert!(critic.is_table());
    }

    #[test]
    fn neural_critic_is_deterministic_on_reads() {
        let critic = neural_critic(None);
        assert!(!critic.is_table());
        let a = critic.get_state_value(&state(2));
        let b = critic.get_state_value(&state(2));
        assert_eq!(a, b);
    }

    #[test]
    fn neural_critic_ignores_single_updates() {
        let mut critic = neural_critic(Some(1));
        let before = critic.get_state_value(&state(1));
        critic.set_state_eligibility(state(1), 1.0);
        critic.update_state_value(&state(1), 100.0);
        critic.set_state_value(&state(1), 42.0);
        critic.update_state_eligibility(&state(1));
        assert_eq!(critic.get_state_value(&state(1)), before);
        assert_eq!(critic.get_state_eligibility(&state(1)), 1.0);
    }

    #[test]
    fn neural_critic_moves_toward_targets() {
        let mut critic = neural_critic(Some(1));
        let states = vec![state(0), state(4)];
        let targets = vec![-1.0, 1.0];
        let error = |critic: &Critic<GamblerState>| {
            states
                .iter()
                .zip(&targets)
                .map(|(s, t)| (critic.get_state_value(s) - t).powi(2))
                .sum::<f64>()
        };
        let before = error(&critic);
        for _ in 0..50 {
            critic.update_state_values(&states, &targets).unwrap();
        }
        assert!(error(&critic) < before);
    }

    #[test]
    fn seeded_networks_match() {
        let a = neural_critic(Some(77));
        let b = neural_critic(Some(77));
        assert_eq!(a.get_state_value(&state(3)), b.get_state_value(&state(3)));
    }

    #[test]
    fn mismatched_batch_is_rejected() {
        let mut critic = neural_critic(Some(1));
        assert!(matches!(
            critic.update_state_values(&[state(0), state(1)], &[1.0]),
            Err(RlError::DimensionMismatch {
                expected: 2,
                actual: 1
            })
        ));
    }
}
