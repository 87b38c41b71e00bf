use fxhash::FxHashMap;
use rand::Rng;

use super::ValueEstimator;
use crate::env::Observation;
use crate::error::RlError;
use crate::utils::SharedRng;

/// Unseen states read as a fresh draw from [0, DEFAULT_BIAS) without being stored.
pub const DEFAULT_BIAS: f64 = 0.5;

#[derive(Debug, Clone)]
pub struct TableValueEstimator<S: Observation> {
    learning_rate: f64,
    values: FxHashMap<S, f64>,
    rng: SharedRng,
}

impl<S: Observation> TableValueEstimator<S> {
    pub fn new(learning_rate: f64, rng: SharedRng) -> Self {
        Self {
            learning_rate,
            values: FxHashMap::default(),
            rng,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<S: Observation> ValueEstimator<S> for TableValueEstimator<S> {
    fn evaluate(&self, state: &S) -> f64 {
        match self.values.get(state) {
            Some(value) => *value,
            None => self.rng.borrow_mut().gen::<f64>() * DEFAULT_BIAS,
        }
    }

    fn assign(&mut self, state: &S, value: f64) {
        self.values.insert(state.clone(), value);
    }

    fn update_single(&mut self, state: &S, td_error: f64, eligibility: f64) {
        let value = self.evaluate(state) + self.learning_rate * td_error * eligibility;
        self.values.insert(state.clone(), value);
    }

    fn update_batch(&mut self, _states: &[S], _targets: &[f64]) -> Result<f64, RlError> {
        Ok(0.0)
    }

    fn is_table(&self) -> bool {
        true
    }
}
