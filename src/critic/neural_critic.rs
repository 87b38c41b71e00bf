use ndarray::{Array1, Array2, Axis};
use rand::Rng;
use tracing::trace;

use super::{CriticConfig, ValueEstimator};
use crate::env::Observation;
use crate::error::RlError;
use crate::network::Network;

#[derive(Debug)]
pub struct NeuralValueEstimator {
    network: Network,
    input_size: usize,
    fit_iterations: usize,
}

impl NeuralValueEstimator {
    pub fn new<R: Rng + ?Sized>(input_size: usize, config: &CriticConfig, rng: &mut R) -> Self {
        Self {
            network: Network::regression(
                input_size,
                &config.layers,
                config.activation,
                config.nn_lrate,
                rng,
            ),
            input_size,
            fit_iterations: config.fit_iterations,
        }
    }

    fn batch<S: Observation>(&self, states: &[S]) -> Result<Array2<f64>, RlError> {
        let mut x: Array2<f64> = Array2::zeros((states.len(), self.input_size));
        for (i, state) in states.iter().enumerate() {
            let features = state.features();
            if features.len() != self.input_size {
                return Err(RlError::DimensionMismatch {
                    expected: self.input_size,
                    actual: features.len(),
                });
            }
            x.row_mut(i).assign(&features);
        }
        Ok(x)
    }
}

impl<S: Observation> ValueEstimator<S> for NeuralValueEstimator {
    fn evaluate(&self, state: &S) -> f64 {
        let input = state.features().insert_axis(Axis(0));
        self.network.predict(&input)[[0, 0]]
    }

    fn assign(&mut self, _state: &S, _value: f64) {}

    fn update_single(&mut self, _state: &S, _td_error: f64, _eligibility: f64) {}

    fn update_batch(&mut self, states: &[S], targets: &[f64]) -> Result<f64, RlError> {
        if states.len() != targets.len() {
            return Err(RlError::DimensionMismatch {
                expected: states.len(),
                actual: targets.len(),
            });
        }
        if states.is_empty() {
            return Ok(0.0);
        }
        let x = self.batch(states)?;
        let y = Array1::from(targets.to_vec()).insert_axis(Axis(1));
        let mut loss = 0.0;
        for _ in 0..self.fit_iterations {
            loss = self.network.fit(x.clone(), &y);
        }
        trace!(
            batch = states.len(),
            loss,
            learning_rate = self.network.learning_rate(),
            "fitted value network"
        );
        Ok(loss)
    }

    fn is_table(&self) -> bool {
        false
    }
}
