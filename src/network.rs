//! Based on https://towardsdatascience.com/math-neural-network-from-scratch-in-python-d6da9f29ce65

use std::fmt::Debug;

use ndarray::Array2;
use rand::Rng;

use self::activation::{relu, relu_prime, tanh, tanh_prime};
use self::layers::{ActivationLayer, DenseLayer, Layer};
use self::loss::{mse, mse_prime};

pub mod activation;
pub mod layers;
pub mod loss;

pub type LossFn = fn(&Array2<f64>, &Array2<f64>) -> Option<f64>;
pub type LossPrimeFn = fn(&Array2<f64>, &Array2<f64>) -> Array2<f64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    Tanh,
    Relu,
}

impl Activation {
    fn layer(self) -> ActivationLayer {
        match self {
            Activation::Tanh => ActivationLayer::new("tanh", tanh, tanh_prime),
            Activation::Relu => ActivationLayer::new("relu", relu, relu_prime),
        }
    }
}

pub struct Network {
    learning_rate: f64,
    layers: Vec<Box<dyn Layer>>,
    loss: LossFn,
    loss_prime: LossPrimeFn,
}

impl Debug for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Network")
            .field("learning_rate", &self.learning_rate)
            .field("layers", &self.layers)
            .finish()
    }
}

impl Network {
    pub fn new(learning_rate: f64, loss: LossFn, loss_prime: LossPrimeFn) -> Self {
        Self {
            learning_rate,
            layers: vec![],
            loss,
            loss_prime,
        }
    }

    /// Dense layers of the given widths with `activation` between them and a
    /// linear last layer, trained on mean squared error.
    pub fn regression<R: Rng + ?Sized>(
        input_size: usize,
        widths: &[usize],
        activation: Activation,
        learning_rate: f64,
        rng: &mut R,
    ) -> Self {
        let mut network = Self::new(learning_rate, mse, mse_prime);
        let mut fan_in = input_size;
        for (i, width) in widths.iter().enumerate() {
            network.add(Box::new(DenseLayer::new(fan_in, *width, rng)));
            if i + 1 < widths.len() {
                network.add(Box::new(activation.layer()));
            }
            fan_in = *width;
        }
        network
    }

    // add layer to network
    pub fn add(&mut self, layer: Box<dyn Layer>) {
        self.layers.push(layer)
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    // predict output for given input
    pub fn predict(&self, input: &Array2<f64>) -> Array2<f64> {
        let mut output = input.clone();
        for layer in &self.layers {
            output = layer.forward(&output);
        }
        output
    }

    // one gradient step over the whole batch, returns the loss before the step
    pub fn fit(&mut self, x_train: Array2<f64>, y_train: &Array2<f64>) -> f64 {
        // forward propagation
        let mut output = x_train;
        for layer in &mut self.layers {
            output = layer.forward_propagation(output);
        }

        // backward propagation
        let mut error = (self.loss_prime)(y_train, &output);
        for layer in self.layers.iter_mut().rev() {
            error = layer.backward_propagation(error, self.learning_rate)
        }

        (self.loss)(y_train, &output).unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn network(seed: u64) -> Network {
        let mut rng = StdRng::seed_from_u64(seed);
        Network::regression(2, &[8, 1], Activation::Tanh, 0.05, &mut rng)
    }

    #[test]
    fn regression_outputs_one_value_per_row() {
        let net = network(1);
        let out = net.predict(&arr2(&[[0.0, 1.0], [1.0, 0.0], [1.0, 1.0]]));
        assert_eq!(out.dim(), (3, 1));
    }

    #[test]
    fn same_seed_same_weights() {
        let x = arr2(&[[0.3, -0.7]]);
        assert_eq!(network(9).predict(&x), network(9).predict(&x));
    }

    #[test]
    fn fitting_reduces_loss() {
        let mut net = network(5);
        let x = arr2(&[[0.0, 1.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]);
        let y = arr2(&[[0.5], [-0.5], [0.2], [0.0]]);
        let first = net.fit(x.clone(), &y);
        let mut last = first;
        for _ in 0..500 {
            last = net.fit(x.clone(), &y);
        }
        assert!(last < first, "loss went from {first} to {last}");
    }

    #[test]
    fn predict_is_repeatable() {
        let net = network(2);
        let x = arr2(&[[0.1, 0.2]]);
        assert_eq!(net.predict(&x), net.predict(&x));
    }
}
