use std::fmt::Debug;

use ndarray::{Array, Array2, Axis};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand::Rng;

pub type ActivationFn = fn(&Array2<f64>) -> Array2<f64>;

pub trait Layer: Debug {
    // computes the output Y of a layer for a given input X, leaving the layer untouched
    fn forward(&self, input: &Array2<f64>) -> Array2<f64>;
    // same as forward, but keeps X around for the backward pass
    fn forward_propagation(&mut self, input: Array2<f64>) -> Array2<f64>;
    // computes dE/dX for a given dE/dY (and update parameters if any)
    fn backward_propagation(
        &mut self,
        output_error: Array2<f64>,
        learning_rate: f64,
    ) -> Array2<f64>;
}

#[derive(Debug, Clone)]
pub struct DenseLayer {
    input: Array2<f64>,
    weights: Array2<f64>,
    bias: Array2<f64>,
}

impl DenseLayer {
    pub fn new<R: Rng + ?Sized>(input_size: usize, output_size: usize, rng: &mut R) -> Self {
        let limit: f64 = 1.0 / (input_size.max(1) as f64).sqrt();
        let dist = Uniform::new(-limit, limit);
        Self {
            input: Array2::zeros((0, input_size)),
            weights: Array::random_using((input_size, output_size), dist, rng),
            bias: Array::random_using((1, output_size), dist, rng),
        }
    }

    pub fn input_size(&self) -> usize {
        self.weights.nrows()
    }

    pub fn output_size(&self) -> usize {
        self.weights.ncols()
    }
}

impl Layer for DenseLayer {
    fn forward(&self, input: &Array2<f64>) -> Array2<f64> {
        input.dot(&self.weights) + &self.bias
    }

    fn forward_propagation(&mut self, input: Array2<f64>) -> Array2<f64> {
        self.input = input;
        self.forward(&self.input)
    }

    fn backward_propagation(
        &mut self,
        output_error: Array2<f64>,
        learning_rate: f64,
    ) -> Array2<f64> {
        let input_error = output_error.dot(&self.weights.t());
        let weights_error = self.input.t().dot(&output_error);
        let bias_error = output_error.sum_axis(Axis(0)).insert_axis(Axis(0));
        self.weights.scaled_add(-learning_rate, &weights_error);
        self.bias.scaled_add(-learning_rate, &bias_error);
        input_error
    }
}

pub struct ActivationLayer {
    name: &'static str,
    input: Array2<f64>,
    activation: ActivationFn,
    activation_prime: ActivationFn,
}

impl Debug for ActivationLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivationLayer")
            .field("name", &self.name)
            .finish()
    }
}

impl ActivationLayer {
    pub fn new(name: &'static str, activation: ActivationFn, activation_prime: ActivationFn) -> Self {
        Self {
            name,
            input: Array2::zeros((0, 0)),
            activation,
            activation_prime,
        }
    }
}

impl Layer for ActivationLayer {
    fn forward(&self, input: &Array2<f64>) -> Array2<f64> {
        (self.activation)(input)
    }

    fn forward_propagation(&mut self, input: Array2<f64>) -> Array2<f64> {
        self.input = input;
        (self.activation)(&self.input)
    }

    fn backward_propagation(
        &mut self,
        output_error: Array2<f64>,
        _learning_rate: f64,
    ) -> Array2<f64> {
        (self.activation_prime)(&self.input) * output_error
    }
}
