use ndarray::Array2;

pub fn tanh(x: &Array2<f64>) -> Array2<f64> {
    x.map(|v| v.tanh())
}

pub fn tanh_prime(x: &Array2<f64>) -> Array2<f64> {
    x.map(|v| 1.0 - v.tanh().powi(2))
}

pub fn relu(x: &Array2<f64>) -> Array2<f64> {
    x.map(|v| v.max(0.0))
}

pub fn relu_prime(x: &Array2<f64>) -> Array2<f64> {
    x.map(|v| if *v > 0.0 { 1.0 } else { 0.0 })
}
