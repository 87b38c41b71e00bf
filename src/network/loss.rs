use ndarray::Array2;

pub fn mse(y_true: &Array2<f64>, y_pred: &Array2<f64>) -> Option<f64> {
    (y_true - y_pred).map(|v| v.powi(2)).mean()
}

pub fn mse_prime(y_true: &Array2<f64>, y_pred: &Array2<f64>) -> Array2<f64> {
    2.0 * (y_pred - y_true) / (y_true.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::arr2;

    #[test]
    fn mse_of_known_batch() {
        let y_true = arr2(&[[1.0], [0.0]]);
        let y_pred = arr2(&[[0.5], [1.0]]);
        assert_relative_eq!(mse(&y_true, &y_pred).unwrap_or(f64::NAN), 0.625);
        assert_eq!(mse_prime(&y_true, &y_pred), arr2(&[[-0.5], [1.0]]));
    }

    #[test]
    fn mse_of_empty_batch_is_none() {
        let empty: Array2<f64> = Array2::zeros((0, 1));
        assert!(mse(&empty, &empty).is_none());
    }
}
