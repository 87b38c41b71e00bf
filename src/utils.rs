use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use plotters::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::RlError;

/// Random source shared by the world, the actor, the critic and the trainer.
pub type SharedRng = Rc<RefCell<StdRng>>;

pub fn shared_rng(seed: Option<u64>) -> SharedRng {
    let rng: StdRng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    Rc::new(RefCell::new(rng))
}

#[inline(always)]
pub fn to_hundredths(value: f64) -> i64 {
    (value * 100.0).round() as i64
}

pub fn moving_average(window: usize, vector: &[f64]) -> Vec<f64> {
    let window = window.max(1);
    let mut aux: usize = 0;
    let mut result: Vec<f64> = vec![];
    while aux < vector.len() {
        let end: usize = if aux + window < vector.len() {
            aux + window
        } else {
            vector.len()
        };
        let slice: &[f64] = &vector[aux..end];
        let r: f64 = slice.iter().sum();
        result.push(r / slice.len() as f64);
        aux = end;
    }
    result
}

fn plot_error<E: std::fmt::Display>(err: E) -> RlError {
    RlError::Plot(err.to_string())
}

pub fn plot_moving_average(
    path: &Path,
    values: &[Vec<f64>],
    colors: &[RGBColor],
    legends: &[&str],
    title: &str,
) -> Result<(), RlError> {
    let root = BitMapBackend::new(path, (1280, 720)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_error)?;

    let max_len: usize = values.iter().map(|v| v.len()).max().unwrap_or(0).max(1);
    let (mut min_y, mut max_y) = values
        .iter()
        .flatten()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        });
    if !min_y.is_finite() || !max_y.is_finite() {
        min_y = 0.0;
        max_y = 1.0;
    }
    if (max_y - min_y).abs() < f64::EPSILON {
        max_y += 1.0;
    }

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 30).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0..max_len, min_y..max_y)
        .map_err(plot_error)?;
    chart.configure_mesh().draw().map_err(plot_error)?;

    for (i, series) in values.iter().enumerate() {
        let color: RGBColor = colors[i % colors.len().max(1)];
        let legend: &str = legends.get(i).copied().unwrap_or("");
        chart
            .draw_series(LineSeries::new(
                series.iter().enumerate().map(|(x, y)| (x, *y)),
                color.stroke_width(2),
            ))
            .map_err(plot_error)?
            .label(legend)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(plot_error)?;
    root.present().map_err(plot_error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn moving_average_averages_each_window() {
        let values = vec![1.0, 3.0, 5.0, 7.0, 10.0];
        assert_eq!(moving_average(2, &values), vec![2.0, 6.0, 10.0]);
    }

    #[test]
    fn moving_average_treats_zero_window_as_one() {
        let values = vec![1.0, 2.0];
        assert_eq!(moving_average(0, &values), values);
    }

    #[test]
    fn seeded_rngs_repeat() {
        let a = shared_rng(Some(7));
        let b = shared_rng(Some(7));
        let xs: Vec<u32> = (0..5).map(|_| a.borrow_mut().gen()).collect();
        let ys: Vec<u32> = (0..5).map(|_| b.borrow_mut().gen()).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn hundredths_round_half_away_from_zero() {
        assert_eq!(to_hundredths(0.125), 13);
        assert_eq!(to_hundredths(-0.014), -1);
        assert_eq!(to_hundredths(2.4), 240);
    }
}
