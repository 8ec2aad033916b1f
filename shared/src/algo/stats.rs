//! Statistical functions for run summaries and testing

/// Arithmetic mean of the non-NaN values, or `None` when there are none.
pub fn mean(values: &[f64]) -> Option<f64> {
    let (sum, n) = values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        None
    } else {
        Some(sum / n as f64)
    }
}

/// Sample standard deviation (n - 1 denominator) of the non-NaN values.
///
/// Returns `None` when fewer than two valid values are available.
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let valid: Vec<f64> = values.iter().filter(|v| !v.is_nan()).copied().collect();
    if valid.len() < 2 {
        return None;
    }
    let m = valid.iter().sum::<f64>() / valid.len() as f64;
    let var = valid.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (valid.len() - 1) as f64;
    Some(var.sqrt())
}

/// Median of the non-NaN values; the mean of the two middle values for an
/// even count. `None` when no valid value remains.
pub fn median(values: &[f64]) -> Option<f64> {
    let mut valid: Vec<f64> = values.iter().filter(|v| !v.is_nan()).copied().collect();
    if valid.is_empty() {
        return None;
    }
    valid.sort_unstable_by(f64::total_cmp);
    let mid = valid.len() / 2;
    if valid.len() % 2 == 0 {
        Some((valid[mid - 1] + valid[mid]) / 2.0)
    } else {
        Some(valid[mid])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mean_skips_nan() {
        assert_relative_eq!(mean(&[1.0, 2.0, f64::NAN, 3.0]).unwrap(), 2.0);
        assert!(mean(&[]).is_none());
        assert!(mean(&[f64::NAN]).is_none());
    }

    #[test]
    fn test_std_dev_sample() {
        // Sample std of 2,4,4,4,5,5,7,9 is sqrt(32/7)
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_relative_eq!(std_dev(&values).unwrap(), (32.0f64 / 7.0).sqrt(), epsilon = 1e-12);
        assert!(std_dev(&[1.0]).is_none());
    }

    #[test]
    fn test_median_odd_even() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(&[5.0, f64::NAN, 1.0]), Some(3.0));
        assert_eq!(median(&[f64::INFINITY, 1.0, 2.0]), Some(2.0));
        assert!(median(&[f64::NAN]).is_none());
        assert!(median(&[]).is_none());
    }
}
