//! Sample statistics for the rolling and realized volatility.
//!
//! Both measures go through [`sample_std`], so a rolling window spanning every
//! defined return gives bit-for-bit the session's realized volatility.

use statrs::statistics::Statistics;

/// Bessel-corrected standard deviation of a slice; undefined below two values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    Some(values.iter().std_dev()).filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    // numpy: np.std([2, 4, 4, 4, 5, 5, 7, 9], ddof=1)
    const SAMPLE: [f64; 8] = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
    const SAMPLE_STD: f64 = 2.138_089_935_299_395;

    #[test]
    fn test_slice_matches_reference() {
        assert!((sample_std(&SAMPLE).unwrap() - SAMPLE_STD).abs() < 1e-12);
    }

    #[test]
    fn test_fewer_than_two_is_undefined() {
        assert_eq!(sample_std(&[]), None);
        assert_eq!(sample_std(&[1.5]), None);
    }

    #[test]
    fn test_constant_values_have_exact_zero_spread() {
        assert_eq!(sample_std(&[0.01, 0.01]), Some(0.0));
        assert_eq!(sample_std(&[0.0, 0.0, 0.0, 0.0]), Some(0.0));
    }
}
