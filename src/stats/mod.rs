//! # Hypothesis Tests
//!
//! - `paired_t_test`: mean of paired differences against zero, two-tailed
//! - `ks_two_sample`: maximum distance between two empirical CDFs, with the
//!   asymptotic Kolmogorov p-value

pub mod special;

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::{Error, Result};

/// Test statistic and two-sided p-value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    #[serde(with = "crate::model::value::float_repr")]
    pub statistic: f64,
    pub p_value: f64,
}

/// Paired t-test on subject-aligned samples.
///
/// When every difference is identical the variance is zero: all-zero
/// differences give `t = 0, p = 1`; a constant non-zero shift gives
/// `t = ±inf, p = 0`.
pub fn paired_t_test(a: &[f64], b: &[f64]) -> Result<TestResult> {
    if a.len() != b.len() {
        return Err(Error::InvalidParameter(format!(
            "paired samples differ in length: {} vs {}",
            a.len(),
            b.len()
        )));
    }
    let n = a.len();
    if n < 2 {
        return Err(Error::InsufficientData(format!(
            "paired t-test needs at least 2 pairs, got {n}"
        )));
    }
    if a.iter().chain(b).any(|v| !v.is_finite()) {
        return Err(Error::InvalidParameter("paired samples contain non-finite values".into()));
    }

    let diffs: Vec<f64> = a.iter().zip(b).map(|(x, y)| x - y).collect();
    let nf = n as f64;
    let mean = diffs.iter().sum::<f64>() / nf;
    let var = diffs.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / (nf - 1.0);

    if var == 0.0 {
        return Ok(if mean == 0.0 {
            TestResult { statistic: 0.0, p_value: 1.0 }
        } else {
            TestResult { statistic: f64::INFINITY.copysign(mean), p_value: 0.0 }
        });
    }

    let t = mean / (var / nf).sqrt();
    Ok(TestResult {
        statistic: t,
        p_value: student_t_two_sided(t, nf - 1.0)?,
    })
}

/// Two-sided p-value of Student's t with `df` degrees of freedom.
fn student_t_two_sided(t: f64, df: f64) -> Result<f64> {
    let dist = StudentsT::new(0.0, 1.0, df)
        .map_err(|e| Error::InvalidParameter(format!("Student's t with df = {df}: {e}")))?;
    Ok((2.0 * dist.sf(t.abs())).clamp(0.0, 1.0))
}

/// Two-sample Kolmogorov–Smirnov test. Sample sizes may differ.
pub fn ks_two_sample(a: &[f64], b: &[f64]) -> Result<TestResult> {
    if a.is_empty() || b.is_empty() {
        return Err(Error::InsufficientData(format!(
            "KS test needs two non-empty samples, got sizes {} and {}",
            a.len(),
            b.len()
        )));
    }
    if a.iter().chain(b).any(|v| v.is_nan()) {
        return Err(Error::InvalidParameter("KS samples contain NaN".into()));
    }

    let mut a = a.to_vec();
    let mut b = b.to_vec();
    a.sort_by(f64::total_cmp);
    b.sort_by(f64::total_cmp);

    let d = max_cdf_distance(&a, &b);
    let (n1, n2) = (a.len() as f64, b.len() as f64);
    let en = (n1 * n2 / (n1 + n2)).sqrt();
    let lambda = (en + 0.12 + 0.11 / en) * d;

    Ok(TestResult {
        statistic: d,
        p_value: special::kolmogorov_survival(lambda),
    })
}

/// `sup |F_a(x) − F_b(x)|` over sorted samples, evaluated after each
/// distinct value so ties step both CDFs together.
fn max_cdf_distance(a: &[f64], b: &[f64]) -> f64 {
    let (n1, n2) = (a.len() as f64, b.len() as f64);
    let (mut i, mut j) = (0, 0);
    let mut d: f64 = 0.0;
    while i < a.len() && j < b.len() {
        let x = a[i].min(b[j]);
        while i < a.len() && a[i] <= x {
            i += 1;
        }
        while j < b.len() && b[j] <= x {
            j += 1;
        }
        d = d.max((i as f64 / n1 - j as f64 / n2).abs());
    }
    d
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paired_identical_samples() {
        let a = [0.3, 0.5, 0.2, 0.9, 0.4];
        let r = paired_t_test(&a, &a).unwrap();
        assert_eq!(r.statistic, 0.0);
        assert_eq!(r.p_value, 1.0);
    }

    #[test]
    fn test_paired_reference_value() {
        // Differences 1..=5: t = 3 / sqrt(2.5 / 5) = 4.2426, df = 4, p ≈ 0.01324.
        let a = [2.0, 4.0, 6.0, 8.0, 10.0];
        let b = [1.0, 2.0, 3.0, 4.0, 5.0];
        let r = paired_t_test(&a, &b).unwrap();
        assert!((r.statistic - 4.242_640_687).abs() < 1e-6);
        assert!((r.p_value - 0.013_236).abs() < 1e-4);
    }

    #[test]
    fn test_student_t_reference_values() {
        assert!((student_t_two_sided(0.0, 4.0).unwrap() - 1.0).abs() < 1e-12);
        // 2.776445 is the 97.5% quantile for df = 4.
        assert!((student_t_two_sided(2.776_445, 4.0).unwrap() - 0.05).abs() < 1e-4);
        assert!((student_t_two_sided(-2.776_445, 4.0).unwrap() - 0.05).abs() < 1e-4);
    }

    #[test]
    fn test_paired_constant_shift() {
        let r = paired_t_test(&[2.0, 3.0, 4.0], &[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(r.statistic, f64::INFINITY);
        assert_eq!(r.p_value, 0.0);
    }

    #[test]
    fn test_paired_too_few_pairs() {
        assert!(matches!(paired_t_test(&[1.0], &[2.0]), Err(Error::InsufficientData(_))));
        assert!(matches!(paired_t_test(&[1.0, 2.0], &[2.0]), Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn test_ks_statistic_with_ties() {
        let r = ks_two_sample(&[1.0, 2.0, 3.0], &[2.0, 3.0, 4.0]).unwrap();
        assert!((r.statistic - 1.0 / 3.0).abs() < 1e-12);
        assert!(r.p_value > 0.5);
    }

    #[test]
    fn test_ks_identical_and_separated() {
        let a: Vec<f64> = (0..50).map(|i| i as f64).collect();
        let same = ks_two_sample(&a, &a).unwrap();
        assert_eq!(same.statistic, 0.0);
        assert_eq!(same.p_value, 1.0);

        let b: Vec<f64> = (100..150).map(|i| i as f64).collect();
        let apart = ks_two_sample(&a, &b).unwrap();
        assert_eq!(apart.statistic, 1.0);
        assert!(apart.p_value < 1e-6);
    }

    #[test]
    fn test_ks_unequal_sizes() {
        let r = ks_two_sample(&[0.1, 0.2], &[0.1, 0.2, 0.3, 0.4]).unwrap();
        assert!((r.statistic - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_ks_empty_sample() {
        assert!(matches!(ks_two_sample(&[], &[1.0]), Err(Error::InsufficientData(_))));
    }
}
