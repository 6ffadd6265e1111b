//! Pairwise Pearson correlation of city fingerprints.
//!
//! Each fingerprint is standardized to zero mean and unit variance using
//! population statistics (divide by n). The correlation matrix is then
//! `Z · Zᵀ / n`. Only the upper triangle is computed; the lower triangle is
//! mirrored and the diagonal is fixed to 1.0.
//!
//! A fingerprint with zero variance cannot be standardized. Every
//! off-diagonal cell in its row and column is NaN and a
//! [`Diagnostic::DegenerateVector`] is recorded.

use crime_corr_analytics_models::{CorrelationMatrix, Diagnostic, FingerprintMatrix};

use crate::AnalyticsError;

/// Computes the correlation matrix of all fingerprints.
///
/// # Errors
///
/// Returns [`AnalyticsError::Conversion`] if the resulting matrix is not
/// square.
#[allow(clippy::cast_precision_loss, clippy::needless_range_loop)]
pub fn pearson_matrix(
    fingerprints: &FingerprintMatrix,
) -> Result<(CorrelationMatrix, Vec<Diagnostic>), AnalyticsError> {
    let cities = fingerprints.cities();
    let n = fingerprints.offense_types().len() as f64;

    let standardized: Vec<Option<Vec<f64>>> =
        fingerprints.vectors().iter().map(|v| standardize(v)).collect();

    let mut diagnostics = Vec::new();
    for (city, z) in cities.iter().zip(&standardized) {
        if z.is_none() {
            let diagnostic = Diagnostic::DegenerateVector { city: city.clone() };
            log::warn!("{diagnostic}");
            diagnostics.push(diagnostic);
        }
    }

    let size = cities.len();
    let mut values = vec![vec![f64::NAN; size]; size];

    for i in 0..size {
        values[i][i] = 1.0;
        for j in (i + 1)..size {
            let r = match (&standardized[i], &standardized[j]) {
                (Some(a), Some(b)) => (dot(a, b) / n).clamp(-1.0, 1.0),
                _ => f64::NAN,
            };
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    let matrix =
        CorrelationMatrix::new(cities.to_vec(), values).ok_or_else(|| AnalyticsError::Conversion {
            message: "correlation matrix is not square".to_string(),
        })?;

    Ok((matrix, diagnostics))
}

/// Returns `(v - mean) / stddev` with population statistics, or `None`
/// when `v` is empty or has zero variance.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn standardize(v: &[u64]) -> Option<Vec<f64>> {
    if v.is_empty() {
        return None;
    }

    let n = v.len() as f64;
    let mean = v.iter().map(|&x| x as f64).sum::<f64>() / n;
    let variance = v
        .iter()
        .map(|&x| {
            let d = x as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n;

    if variance <= 0.0 {
        return None;
    }

    let stddev = variance.sqrt();
    Some(v.iter().map(|&x| (x as f64 - mean) / stddev).collect())
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fingerprints(vectors: Vec<Vec<u64>>) -> FingerprintMatrix {
        let cities = (0..vectors.len()).map(|i| format!("C{i}")).collect();
        let offenses = (0..vectors[0].len()).map(|j| format!("O{j}")).collect();
        FingerprintMatrix::new(cities, offenses, vectors).unwrap()
    }

    /// Direct covariance / (stddev * stddev) for cross-checking.
    fn reference(a: &[u64], b: &[u64]) -> f64 {
        let n = a.len() as f64;
        let ma = a.iter().map(|&x| x as f64).sum::<f64>() / n;
        let mb = b.iter().map(|&x| x as f64).sum::<f64>() / n;
        let cov = a
            .iter()
            .zip(b)
            .map(|(&x, &y)| (x as f64 - ma) * (y as f64 - mb))
            .sum::<f64>()
            / n;
        let sa = (a.iter().map(|&x| (x as f64 - ma).powi(2)).sum::<f64>() / n).sqrt();
        let sb = (b.iter().map(|&y| (y as f64 - mb).powi(2)).sum::<f64>() / n).sqrt();
        cov / (sa * sb)
    }

    #[test]
    fn matches_direct_pearson() {
        let vectors = vec![vec![10, 3, 0, 7], vec![8, 4, 1, 6], vec![0, 9, 12, 1]];
        let (matrix, diagnostics) = pearson_matrix(&fingerprints(vectors.clone())).unwrap();
        assert!(diagnostics.is_empty());

        for i in 0..3 {
            for j in 0..3 {
                let got = matrix.get(i, j).unwrap();
                let want = if i == j { 1.0 } else { reference(&vectors[i], &vectors[j]) };
                assert!((got - want).abs() < 1e-12, "({i},{j}): {got} vs {want}");
            }
        }
    }

    #[test]
    fn symmetric_with_exact_unit_diagonal() {
        let (matrix, _) =
            pearson_matrix(&fingerprints(vec![vec![1, 2, 3], vec![3, 2, 1], vec![2, 9, 4]])).unwrap();
        assert!(matrix.is_symmetric());
        for i in 0..3 {
            assert_eq!(matrix.get(i, i), Some(1.0));
            for j in 0..3 {
                let r = matrix.get(i, j).unwrap();
                assert!((-1.0..=1.0).contains(&r));
            }
        }
        assert!((matrix.get(0, 1).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn constant_fingerprint_is_undefined_against_everyone() {
        let (matrix, diagnostics) =
            pearson_matrix(&fingerprints(vec![vec![4, 4, 4], vec![1, 5, 2], vec![2, 6, 0]])).unwrap();
        assert_eq!(
            diagnostics,
            vec![Diagnostic::DegenerateVector {
                city: "C0".to_string()
            }]
        );
        assert_eq!(matrix.get(0, 0), Some(1.0));
        assert!(matrix.get(0, 1).unwrap().is_nan());
        assert!(matrix.get(2, 0).unwrap().is_nan());
        assert!(!matrix.get(1, 2).unwrap().is_nan());
        assert_eq!(matrix.between("C1", "C0"), Some(None));
    }

    #[test]
    fn single_offense_type_makes_every_pair_undefined() {
        let (matrix, diagnostics) = pearson_matrix(&fingerprints(vec![vec![3], vec![9]])).unwrap();
        assert_eq!(diagnostics.len(), 2);
        assert!(matrix.get(0, 1).unwrap().is_nan());
        assert_eq!(matrix.get(1, 1), Some(1.0));
    }

    #[test]
    fn standardized_vector_has_zero_mean_unit_variance() {
        let z = standardize(&[2, 4, 4, 4, 5, 5, 7, 9]).unwrap();
        let n = z.len() as f64;
        let mean = z.iter().sum::<f64>() / n;
        let var = z.iter().map(|x| x * x).sum::<f64>() / n;
        assert!(mean.abs() < 1e-12);
        assert!((var - 1.0).abs() < 1e-12);
        assert!(standardize(&[]).is_none());
        assert!(standardize(&[5, 5]).is_none());
    }
}
