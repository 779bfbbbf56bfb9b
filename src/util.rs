use crate::error::{Error, Result};

/// Check that `data` is a non-empty, rectangular, finite matrix.
///
/// Returns `(n_rows, n_cols)`.
pub(crate) fn validate_matrix(data: &[Vec<f32>]) -> Result<(usize, usize)> {
    let n = data.len();
    if n == 0 {
        return Err(Error::EmptyInput);
    }
    let d = data[0].len();
    if d == 0 {
        return Err(Error::EmptyInput);
    }

    for (row, point) in data.iter().enumerate() {
        if point.len() != d {
            return Err(Error::DimensionMismatch {
                expected: d,
                found: point.len(),
            });
        }
        if let Some(col) = point.iter().position(|x| !x.is_finite()) {
            return Err(Error::NonFinite { row, col });
        }
    }

    Ok((n, d))
}

/// Squared Euclidean distance, accumulated in f64 so that finite f32 inputs
/// never overflow.
#[inline]
pub(crate) fn squared_euclidean(a: &[f32], b: &[f32]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let d = f64::from(x) - f64::from(y);
            d * d
        })
        .sum()
}

/// Per-column mean, accumulated in f64.
pub(crate) fn column_means(data: &[Vec<f32>], d: usize) -> Vec<f64> {
    let mut means = vec![0.0f64; d];
    for row in data {
        for (m, &x) in means.iter_mut().zip(row.iter()) {
            *m += f64::from(x);
        }
    }
    let n = data.len() as f64;
    for m in &mut means {
        *m /= n;
    }
    means
}

#[inline]
pub(crate) fn dot(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}
