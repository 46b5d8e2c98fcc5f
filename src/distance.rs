use crate::error::{ClusterError, Result};
use crate::vectorizer::{l2_norm, TfIdfMatrix};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Symmetric documents x documents distances, zero diagonal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceMatrix {
    labels: Vec<String>,
    values: Vec<f64>,
}

impl DistanceMatrix {
    /// Build from a full square table; the caller guarantees symmetry
    pub fn from_rows(labels: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self> {
        let n = labels.len();
        let mut values = Vec::with_capacity(n * n);
        for row in rows.iter() {
            if row.len() != n {
                return Err(ClusterError::DimensionMismatch {
                    expected: n,
                    found: row.len(),
                });
            }
            values.extend_from_slice(row);
        }
        if rows.len() != n {
            return Err(ClusterError::DimensionMismatch {
                expected: n,
                found: rows.len(),
            });
        }
        Ok(Self { labels, values })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.len() + j]
    }

    pub fn row(&self, i: usize) -> &[f64] {
        let n = self.len();
        &self.values[i * n..(i + 1) * n]
    }

    /// Distance between two documents by filename
    pub fn between(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.labels.iter().position(|l| l == a)?;
        let j = self.labels.iter().position(|l| l == b)?;
        Some(self.get(i, j))
    }
}

/// Pairwise cosine distance `1 - cos(v_i, v_j)`, clamped to [0, 2].
///
/// A zero vector (every term filtered out) sits at distance 1 from every other
/// document instead of producing a division by zero.
pub fn cosine_distance(matrix: &TfIdfMatrix) -> Result<DistanceMatrix> {
    if matrix.n_terms() == 0 {
        return Err(ClusterError::EmptyVocabulary);
    }

    let n = matrix.n_docs();
    let norms: Vec<f64> = matrix.rows().iter().map(|r| l2_norm(r)).collect();
    let mut values = vec![0.0; n * n];

    for i in 0..n {
        for j in (i + 1)..n {
            let d = if norms[i] == 0.0 || norms[j] == 0.0 {
                1.0
            } else {
                let dot: f64 = matrix
                    .row(i)
                    .iter()
                    .zip(matrix.row(j))
                    .map(|(a, b)| a * b)
                    .sum();
                (1.0 - dot / (norms[i] * norms[j])).clamp(0.0, 2.0)
            };
            values[i * n + j] = d;
            values[j * n + i] = d;
        }
    }

    let zero_rows = norms.iter().filter(|&&x| x == 0.0).count();
    debug!(documents = n, zero_rows, "Computed cosine distances");

    Ok(DistanceMatrix {
        labels: matrix.labels().to_vec(),
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(rows: Vec<Vec<f64>>) -> TfIdfMatrix {
        let labels = (0..rows.len()).map(|i| format!("doc{}", i)).collect();
        let terms = (0..rows[0].len()).map(|i| format!("t{}", i)).collect();
        TfIdfMatrix::new(labels, terms, rows)
    }

    #[test]
    fn test_cosine_distance_properties() -> Result<()> {
        let m = matrix(vec![
            vec![1.0, 0.0, 2.0],
            vec![-1.0, 0.0, -2.0],
            vec![0.5, 3.0, 0.0],
            vec![2.0, 0.0, 4.0],
        ]);
        let d = cosine_distance(&m)?;

        for i in 0..d.len() {
            assert_eq!(d.get(i, i), 0.0);
            for j in 0..d.len() {
                assert_eq!(d.get(i, j), d.get(j, i));
                assert!((0.0..=2.0).contains(&d.get(i, j)));
            }
        }
        assert!((d.get(0, 1) - 2.0).abs() < 1e-12);
        assert!(d.get(0, 3).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn test_zero_vector_is_neutral() -> Result<()> {
        let m = matrix(vec![vec![1.0, 1.0], vec![0.0, 0.0], vec![1.0, 0.0]]);
        let d = cosine_distance(&m)?;

        assert_eq!(d.get(1, 0), 1.0);
        assert_eq!(d.get(1, 2), 1.0);
        assert_eq!(d.get(1, 1), 0.0);
        Ok(())
    }

    #[test]
    fn test_empty_vocabulary() {
        let m = TfIdfMatrix::new(vec!["a".into(), "b".into()], vec![], vec![vec![], vec![]]);
        assert!(matches!(cosine_distance(&m), Err(ClusterError::EmptyVocabulary)));
    }

    #[test]
    fn test_from_rows_checks_shape() {
        let err = DistanceMatrix::from_rows(vec!["a".into(), "b".into()], vec![vec![0.0, 1.0]]);
        assert!(matches!(err, Err(ClusterError::DimensionMismatch { .. })));
    }
}
