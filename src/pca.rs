use crate::error::{ClusterError, Result};
use crate::vectorizer::TfIdfMatrix;
use serde::{Deserialize, Serialize};

const MAX_POWER_ITERATIONS: usize = 1000;
const CONVERGENCE: f64 = 1e-12;

/// First two principal component scores per document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PcaProjection {
    pub labels: Vec<String>,
    pub points: Vec<(f64, f64)>,
    /// Variance along each component
    pub variance: (f64, f64),
    /// Share of the total variance carried by each component
    pub proportion: (f64, f64),
}

impl PcaProjection {
    pub fn point(&self, label: &str) -> Option<(f64, f64)> {
        let i = self.labels.iter().position(|l| l == label)?;
        Some(self.points[i])
    }
}

/// Project documents onto their first two principal components.
///
/// Columns are centred but not scaled. Components come from power iteration
/// on the documents x documents Gram matrix, which stays small however large
/// the vocabulary is. Each component's sign is fixed so its largest-magnitude
/// score is positive.
pub fn project_pca(matrix: &TfIdfMatrix) -> Result<PcaProjection> {
    let n = matrix.n_docs();
    let p = matrix.n_terms();
    if n == 0 {
        return Err(ClusterError::EmptyCorpus);
    }
    if p == 0 {
        return Err(ClusterError::EmptyVocabulary);
    }

    let mut means = vec![0.0; p];
    for row in matrix.rows() {
        for (m, x) in means.iter_mut().zip(row) {
            *m += x / n as f64;
        }
    }
    let centred: Vec<Vec<f64>> = matrix
        .rows()
        .iter()
        .map(|row| row.iter().zip(&means).map(|(x, m)| x - m).collect())
        .collect();

    let mut gram = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in i..n {
            let dot: f64 = centred[i].iter().zip(&centred[j]).map(|(a, b)| a * b).sum();
            gram[i][j] = dot;
            gram[j][i] = dot;
        }
    }
    let total: f64 = (0..n).map(|i| gram[i][i]).sum();

    let (l1, s1) = leading_component(&gram);
    deflate(&mut gram, l1, &s1);
    let (l2, s2) = leading_component(&gram);

    let scale = |lambda: f64, v: &[f64]| -> Vec<f64> {
        let root = lambda.max(0.0).sqrt();
        v.iter().map(|x| x * root).collect()
    };
    let pc1 = fix_sign(scale(l1, &s1));
    let pc2 = fix_sign(scale(l2, &s2));

    let dof = if n > 1 { (n - 1) as f64 } else { 1.0 };
    let share = |lambda: f64| if total > 0.0 { lambda.max(0.0) / total } else { 0.0 };

    Ok(PcaProjection {
        labels: matrix.labels().to_vec(),
        points: pc1.into_iter().zip(pc2).collect(),
        variance: (l1.max(0.0) / dof, l2.max(0.0) / dof),
        proportion: (share(l1), share(l2)),
    })
}

/// Dominant eigenpair of a symmetric positive semi-definite matrix
fn leading_component(m: &[Vec<f64>]) -> (f64, Vec<f64>) {
    let n = m.len();
    let mut v: Vec<f64> = (1..=n).map(|i| (i as f64).sqrt()).collect();
    normalize(&mut v);

    let mut lambda = 0.0;
    for _ in 0..MAX_POWER_ITERATIONS {
        let mut next: Vec<f64> = m
            .iter()
            .map(|row| row.iter().zip(&v).map(|(a, b)| a * b).sum())
            .collect();
        let norm = normalize(&mut next);
        if norm <= CONVERGENCE {
            return (0.0, vec![0.0; n]);
        }
        let delta: f64 = next.iter().zip(&v).map(|(a, b)| (a - b).abs()).sum();
        v = next;
        lambda = norm;
        if delta < CONVERGENCE {
            break;
        }
    }
    (lambda, v)
}

fn deflate(m: &mut [Vec<f64>], lambda: f64, v: &[f64]) {
    for (i, row) in m.iter_mut().enumerate() {
        for (j, x) in row.iter_mut().enumerate() {
            *x -= lambda * v[i] * v[j];
        }
    }
}

fn normalize(v: &mut [f64]) -> f64 {
    let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm > 0.0 {
        v.iter_mut().for_each(|x| *x /= norm);
    }
    norm
}

fn fix_sign(scores: Vec<f64>) -> Vec<f64> {
    let largest = scores
        .iter()
        .copied()
        .fold(0.0f64, |acc, x| if x.abs() > acc.abs() { x } else { acc });
    if largest < 0.0 {
        scores.into_iter().map(|x| -x).collect()
    } else {
        scores
    }
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
    fn test_first_component_separates_groups() -> Result<()> {
        let m = matrix(vec![
            vec![1.0, 0.0, 0.1],
            vec![0.9, 0.1, 0.0],
            vec![0.0, 1.0, 0.1],
            vec![0.1, 0.9, 0.0],
        ]);
        let pca = project_pca(&m)?;

        let a = pca.points[0].0.signum();
        assert_eq!(pca.points[1].0.signum(), a);
        assert_eq!(pca.points[2].0.signum(), -a);
        assert_eq!(pca.points[3].0.signum(), -a);
        assert!(pca.variance.0 >= pca.variance.1);
        assert!(pca.proportion.0 + pca.proportion.1 <= 1.0 + 1e-9);
        assert!(pca.proportion.0 > 0.8);
        Ok(())
    }

    #[test]
    fn test_scores_match_line_data() -> Result<()> {
        // points on a line: pc1 is the centred coordinate, pc2 vanishes
        let m = matrix(vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![2.0, 0.0]]);
        let pca = project_pca(&m)?;

        let pc1: Vec<f64> = pca.points.iter().map(|p| p.0.abs()).collect();
        assert!((pc1[0] - 1.0).abs() < 1e-9);
        assert!(pc1[1].abs() < 1e-9);
        assert!((pc1[2] - 1.0).abs() < 1e-9);
        assert!(pca.points.iter().all(|p| p.1.abs() < 1e-6));
        assert!((pca.variance.0 - 1.0).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn test_single_document() -> Result<()> {
        let pca = project_pca(&matrix(vec![vec![0.3, 0.7]]))?;
        assert_eq!(pca.point("doc0"), Some((0.0, 0.0)));
        Ok(())
    }
}
