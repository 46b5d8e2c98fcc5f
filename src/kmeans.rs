use crate::assignment::ClusterAssignment;
use crate::error::{ClusterError, Result};
use crate::vectorizer::{l2_norm, TfIdfMatrix};
use linfa::dataset::AsTargets;
use linfa::traits::{Fit, Predict};
use linfa::DatasetBase;
use linfa_clustering::{KMeans as Lloyd, KMeansInit};
use ndarray::{Array2, Axis};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const NORM_TOLERANCE: f64 = 1e-6;
const CENTROID_TOLERANCE: f64 = 1e-10;

/// Lloyd's k-means with a seeded initialization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KMeans {
    pub k: usize,
    pub max_iterations: usize,
    pub seed: u64,
    /// Independent initializations; the lowest total within-cluster sum of squares wins
    pub restarts: usize,
}

impl KMeans {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            max_iterations: 100,
            seed: 42,
            restarts: 1,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_restarts(mut self, restarts: usize) -> Self {
        self.restarts = restarts;
        self
    }

    /// Cluster L2-normalized rows. All-zero rows are accepted as they are.
    ///
    /// Running out of iterations is not an error: the last assignment is
    /// returned with `converged == false`.
    pub fn fit(&self, matrix: &TfIdfMatrix) -> Result<KMeansResult> {
        let n = matrix.n_docs();
        if matrix.n_terms() == 0 {
            return Err(ClusterError::EmptyVocabulary);
        }
        if self.k < 1 || self.k >= n {
            return Err(ClusterError::InvalidClusterCount {
                k: self.k,
                documents: n,
            });
        }
        if self.max_iterations == 0 || self.restarts == 0 {
            return Err(ClusterError::Config(
                "k-means needs at least one iteration and one restart".to_string(),
            ));
        }
        for (doc, label) in matrix.labels().iter().enumerate() {
            let norm = matrix.norm(doc);
            if norm != 0.0 && (norm - 1.0).abs() > NORM_TOLERANCE {
                return Err(ClusterError::NotNormalized {
                    label: label.clone(),
                    norm,
                });
            }
        }

        let mut data = Array2::<f64>::zeros((n, matrix.n_terms()));
        for (i, row) in matrix.rows().iter().enumerate() {
            for (j, &x) in row.iter().enumerate() {
                data[[i, j]] = x;
            }
        }
        let dataset = DatasetBase::from(data);

        let model = Lloyd::params_with_rng(self.k, StdRng::seed_from_u64(self.seed))
            .init_method(KMeansInit::Random)
            .max_n_iterations(self.max_iterations as u64)
            .n_runs(self.restarts)
            .tolerance(CENTROID_TOLERANCE)
            .fit(&dataset)
            .map_err(|e| ClusterError::KMeans(e.to_string()))?;

        let groups: Vec<usize> = model.predict(&dataset).as_targets().iter().copied().collect();
        let records = dataset.records();
        let centroids = model.centroids();

        let mut within_ss = vec![0.0; centroids.nrows()];
        for (row, &g) in records.axis_iter(Axis(0)).zip(&groups) {
            within_ss[g] += row
                .iter()
                .zip(centroids.row(g))
                .map(|(x, c)| (x - c) * (x - c))
                .sum::<f64>();
        }

        // another Lloyd step would leave a converged solution where it is
        let converged = (&group_means(records, &groups, centroids) - centroids)
            .iter()
            .all(|d| d.abs() < NORM_TOLERANCE);
        if !converged {
            warn!(
                k = self.k,
                max_iterations = self.max_iterations,
                "k-means did not converge; returning last assignment"
            );
        }

        let assignment = ClusterAssignment::from_groups(matrix.labels().to_vec(), &groups);

        // Reorder centroids to follow the relabelled ids; empty clusters drop out
        let mut order = Vec::new();
        for &g in &groups {
            if !order.contains(&g) {
                order.push(g);
            }
        }

        let result = KMeansResult {
            assignment,
            centroids: order.iter().map(|&g| centroids.row(g).to_vec()).collect(),
            within_ss: order.iter().map(|&g| within_ss[g]).collect(),
            converged,
        };
        debug!(
            k = self.k,
            restarts = self.restarts,
            within_ss = result.total_within_ss(),
            "k-means fitted"
        );
        Ok(result)
    }
}

/// Mean of each group's rows; a group without members keeps its fitted centroid
fn group_means(records: &Array2<f64>, groups: &[usize], centroids: &Array2<f64>) -> Array2<f64> {
    let mut means = Array2::<f64>::zeros(centroids.dim());
    let mut counts = vec![0usize; centroids.nrows()];

    for (row, &g) in records.axis_iter(Axis(0)).zip(groups) {
        let mut sum = means.row_mut(g);
        sum += &row;
        counts[g] += 1;
    }

    for (g, &count) in counts.iter().enumerate() {
        if count == 0 {
            means.row_mut(g).assign(&centroids.row(g));
        } else {
            means.row_mut(g).mapv_inplace(|s| s / count as f64);
        }
    }
    means
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KMeansResult {
    pub assignment: ClusterAssignment,
    /// Centroid of cluster `id` at index `id - 1`
    pub centroids: Vec<Vec<f64>>,
    pub within_ss: Vec<f64>,
    pub converged: bool,
}

impl KMeansResult {
    pub fn total_within_ss(&self) -> f64 {
        self.within_ss.iter().sum()
    }

    /// Distance from each document to its own centroid
    pub fn centroid_distances(&self, matrix: &TfIdfMatrix) -> Vec<f64> {
        self.assignment
            .ids()
            .iter()
            .enumerate()
            .map(|(doc, &id)| {
                let diff: Vec<f64> = matrix
                    .row(doc)
                    .iter()
                    .zip(&self.centroids[id - 1])
                    .map(|(x, c)| x - c)
                    .collect();
                l2_norm(&diff)
            })
            .collect()
    }
}
