//! Agglomerative clustering over a distance matrix.
//!
//! Clusters are merged greedily with a pluggable [`LinkageCriterion`]; the
//! resulting [`ClusterTree`] can be cut into a fixed number of groups, and
//! [`evaluate_cuts`] walks every cut level to measure cohesion.

use crate::assignment::ClusterAssignment;
use crate::distance::DistanceMatrix;
use crate::error::{ClusterError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Rule for measuring the distance between clusters.
///
/// Implementations express the rule as a Lance-Williams update: given the
/// distances from cluster `k` to clusters `i` and `j`, and between `i` and `j`,
/// return the distance from `k` to the union of `i` and `j`.
pub trait LinkageCriterion {
    fn name(&self) -> &str;

    fn update(&self, d_ki: f64, d_kj: f64, d_ij: f64, n_i: usize, n_j: usize, n_k: usize) -> f64;

    /// Transform applied to input distances before merging
    fn prepare(&self, distance: f64) -> f64 {
        distance
    }

    /// Transform applied to merge distances before they are recorded as heights
    fn height(&self, merged: f64) -> f64 {
        merged
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Linkage {
    Single,
    Complete,
    Average,
    /// Weighted average (WPGMA)
    #[serde(rename = "mcquitty")]
    McQuitty,
    /// Minimum variance, applied to the distances as given
    #[default]
    Ward,
    /// Minimum variance on squared distances; heights reported on the original scale
    WardD2,
}

impl Linkage {
    pub const ALL: [Linkage; 6] = [
        Linkage::Single,
        Linkage::Complete,
        Linkage::Average,
        Linkage::McQuitty,
        Linkage::Ward,
        Linkage::WardD2,
    ];
}

impl LinkageCriterion for Linkage {
    fn name(&self) -> &str {
        match self {
            Linkage::Single => "single",
            Linkage::Complete => "complete",
            Linkage::Average => "average",
            Linkage::McQuitty => "mcquitty",
            Linkage::Ward => "ward",
            Linkage::WardD2 => "ward-d2",
        }
    }

    fn update(&self, d_ki: f64, d_kj: f64, d_ij: f64, n_i: usize, n_j: usize, n_k: usize) -> f64 {
        let (n_i, n_j, n_k) = (n_i as f64, n_j as f64, n_k as f64);
        match self {
            Linkage::Single => d_ki.min(d_kj),
            Linkage::Complete => d_ki.max(d_kj),
            Linkage::Average => (n_i * d_ki + n_j * d_kj) / (n_i + n_j),
            Linkage::McQuitty => 0.5 * (d_ki + d_kj),
            Linkage::Ward | Linkage::WardD2 => {
                ((n_i + n_k) * d_ki + (n_j + n_k) * d_kj - n_k * d_ij) / (n_i + n_j + n_k)
            }
        }
    }

    fn prepare(&self, distance: f64) -> f64 {
        match self {
            Linkage::WardD2 => distance * distance,
            _ => distance,
        }
    }

    fn height(&self, merged: f64) -> f64 {
        match self {
            Linkage::WardD2 => merged.max(0.0).sqrt(),
            _ => merged,
        }
    }
}

impl fmt::Display for Linkage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Linkage {
    type Err = ClusterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "single" => Ok(Linkage::Single),
            "complete" => Ok(Linkage::Complete),
            "average" => Ok(Linkage::Average),
            "mcquitty" | "weighted" => Ok(Linkage::McQuitty),
            "ward" | "ward.d" => Ok(Linkage::Ward),
            "ward-d2" | "ward.d2" => Ok(Linkage::WardD2),
            other => Err(ClusterError::Config(format!("unknown linkage '{}'", other))),
        }
    }
}

/// Either an original document or an earlier merge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Node {
    Leaf(usize),
    Merge(usize),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Merge {
    pub left: Node,
    pub right: Node,
    pub height: f64,
    pub size: usize,
}

/// Binary merge history over the documents, in merge order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterTree {
    labels: Vec<String>,
    merges: Vec<Merge>,
    linkage: String,
}

impl ClusterTree {
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn merges(&self) -> &[Merge] {
        &self.merges
    }

    pub fn linkage(&self) -> &str {
        &self.linkage
    }

    /// Number of documents (leaves)
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn heights(&self) -> Vec<f64> {
        self.merges.iter().map(|m| m.height).collect()
    }

    /// Leaf order for drawing a dendrogram: left subtree before right
    pub fn order(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.len());
        let root = match self.merges.len() {
            0 if self.len() == 1 => Node::Leaf(0),
            0 => return order,
            m => Node::Merge(m - 1),
        };

        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            match node {
                Node::Leaf(doc) => order.push(doc),
                Node::Merge(m) => {
                    stack.push(self.merges[m].right);
                    stack.push(self.merges[m].left);
                }
            }
        }
        order
    }

    /// Group ids once `k - 1` merges are undone from the top; `k` is not validated.
    ///
    /// Only a merge whose parent is already undone can be undone next. Among
    /// those the highest goes first, and on equal heights the earliest formed.
    fn groups(&self, k: usize) -> Vec<usize> {
        let n = self.len();
        let mut kept = vec![true; self.merges.len()];
        let mut frontier: Vec<usize> = self.merges.len().checked_sub(1).into_iter().collect();

        for _ in 1..k {
            let Some(pos) = (0..frontier.len()).max_by(|&a, &b| {
                let (ma, mb) = (frontier[a], frontier[b]);
                self.merges[ma]
                    .height
                    .total_cmp(&self.merges[mb].height)
                    .then(mb.cmp(&ma))
            }) else {
                break;
            };
            let m = frontier.swap_remove(pos);
            kept[m] = false;
            for child in [self.merges[m].left, self.merges[m].right] {
                if let Node::Merge(c) = child {
                    frontier.push(c);
                }
            }
        }

        // any leaf stands in for its subtree: children of a kept merge are kept
        let mut representative = Vec::with_capacity(self.merges.len());
        for merge in &self.merges {
            representative.push(match merge.left {
                Node::Leaf(doc) => doc,
                Node::Merge(m) => representative[m],
            });
        }
        let leaf_of = |node: Node| match node {
            Node::Leaf(doc) => doc,
            Node::Merge(m) => representative[m],
        };

        fn find(parent: &mut [usize], mut x: usize) -> usize {
            while parent[x] != x {
                parent[x] = parent[parent[x]];
                x = parent[x];
            }
            x
        }

        let mut parent: Vec<usize> = (0..n).collect();
        for (merge, _) in self.merges.iter().zip(&kept).filter(|&(_, &keep)| keep) {
            let a = find(&mut parent, leaf_of(merge.left));
            let b = find(&mut parent, leaf_of(merge.right));
            parent[b] = a;
        }

        (0..n).map(|doc| find(&mut parent, doc)).collect()
    }

    fn assignment(&self, k: usize) -> ClusterAssignment {
        ClusterAssignment::from_groups(self.labels.clone(), &self.groups(k))
    }
}

/// Build the merge tree: start from singletons and repeatedly merge the closest
/// pair of clusters until one remains. Ties go to the lowest index pair.
///
/// Runs in O(n³); intended for corpora of tens of documents.
pub fn agglomerate<L: LinkageCriterion + ?Sized>(
    distances: &DistanceMatrix,
    linkage: &L,
) -> Result<ClusterTree> {
    let n = distances.len();
    if n == 0 {
        return Err(ClusterError::EmptyCorpus);
    }

    let mut d: Vec<Vec<f64>> = (0..n)
        .map(|i| distances.row(i).iter().map(|&x| linkage.prepare(x)).collect())
        .collect();
    let mut active = vec![true; n];
    let mut sizes = vec![1usize; n];
    let mut nodes: Vec<Node> = (0..n).map(Node::Leaf).collect();
    let mut merges = Vec::with_capacity(n.saturating_sub(1));

    for _ in 1..n {
        let mut best: Option<(usize, usize, f64)> = None;
        for i in (0..n).filter(|&i| active[i]) {
            for j in ((i + 1)..n).filter(|&j| active[j]) {
                if best.map_or(true, |(_, _, b)| d[i][j] < b) {
                    best = Some((i, j, d[i][j]));
                }
            }
        }
        let Some((i, j, d_ij)) = best else {
            break;
        };

        for k in (0..n).filter(|&k| active[k] && k != i && k != j) {
            let updated = linkage.update(d[k][i], d[k][j], d_ij, sizes[i], sizes[j], sizes[k]);
            d[k][i] = updated;
            d[i][k] = updated;
        }

        merges.push(Merge {
            left: nodes[i],
            right: nodes[j],
            height: linkage.height(d_ij),
            size: sizes[i] + sizes[j],
        });
        nodes[i] = Node::Merge(merges.len() - 1);
        sizes[i] += sizes[j];
        active[j] = false;
    }

    debug!(
        documents = n,
        linkage = linkage.name(),
        top_height = merges.last().map(|m| m.height).unwrap_or(0.0),
        "Built cluster tree"
    );

    Ok(ClusterTree {
        labels: distances.labels().to_vec(),
        merges,
        linkage: linkage.name().to_string(),
    })
}

/// Cut the tree into exactly `k` clusters, `1 <= k < n`.
///
/// Merges are undone from the top by height; among merges of equal height the
/// one formed first is separated first.
pub fn cut_tree(tree: &ClusterTree, k: usize) -> Result<ClusterAssignment> {
    let n = tree.len();
    if k < 1 || k >= n {
        return Err(ClusterError::InvalidClusterCount { k, documents: n });
    }
    Ok(tree.assignment(k))
}

/// Cohesion of the clustering at one cut level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutQuality {
    /// Number of top merges undone
    pub cut_level: usize,
    pub clusters: usize,
    pub mean_cluster_size: f64,
    /// Mean over clusters with at least two members of their mean pairwise
    /// distance; `None` when every cluster is a singleton
    pub mean_intra_distance: Option<f64>,
}

/// Lazy walk over cut levels `1..n`; level `l` yields `l + 1` clusters.
///
/// Each level rescans all intra-cluster pairs, O(n) levels x O(n²) pairs:
/// fine for tens of documents, not for large corpora.
pub struct CutEvaluation<'a> {
    tree: &'a ClusterTree,
    distances: &'a DistanceMatrix,
    level: usize,
}

impl Iterator for CutEvaluation<'_> {
    type Item = CutQuality;

    fn next(&mut self) -> Option<CutQuality> {
        let n = self.tree.len();
        if self.level >= n {
            return None;
        }
        let level = self.level;
        self.level += 1;

        let assignment = self.tree.assignment(level + 1);
        let clusters = assignment.clusters();

        let cohesion: Vec<f64> = clusters
            .iter()
            .filter(|members| members.len() >= 2)
            .map(|members| mean_pairwise_distance(members, self.distances))
            .collect();

        let mean_intra_distance = if cohesion.is_empty() {
            None
        } else {
            Some(cohesion.iter().sum::<f64>() / cohesion.len() as f64)
        };

        Some(CutQuality {
            cut_level: level,
            clusters: clusters.len(),
            mean_cluster_size: n as f64 / clusters.len() as f64,
            mean_intra_distance,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.tree.len().saturating_sub(self.level);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for CutEvaluation<'_> {}

fn mean_pairwise_distance(members: &[usize], distances: &DistanceMatrix) -> f64 {
    let mut total = 0.0;
    let mut pairs = 0usize;
    for (a, &i) in members.iter().enumerate() {
        for &j in &members[a + 1..] {
            total += distances.get(i, j);
            pairs += 1;
        }
    }
    total / pairs as f64
}

pub fn evaluate_cuts<'a>(
    tree: &'a ClusterTree,
    distances: &'a DistanceMatrix,
) -> Result<CutEvaluation<'a>> {
    if distances.len() != tree.len() {
        return Err(ClusterError::DimensionMismatch {
            expected: tree.len(),
            found: distances.len(),
        });
    }
    Ok(CutEvaluation {
        tree,
        distances,
        level: 1,
    })
}
