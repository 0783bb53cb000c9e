//! k-means over sparse TF-IDF rows
//!
//! Centroids are dense. Distances use `|x|^2 - 2 x.c + |c|^2` so each row
//! only touches its non-zero features.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::ops::RangeInclusive;
use tracing::debug;

use crate::error::{AnalyzerError, Result};
use crate::vectorize::{SparseVector, TfIdfMatrix};

/// k-means parameters
#[derive(Debug, Clone, PartialEq)]
pub struct KMeans {
    k: usize,
    max_iterations: usize,
    tolerance: f64,
    seed: u64,
}

/// Outcome of one k-means run
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansResult {
    /// Cluster code per matrix row
    pub assignments: Vec<usize>,
    pub centroids: Vec<Vec<f64>>,
    /// Sum of squared distances of rows to their centroid
    pub inertia: f64,
    pub iterations: usize,
    pub converged: bool,
}

impl KMeansResult {
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.centroids.len()];
        for code in &self.assignments {
            sizes[*code] += 1;
        }
        sizes
    }
}

/// One point of an elbow curve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElbowPoint {
    pub k: usize,
    pub inertia: f64,
}

impl KMeans {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            max_iterations: 300,
            tolerance: 1e-4,
            seed: 42,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Stop once the summed squared centroid movement is at most `tolerance`
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Partition the rows of `matrix` into `k` clusters
    pub fn fit(&self, matrix: &TfIdfMatrix) -> Result<KMeansResult> {
        if self.k == 0 {
            return Err(AnalyzerError::Clustering(
                "cluster count must be greater than 0".to_string(),
            ));
        }
        let distinct = matrix.distinct_rows();
        if self.k > distinct {
            return Err(AnalyzerError::Clustering(format!(
                "requested {} clusters but only {} distinct rows are available",
                self.k, distinct
            )));
        }

        let rows = matrix.rows();
        let dimensions = matrix.n_features();
        let mut centroids = self.initial_centroids(rows, dimensions);
        let mut iterations = 0;
        let mut converged = false;

        for iteration in 1..=self.max_iterations {
            let norms = squared_norms(&centroids);
            let (assignments, _) = assign(rows, &centroids, &norms);
            let updated = recompute_centroids(rows, &assignments, &centroids, dimensions);

            let shift: f64 = centroids
                .iter()
                .zip(&updated)
                .map(|(old, new)| squared_euclidean(old, new))
                .sum();
            centroids = updated;
            iterations = iteration;

            debug!("k-means iteration {}: centroid shift {:.6}", iteration, shift);
            if shift <= self.tolerance {
                converged = true;
                break;
            }
        }

        let norms = squared_norms(&centroids);
        let (assignments, inertia) = assign(rows, &centroids, &norms);

        Ok(KMeansResult {
            assignments,
            centroids,
            inertia,
            iterations,
            converged,
        })
    }

    /// Inertia for every k in `ks`, for choosing k offline
    pub fn elbow(&self, matrix: &TfIdfMatrix, ks: RangeInclusive<usize>) -> Result<Vec<ElbowPoint>> {
        let max_k = matrix.distinct_rows();
        let mut curve = Vec::new();
        for k in ks.filter(|k| *k > 0 && *k <= max_k) {
            let result = KMeans { k, ..self.clone() }.fit(matrix)?;
            curve.push(ElbowPoint {
                k,
                inertia: result.inertia,
            });
        }
        Ok(curve)
    }

    /// k-means++ seeding from a fixed seed
    fn initial_centroids(&self, rows: &[SparseVector], dimensions: usize) -> Vec<Vec<f64>> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut chosen: Vec<usize> = vec![rng.gen_range(0..rows.len())];
        let mut centroids = vec![rows[chosen[0]].to_dense(dimensions)];

        while centroids.len() < self.k {
            let norms = squared_norms(&centroids);
            let distances: Vec<f64> = rows
                .iter()
                .map(|row| nearest(row, &centroids, &norms).1)
                .collect();
            let total: f64 = distances.iter().sum();

            let next = if total > 0.0 {
                let threshold = rng.gen::<f64>() * total;
                let mut cumulative = 0.0;
                distances
                    .iter()
                    .position(|d| {
                        cumulative += d;
                        *d > 0.0 && cumulative >= threshold
                    })
                    .or_else(|| distances.iter().rposition(|d| *d > 0.0))
            } else {
                None
            };

            // Rows numerically on top of an existing centroid but not identical to one
            let next = next.or_else(|| {
                let taken: HashSet<_> = chosen.iter().map(|i| rows[*i].fingerprint()).collect();
                (0..rows.len()).find(|i| !taken.contains(&rows[*i].fingerprint()))
            });

            match next {
                Some(index) => {
                    chosen.push(index);
                    centroids.push(rows[index].to_dense(dimensions));
                }
                None => break,
            }
        }

        centroids
    }
}

fn squared_norms(centroids: &[Vec<f64>]) -> Vec<f64> {
    centroids
        .iter()
        .map(|c| c.iter().map(|v| v * v).sum())
        .collect()
}

fn squared_euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Closest centroid and squared distance; ties go to the lowest code
fn nearest(row: &SparseVector, centroids: &[Vec<f64>], norms: &[f64]) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (code, (centroid, norm)) in centroids.iter().zip(norms).enumerate() {
        let distance = row.squared_distance(centroid, *norm);
        if distance < best.1 {
            best = (code, distance);
        }
    }
    best
}

fn assign(rows: &[SparseVector], centroids: &[Vec<f64>], norms: &[f64]) -> (Vec<usize>, f64) {
    let mut inertia = 0.0;
    let assignments = rows
        .iter()
        .map(|row| {
            let (code, distance) = nearest(row, centroids, norms);
            inertia += distance;
            code
        })
        .collect();
    (assignments, inertia)
}

/// Cluster means; an empty cluster takes the row farthest from its own centroid
fn recompute_centroids(
    rows: &[SparseVector],
    assignments: &[usize],
    previous: &[Vec<f64>],
    dimensions: usize,
) -> Vec<Vec<f64>> {
    let k = previous.len();
    let mut sums = vec![vec![0.0; dimensions]; k];
    let mut counts = vec![0usize; k];
    for (row, code) in rows.iter().zip(assignments) {
        row.add_to(&mut sums[*code]);
        counts[*code] += 1;
    }

    let empty: Vec<usize> = (0..k).filter(|code| counts[*code] == 0).collect();
    if !empty.is_empty() {
        let norms = squared_norms(previous);
        let mut by_distance: Vec<(usize, f64)> = rows
            .iter()
            .zip(assignments)
            .enumerate()
            .map(|(i, (row, code))| (i, row.squared_distance(&previous[*code], norms[*code])))
            .collect();
        // Farthest first, lowest row index on ties
        by_distance.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

        // Never take the only row of a cluster
        let mut candidates = by_distance.into_iter().map(|(i, _)| i);
        for code in empty {
            let Some(row_index) = candidates.find(|i| counts[assignments[*i]] > 1) else {
                sums[code] = previous[code].clone();
                counts[code] = 1;
                continue;
            };
            let donor = assignments[row_index];
            for (i, v) in rows[row_index].entries() {
                sums[donor][*i] -= v;
            }
            counts[donor] -= 1;
            sums[code] = rows[row_index].to_dense(dimensions);
            counts[code] = 1;
        }
    }

    sums.into_iter()
        .zip(counts)
        .map(|(mut sum, count)| {
            if count > 1 {
                for v in sum.iter_mut() {
                    *v /= count as f64;
                }
            }
            sum
        })
        .collect()
}
