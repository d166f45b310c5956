//! # K-Means Module
//!
//! Lloyd's algorithm with greedy k-means++ seeding.
//!
//! ## Algorithm
//! - Seeding: first centre uniform, each further centre picked from
//!   `2 + ln(k)` D²-weighted candidates, keeping the one that lowers the
//!   total potential most
//! - Iteration: assign to nearest centre, recompute means
//! - Empty clusters take the point farthest from its current centre
//! - Stops when labels stop changing, when the squared centre shift drops
//!   under `tol × mean feature variance`, or after `max_iter` rounds
//!
//! Every random draw comes from one `ChaCha8Rng` seeded by `seed`, so a fit
//! is reproducible for identical input.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::ClusterError;

#[derive(Debug, Clone, PartialEq)]
pub struct KMeans {
    pub n_clusters: usize,
    pub max_iter: usize,
    pub tol: f64,
    pub n_init: usize,
    pub seed: u64,
}

/// Result of a k-means fit.
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansModel<const D: usize> {
    pub centers: Vec<[f64; D]>,
    /// Cluster of each input row, always `< centers.len()`
    pub labels: Vec<u32>,
    /// Sum of squared distances to the assigned centre
    pub inertia: f64,
    pub n_iter: usize,
}

impl<const D: usize> KMeansModel<D> {
    /// Nearest centre for a new point.
    pub fn predict(&self, point: &[f64; D]) -> u32 {
        nearest(&self.centers, point).0
    }
}

impl KMeans {
    pub fn new(n_clusters: usize) -> Self {
        Self {
            n_clusters,
            max_iter: 300,
            tol: 1e-4,
            n_init: 1,
            seed: 0,
        }
    }

    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    pub fn n_init(mut self, n_init: usize) -> Self {
        self.n_init = n_init;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn fit<const D: usize>(&self, data: &[[f64; D]]) -> Result<KMeansModel<D>, ClusterError> {
        if self.n_clusters == 0 {
            return Err(ClusterError::ZeroClusters);
        }
        if data.is_empty() {
            return Err(ClusterError::EmptyInput);
        }
        if data.len() < self.n_clusters {
            return Err(ClusterError::TooFewSamples {
                samples: data.len(),
                clusters: self.n_clusters,
            });
        }
        if let Some(row) = data.iter().position(|r| r.iter().any(|v| !v.is_finite())) {
            return Err(ClusterError::NonFinite { row });
        }

        let tol = self.tol * mean_variance(data);
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);

        let mut best: Option<KMeansModel<D>> = None;
        for run in 0..self.n_init.max(1) {
            let seeds = kmeans_plus_plus(data, self.n_clusters, &mut rng);
            let model = self.lloyd(data, seeds, tol);
            tracing::debug!(run, inertia = model.inertia, n_iter = model.n_iter, "k-means run");

            if best.as_ref().map_or(true, |b| model.inertia < b.inertia) {
                best = Some(model);
            }
        }

        // n_init.max(1) guarantees at least one run
        best.ok_or(ClusterError::EmptyInput)
    }

    fn lloyd<const D: usize>(
        &self,
        data: &[[f64; D]],
        mut centers: Vec<[f64; D]>,
        tol: f64,
    ) -> KMeansModel<D> {
        let k = centers.len();
        let mut labels = vec![u32::MAX; data.len()];
        let mut n_iter = 0;

        for _ in 0..self.max_iter {
            n_iter += 1;

            let mut changed = false;
            for (label, point) in labels.iter_mut().zip(data) {
                let (nearest_label, _) = nearest(&centers, point);
                if *label != nearest_label {
                    *label = nearest_label;
                    changed = true;
                }
            }
            if !changed {
                break;
            }

            let mut sums = vec![[0.0; D]; k];
            let mut counts = vec![0usize; k];
            for (&label, point) in labels.iter().zip(data) {
                let sum = &mut sums[label as usize];
                for f in 0..D {
                    sum[f] += point[f];
                }
                counts[label as usize] += 1;
            }

            let mut new_centers: Vec<[f64; D]> = sums
                .iter()
                .zip(&counts)
                .zip(&centers)
                .map(|((sum, &count), old)| {
                    if count == 0 {
                        *old
                    } else {
                        std::array::from_fn(|f| sum[f] / count as f64)
                    }
                })
                .collect();
            relocate_empty_clusters(data, &labels, &counts, &centers, &mut new_centers);

            let shift: f64 = centers
                .iter()
                .zip(&new_centers)
                .map(|(a, b)| squared_distance(a, b))
                .sum();
            centers = new_centers;

            if shift <= tol {
                break;
            }
        }

        // Labels must agree with the final centres
        let mut inertia = 0.0;
        for (label, point) in labels.iter_mut().zip(data) {
            let (nearest_label, dist) = nearest(&centers, point);
            *label = nearest_label;
            inertia += dist;
        }

        KMeansModel {
            centers,
            labels,
            inertia,
            n_iter,
        }
    }
}

/// Give each empty cluster the point farthest from its assigned centre.
fn relocate_empty_clusters<const D: usize>(
    data: &[[f64; D]],
    labels: &[u32],
    counts: &[usize],
    old_centers: &[[f64; D]],
    new_centers: &mut [[f64; D]],
) {
    let empty: Vec<usize> = (0..counts.len()).filter(|&c| counts[c] == 0).collect();
    if empty.is_empty() {
        return;
    }

    let mut by_distance: Vec<(usize, f64)> = data
        .iter()
        .zip(labels)
        .enumerate()
        .map(|(idx, (point, &label))| (idx, squared_distance(point, &old_centers[label as usize])))
        .collect();
    // Stable sort keeps the lower index first on ties
    by_distance.sort_by(|a, b| b.1.total_cmp(&a.1));

    for (cluster, (idx, _)) in empty.into_iter().zip(by_distance) {
        new_centers[cluster] = data[idx];
    }
}

fn kmeans_plus_plus<const D: usize>(
    data: &[[f64; D]],
    k: usize,
    rng: &mut ChaCha8Rng,
) -> Vec<[f64; D]> {
    let n = data.len();
    let n_local_trials = 2 + (k as f64).ln().floor() as usize;

    let mut centers = Vec::with_capacity(k);
    centers.push(data[rng.gen_range(0..n)]);

    let mut closest: Vec<f64> = data
        .iter()
        .map(|p| squared_distance(p, &centers[0]))
        .collect();
    let mut potential: f64 = closest.iter().sum();

    while centers.len() < k {
        if potential <= 0.0 {
            // Every point already sits on a centre
            centers.push(data[rng.gen_range(0..n)]);
            continue;
        }

        let mut cumulative = Vec::with_capacity(n);
        let mut running = 0.0;
        for d in &closest {
            running += d;
            cumulative.push(running);
        }

        let mut best: Option<(usize, f64, Vec<f64>)> = None;
        for _ in 0..n_local_trials {
            let target = rng.gen::<f64>() * potential;
            let candidate = cumulative.partition_point(|&c| c < target).min(n - 1);

            let trial: Vec<f64> = data
                .iter()
                .zip(&closest)
                .map(|(p, &d)| d.min(squared_distance(p, &data[candidate])))
                .collect();
            let trial_potential: f64 = trial.iter().sum();

            if best.as_ref().map_or(true, |b| trial_potential < b.1) {
                best = Some((candidate, trial_potential, trial));
            }
        }

        if let Some((candidate, trial_potential, trial)) = best {
            centers.push(data[candidate]);
            closest = trial;
            potential = trial_potential;
        }
    }

    centers
}

fn nearest<const D: usize>(centers: &[[f64; D]], point: &[f64; D]) -> (u32, f64) {
    let mut best = (0u32, f64::INFINITY);
    for (idx, center) in centers.iter().enumerate() {
        let dist = squared_distance(point, center);
        if dist < best.1 {
            best = (idx as u32, dist);
        }
    }
    best
}

fn squared_distance<const D: usize>(a: &[f64; D], b: &[f64; D]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn mean_variance<const D: usize>(data: &[[f64; D]]) -> f64 {
    if D == 0 {
        return 0.0;
    }
    let n = data.len() as f64;
    let mut total = 0.0;
    for f in 0..D {
        let mean = data.iter().map(|r| r[f]).sum::<f64>() / n;
        total += data.iter().map(|r| (r[f] - mean).powi(2)).sum::<f64>() / n;
    }
    total / D as f64
}
