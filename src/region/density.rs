//! Density-based clustering of gaze points.
//!
//! Points within `eps` of each other are neighbours; a point with at least
//! `min_samples` neighbours (itself included) is a core point. Clusters grow
//! from core points through their neighbourhoods; points reached by no
//! cluster are noise. The estimator reports the bounding box of the largest
//! cluster.

use log::debug;

use crate::{
    constants::{DEFAULT_CLUSTER_EPS, DEFAULT_CLUSTER_MIN_SAMPLES},
    geometry::{Point, ScreenRoi},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Label {
    Unvisited,
    Noise,
    Cluster(usize),
}

/// Largest-cluster region estimator
#[derive(Debug, Clone)]
pub struct DensityClusterEstimator {
    eps: f64,
    min_samples: usize,
}

impl DensityClusterEstimator {
    /// Create an estimator with the given neighbourhood radius and density
    #[must_use]
    pub const fn new(eps: f64, min_samples: usize) -> Self {
        Self { eps, min_samples }
    }

    /// Neighbourhood radius
    #[must_use]
    pub const fn eps(&self) -> f64 {
        self.eps
    }

    /// Minimum neighbourhood size of a core point
    #[must_use]
    pub const fn min_samples(&self) -> usize {
        self.min_samples
    }

    /// Bounding box of the largest cluster, `None` when there are too few
    /// points, no cluster forms, or the input is malformed.
    ///
    /// Among equally large clusters the one discovered first wins; clusters
    /// are discovered scanning the input in order, so the result only
    /// depends on the order of `points`.
    #[must_use]
    pub fn estimate(&self, points: &[Point]) -> Option<ScreenRoi> {
        if points.len() < self.min_samples || self.min_samples == 0 {
            return None;
        }
        if !self.eps.is_finite() || self.eps < 0.0 || points.iter().any(|p| !p.is_finite()) {
            debug!("Skipping clustering of malformed input");
            return None;
        }

        let labels = self.cluster_labels(points);
        let largest = Self::largest_cluster(&labels)?;

        let members: Vec<Point> = points
            .iter()
            .zip(&labels)
            .filter(|(_, label)| **label == Label::Cluster(largest))
            .map(|(p, _)| *p)
            .collect();

        ScreenRoi::bounding(&members)
    }

    /// Assign every point to a cluster id or to noise
    fn cluster_labels(&self, points: &[Point]) -> Vec<Label> {
        let mut labels = vec![Label::Unvisited; points.len()];
        let mut next_cluster = 0;

        for i in 0..points.len() {
            if labels[i] != Label::Unvisited {
                continue;
            }

            let neighbours = self.region_query(points, i);
            if neighbours.len() < self.min_samples {
                labels[i] = Label::Noise;
                continue;
            }

            let cluster = next_cluster;
            next_cluster += 1;
            labels[i] = Label::Cluster(cluster);

            let mut frontier = neighbours;
            let mut cursor = 0;
            while cursor < frontier.len() {
                let j = frontier[cursor];
                cursor += 1;

                match labels[j] {
                    // Border point previously marked as noise
                    Label::Noise => labels[j] = Label::Cluster(cluster),
                    Label::Unvisited => {
                        labels[j] = Label::Cluster(cluster);
                        let expansion = self.region_query(points, j);
                        if expansion.len() >= self.min_samples {
                            frontier.extend(expansion);
                        }
                    }
                    Label::Cluster(_) => {}
                }
            }
        }

        labels
    }

    /// Indices of all points within `eps` of `points[index]`, itself included
    fn region_query(&self, points: &[Point], index: usize) -> Vec<usize> {
        let center = points[index];
        points
            .iter()
            .enumerate()
            .filter(|(_, p)| p.distance(&center) <= self.eps)
            .map(|(j, _)| j)
            .collect()
    }

    /// Id of the cluster with the most members; lowest id on ties
    fn largest_cluster(labels: &[Label]) -> Option<usize> {
        let mut sizes: Vec<usize> = Vec::new();
        for label in labels {
            if let Label::Cluster(id) = *label {
                if sizes.len() <= id {
                    sizes.resize(id + 1, 0);
                }
                sizes[id] += 1;
            }
        }

        let mut best: Option<(usize, usize)> = None;
        for (id, &size) in sizes.iter().enumerate() {
            if best.map_or(true, |(_, best_size)| size > best_size) {
                best = Some((id, size));
            }
        }
        best.map(|(id, _)| id)
    }
}

impl Default for DensityClusterEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_CLUSTER_EPS, DEFAULT_CLUSTER_MIN_SAMPLES)
    }
}
