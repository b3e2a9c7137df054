//! k-means++ seeded Lloyd iteration over RGB points.
//!
//! Grounded on `src/cluster.cpp`: a linear congruential engine seeded from
//! nondeterministic entropy selects the k-means++ seeds (no reproducibility
//! contract), then plain Lloyd iteration runs to a fixed point, checking
//! against both the previous and previous-previous mean set to also catch
//! 2-cycles.

use crate::pixelmath::Rgb;

/// Knuth's MMIX linear congruential generator parameters, matching the
/// reference implementation's choice from Wikipedia's "parameters in common
/// use" table.
struct Lcg64 {
    state: u64,
}

impl Lcg64 {
    fn seeded() -> Self {
        // No external entropy source is a dependency of this crate; mix a
        // handful of runtime-varying addresses into the seed instead of a
        // fixed constant, since exact reproducibility is explicitly not a
        // contract (spec.md §4.6).
        let mut seed = 0x9E3779B97F4A7C15u64;
        let probe = Box::new(0u8);
        seed ^= &*probe as *const u8 as u64;
        seed ^= std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state
    }

    /// Samples an index in `[0, weights.len())` from a discrete distribution
    /// proportional to `weights` (must be non-negative, not all zero).
    fn weighted_index(&mut self, weights: &[f32]) -> usize {
        let total: f32 = weights.iter().sum();
        if total <= 0.0 {
            return (self.next_u64() as usize) % weights.len();
        }
        let target = (self.next_u64() as f64 / u64::MAX as f64) as f32 * total;
        let mut acc = 0.0f32;
        for (i, &w) in weights.iter().enumerate() {
            acc += w;
            if acc >= target {
                return i;
            }
        }
        weights.len() - 1
    }
}

fn dist2(a: Rgb, b: Rgb) -> f32 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    dx * dx + dy * dy + dz * dz
}

fn closest_distances(means: &[Rgb], data: &[Rgb]) -> Vec<f32> {
    data.iter()
        .map(|&d| {
            means
                .iter()
                .map(|&m| dist2(d, m))
                .fold(f32::INFINITY, f32::min)
        })
        .collect()
}

fn kmeans_plus_plus_seeds(data: &[Rgb], k: usize, rng: &mut Lcg64) -> Vec<Rgb> {
    let mut means = Vec::with_capacity(k);
    means.push(data[0]);
    for _ in 1..k {
        let distances = closest_distances(&means, data);
        let idx = rng.weighted_index(&distances);
        means.push(data[idx]);
    }
    means
}

fn closest_mean(point: Rgb, means: &[Rgb]) -> usize {
    let mut best = 0;
    let mut best_d = dist2(point, means[0]);
    for (i, &m) in means.iter().enumerate().skip(1) {
        let d = dist2(point, m);
        if d < best_d {
            best_d = d;
            best = i;
        }
    }
    best
}

fn assign_clusters(data: &[Rgb], means: &[Rgb]) -> Vec<u32> {
    data.iter().map(|&p| closest_mean(p, means) as u32).collect()
}

fn recompute_means(data: &[Rgb], assignment: &[u32], old_means: &[Rgb], k: usize) -> Vec<Rgb> {
    let mut sums = vec![[0.0f32; 3]; k];
    let mut counts = vec![0u32; k];
    for (&p, &c) in data.iter().zip(assignment.iter()) {
        let c = c as usize;
        sums[c][0] += p[0];
        sums[c][1] += p[1];
        sums[c][2] += p[2];
        counts[c] += 1;
    }
    (0..k)
        .map(|i| {
            if counts[i] > 0 {
                let n = counts[i] as f32;
                [sums[i][0] / n, sums[i][1] / n, sums[i][2] / n]
            } else {
                old_means[i]
            }
        })
        .collect()
}

/// Result of [`kmeans_lloyd`]: the final cluster means and, for each input
/// point, the index of its assigned mean.
pub struct KMeansResult {
    pub means: Vec<Rgb>,
    pub assignment: Vec<u32>,
}

/// k-means++ seeded Lloyd iteration over RGB points. Terminates when the
/// mean set equals the previous or previous-previous mean set (exact
/// equality — this detects 2-cycles as well as fixed points).
///
/// # Panics
/// Panics if `data` is empty or `k == 0`.
pub fn kmeans_lloyd(data: &[Rgb], k: usize) -> KMeansResult {
    assert!(!data.is_empty(), "kmeans_lloyd: empty data");
    assert!(k > 0, "kmeans_lloyd: k must be > 0");

    let mut rng = Lcg64::seeded();
    let mut means = kmeans_plus_plus_seeds(data, k, &mut rng);
    let mut old_means: Vec<Rgb> = Vec::new();
    let mut old_old_means: Vec<Rgb> = Vec::new();
    let mut assignment = Vec::new();

    while means != old_means && means != old_old_means {
        assignment = assign_clusters(data, &means);
        old_old_means = old_means;
        old_means = means.clone();
        means = recompute_means(data, &assignment, &old_means, k);
    }

    KMeansResult { means, assignment }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_blob_data() -> Vec<Rgb> {
        let mut data = Vec::new();
        for i in 0..20 {
            let j = (i % 4) as f32 * 0.001;
            data.push([0.1 + j, 0.1 + j, 0.1 + j]);
        }
        for i in 0..20 {
            let j = (i % 4) as f32 * 0.001;
            data.push([0.9 + j, 0.9 + j, 0.9 + j]);
        }
        data
    }

    #[test]
    fn recovers_two_well_separated_means() {
        let data = two_blob_data();
        let result = kmeans_lloyd(&data, 2);
        let mut means = result.means.clone();
        means.sort_by(|a, b| a[0].partial_cmp(&b[0]).unwrap());
        assert!((means[0][0] - 0.1).abs() < 0.03);
        assert!((means[1][0] - 0.9).abs() < 0.03);
    }

    #[test]
    fn fixed_point_reclustering_converges_in_one_step() {
        let data = two_blob_data();
        let result = kmeans_lloyd(&data, 2);
        let assignment = assign_clusters(&data, &result.means);
        let recomputed = recompute_means(&data, &assignment, &result.means, 2);
        assert_eq!(recomputed, result.means);
    }

    #[test]
    fn assignment_len_matches_data() {
        let data = two_blob_data();
        let result = kmeans_lloyd(&data, 3);
        assert_eq!(result.assignment.len(), data.len());
    }
}
