//! Material set pipeline: cluster → erode → outlier removal → probability.
//!
//! Grounded on `src/specular.cpp`. Each stage is a pure function returning
//! an owned buffer (spec.md §9 design note) so the pipeline composes as a
//! plain sequence of value-producing transforms, with no shared mutability
//! between stages.

use std::collections::BinaryHeap;

use rayon::prelude::*;

use crate::cluster::kmeans_lloyd;
use crate::morphology::erode;
use crate::pixelmath::Rgb;

fn dist2(a: Rgb, b: Rgb) -> f32 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    dx * dx + dy * dy + dz * dz
}

/// A candidate in the bounded-K nearest-neighbor search, ordered by squared
/// distance so a `BinaryHeap` of these acts as a max-heap on distance —
/// popping the heap evicts the *farthest* candidate, matching the reference
/// `std::push_heap`/`pop_heap` usage in `closestColIndices`.
#[derive(Clone, Copy)]
struct Candidate<T> {
    dist2: f32,
    payload: T,
}

impl<T> PartialEq for Candidate<T> {
    fn eq(&self, other: &Self) -> bool {
        self.dist2 == other.dist2
    }
}
impl<T> Eq for Candidate<T> {}
impl<T> PartialOrd for Candidate<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl<T> Ord for Candidate<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.dist2.total_cmp(&other.dist2)
    }
}

/// Bounded-K nearest neighbor search: scans `items` (each yielding a payload
/// and a color to compare against `query`), keeping only the `k` closest via
/// a size-`k` max-heap rather than collecting every distance.
fn k_nearest<T: Copy>(query: Rgb, items: impl Iterator<Item = (T, Rgb)>, k: usize) -> Vec<T> {
    let mut heap: BinaryHeap<Candidate<T>> = BinaryHeap::with_capacity(k + 1);
    for (payload, color) in items {
        let d = dist2(query, color);
        if heap.len() < k {
            heap.push(Candidate { dist2: d, payload });
        } else if let Some(top) = heap.peek() {
            if d < top.dist2 {
                heap.pop();
                heap.push(Candidate { dist2: d, payload });
            }
        }
    }
    heap.into_iter().map(|c| c.payload).collect()
}

/// Clusters `albedo` into `num_sets` material sets via k-means, then erodes
/// each cluster's 0/1 mask with a 3×3 element scaled to the cluster's share
/// of the image, keeping indices where the eroded mask is positive.
pub fn init_material_sets(albedo: &[Rgb], width: u32, height: u32, num_sets: usize) -> Vec<Vec<usize>> {
    let num_pixels = albedo.len();
    debug_assert_eq!(num_pixels, (width * height) as usize);

    let clustered = kmeans_lloyd(albedo, num_sets);

    let mut inverse: Vec<Vec<usize>> = vec![Vec::new(); num_sets];
    for (px, &c) in clustered.assignment.iter().enumerate() {
        inverse[c as usize].push(px);
    }

    inverse
        .into_iter()
        .map(|members| {
            let mut mask = vec![0.0f32; num_pixels];
            for &px in &members {
                mask[px] = 1.0;
            }
            let iter = (35.0 * members.len() as f32 / num_pixels as f32).round().max(0.0) as u32;
            let eroded = erode(&mask, width, height, (3, 3), iter);
            (0..num_pixels).filter(|&px| eroded[px] > 0.0).collect()
        })
        .collect()
}

/// Majority-KNN outlier filter: a pixel survives in its assigned set only if
/// at least `K/2` of its `K=10` globally-nearest (by color) neighbors across
/// all material sets also belong to that set.
pub fn remove_outliers(material_sets: &[Vec<usize>], albedo: &[Rgb]) -> Vec<Vec<usize>> {
    const K: usize = 10;

    // Flatten once: (set index, pixel index) pairs searched against for every query.
    let pool: Vec<(usize, usize)> = material_sets
        .iter()
        .enumerate()
        .flat_map(|(set_idx, members)| members.iter().map(move |&px| (set_idx, px)))
        .collect();

    material_sets
        .par_iter()
        .enumerate()
        .map(|(set_idx, members)| {
            members
                .iter()
                .copied()
                .filter(|&px| {
                    let query = albedo[px];
                    let closest = k_nearest(
                        query,
                        pool.iter().map(|&(s, p)| ((s, p), albedo[p])),
                        K,
                    );
                    let count = closest.iter().filter(|&&(s, _)| s == set_idx).count();
                    count >= K / 2
                })
                .collect()
        })
        .collect()
}

/// Per-set probability maps over every pixel: for set `i`, finds the 10
/// nearest members of `i` to each pixel's color, sums their distances, and
/// normalizes `score_i = K / distance_i` across sets so probabilities sum to
/// 1 at every pixel.
pub fn compute_probability(material_sets: &[Vec<usize>], albedo: &[Rgb]) -> Vec<Vec<f32>> {
    const K: usize = 10;
    let num_pixels = albedo.len();
    let num_sets = material_sets.len();

    let mut probabilities = vec![vec![0.0f32; num_pixels]; num_sets];

    let rows: Vec<Vec<f32>> = (0..num_pixels)
        .into_par_iter()
        .map(|p| {
            let query = albedo[p];
            let mut scores = vec![0.0f32; num_sets];
            for (i, members) in material_sets.iter().enumerate() {
                let closest = k_nearest(
                    query,
                    members.iter().map(|&px| (px, albedo[px])),
                    K,
                );
                let distance: f32 = closest.iter().map(|&px| dist2(query, albedo[px]).sqrt()).sum();
                scores[i] = if distance > 0.0 {
                    K as f32 / distance
                } else {
                    f32::INFINITY
                };
            }
            let sum: f32 = scores.iter().filter(|v| v.is_finite()).sum();
            let infinite_count = scores.iter().filter(|v| v.is_infinite()).count();
            if infinite_count > 0 {
                // Exact color match against one or more sets: split the mass
                // evenly among them so the per-pixel total still sums to 1.
                let share = 1.0 / infinite_count as f32;
                scores
                    .iter()
                    .map(|&v| if v.is_infinite() { share } else { 0.0 })
                    .collect()
            } else {
                scores.iter().map(|&v| v / sum).collect()
            }
        })
        .collect();

    for (p, row) in rows.into_iter().enumerate() {
        for (i, v) in row.into_iter().enumerate() {
            probabilities[i][p] = v;
        }
    }
    probabilities
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthetic_albedo(width: u32, height: u32) -> Vec<Rgb> {
        let mut out = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                if x < width / 2 {
                    out.push([0.2, 0.2, 0.8]);
                } else {
                    out.push([0.8, 0.2, 0.2]);
                }
            }
        }
        out
    }

    #[test]
    fn probability_sums_to_one_everywhere() {
        let (w, h) = (16, 16);
        let albedo = synthetic_albedo(w, h);
        let sets = init_material_sets(&albedo, w, h, 2);
        let sets = remove_outliers(&sets, &albedo);
        let probs = compute_probability(&sets, &albedo);
        for p in 0..(w * h) as usize {
            let sum: f32 = probs.iter().map(|set| set[p]).sum();
            assert!((sum - 1.0).abs() < 1e-4, "sum={sum}");
        }
    }

    #[test]
    fn k_nearest_returns_at_most_k() {
        let query = [0.0, 0.0, 0.0];
        let items = (0..5).map(|i| (i, [i as f32 * 0.1, 0.0, 0.0]));
        let found = k_nearest(query, items, 3);
        assert_eq!(found.len(), 3);
    }

    #[test]
    fn k_nearest_picks_closest() {
        let query = [0.5, 0.5, 0.5];
        let items = vec![
            (0usize, [0.5, 0.5, 0.5]),
            (1, [0.0, 0.0, 0.0]),
            (2, [1.0, 1.0, 1.0]),
        ];
        let found = k_nearest(query, items.into_iter(), 1);
        assert_eq!(found, vec![0]);
    }
}
