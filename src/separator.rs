//! The expectation-maximization albedo/shading separator (C5) — the core
//! of this crate, wiring together C1 (pixel math), C2 (filter), C3 (region
//! grid) and C4 (chroma hash).
//!
//! Grounded on `src/separation.cpp`'s `separate`: an outer "direct
//! iterations" loop re-injects the current albedo estimate as the new
//! observation and accumulates the residual into shading, while each inner
//! "intensity iterations" pass re-estimates per-region, per-chroma-slot
//! intensity and smears it back across pixels with the Gaussian filter.

use rayon::prelude::*;

use crate::chroma_hash::{hash_chroma, table_size};
use crate::error::SeparatorError;
use crate::filter::{filter_sum, gaussian_filter};
use crate::pixelmath::{chroma, componentwise_max, intensity, Rgb};
use crate::region::RegionGrid;

/// Tunables for one separator run, one field per spec-level parameter —
/// no config file, these only ever come from CLI flags (spec.md §6).
#[derive(Clone, Copy, Debug)]
pub struct SeparatorParams {
    pub region: u32,
    pub direct_iterations: u32,
    pub intensity_iterations: u32,
    pub chroma_slots: u32,
}

impl Default for SeparatorParams {
    fn default() -> Self {
        Self {
            region: 10,
            direct_iterations: 5,
            intensity_iterations: 5,
            chroma_slots: 10,
        }
    }
}

/// Result of a full separation: albedo in RGB and shading as a scalar
/// intensity field, both row-major at the source image's resolution.
pub struct Separation {
    pub albedo: Vec<Rgb>,
    pub shading: Vec<f32>,
}

/// Per-thread partial accumulator for one inner intensity-iteration pass,
/// combined via rayon's `fold`/`reduce` (spec.md §5's sanctioned strategy
/// for parallelizing the region loop without a lock per pixel).
struct Partial {
    interim_a: Vec<f32>,
}

impl Partial {
    fn new(num_pixels: usize) -> Self {
        Self {
            interim_a: vec![0.0; num_pixels],
        }
    }

    fn merge(mut self, other: Self) -> Self {
        for (a, b) in self.interim_a.iter_mut().zip(other.interim_a.iter()) {
            *a += b;
        }
        self
    }
}

/// Runs the full EM separator over a clamped source RGB image, returning
/// albedo and shading intensity fields the same resolution as the input.
///
/// # Errors
/// Returns [`SeparatorError::ImageSmallerThanRegion`] if the image is
/// narrower or shorter than `params.region`.
pub fn separate(
    source: &[Rgb],
    width: u32,
    height: u32,
    params: SeparatorParams,
    mut progress: impl FnMut(u32),
) -> Result<Separation, SeparatorError> {
    let num_pixels = (width * height) as usize;
    debug_assert_eq!(source.len(), num_pixels);

    let grid = RegionGrid::new(width, height, params.region).ok_or(
        SeparatorError::ImageSmallerThanRegion {
            width,
            height,
            region: params.region,
        },
    )?;

    let i0 = intensity(source);
    let c = chroma(source, &i0);
    let max_chroma = componentwise_max(&c);
    let side = params.region as usize;
    let filter = gaussian_filter(side, 1.0);
    let slots = table_size(params.chroma_slots);

    // Precompute each pixel's chroma slot once; it never changes across iterations.
    let pixel_slot: Vec<usize> = c
        .par_iter()
        .map(|&chroma_p| hash_chroma(chroma_p, max_chroma, params.chroma_slots))
        .collect();

    // Precompute each pixel's contribution weight (denominator `w` in §4.5
    // step 4.b), also invariant across iterations.
    let contribution_weight: Vec<f32> = (0..height)
        .into_par_iter()
        .flat_map_iter(|py| {
            (0..width).map(move |px| {
                let crop = grid.contribution_crop(px, py);
                filter_sum(&filter, side, crop)
            })
        })
        .collect();

    let mut a = i0.clone();
    let mut shading_out = vec![1.0f32; num_pixels];

    for d in 0..params.direct_iterations {
        let observed = a.clone();

        for _t in 0..params.intensity_iterations {
            let partial = grid
                .regions
                .par_iter()
                .fold(
                    || Partial::new(num_pixels),
                    |mut acc, region| {
                        let mut est = vec![0.0f32; slots];
                        let mut cnt = vec![0u32; slots];
                        let mut shading_sum = 0.0f32;

                        region.for_each_pixel(grid.side, width, |p, _local| {
                            let k = pixel_slot[p];
                            est[k] += observed[p];
                            cnt[k] += 1;
                            shading_sum += observed[p] / a[p];
                        });

                        let shading_avg = shading_sum / (grid.side * grid.side) as f32;
                        for k in 0..slots {
                            if cnt[k] > 0 {
                                est[k] /= cnt[k] as f32 * shading_avg;
                            }
                        }

                        region.for_each_pixel(grid.side, width, |p, local| {
                            let k = pixel_slot[p];
                            acc.interim_a[p] += est[k] * filter[local];
                        });

                        acc
                    },
                )
                .reduce(|| Partial::new(num_pixels), Partial::merge);

            a.par_iter_mut()
                .zip(partial.interim_a.par_iter())
                .zip(contribution_weight.par_iter())
                .for_each(|((a_p, &interim), &w)| {
                    *a_p = interim / w;
                });
        }

        shading_out
            .par_iter_mut()
            .zip(observed.par_iter())
            .zip(a.par_iter())
            .for_each(|((s, &obs), &a_p)| {
                *s += obs / a_p - 1.0;
            });

        progress(d + 1);
    }

    let albedo: Vec<Rgb> = a
        .par_iter()
        .zip(c.par_iter())
        .map(|(&a_p, &c_p)| [a_p * c_p[0], a_p * c_p[1], a_p * c_p[2]])
        .collect();

    Ok(Separation {
        albedo,
        shading: shading_out,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_image(width: u32, height: u32, color: Rgb) -> Vec<Rgb> {
        vec![color; (width * height) as usize]
    }

    #[test]
    fn too_small_image_is_rejected() {
        let img = flat_image(4, 4, [0.5, 0.5, 0.5]);
        let params = SeparatorParams {
            region: 10,
            ..Default::default()
        };
        let result = separate(&img, 4, 4, params, |_| {});
        assert!(matches!(
            result,
            Err(SeparatorError::ImageSmallerThanRegion { .. })
        ));
    }

    #[test]
    fn uniform_image_reconstructs_near_identity() {
        let (w, h) = (16u32, 16u32);
        let mut img = flat_image(w, h, [0.7, 0.5, 0.3]);
        crate::pixelmath::clamp(&mut img);
        let params = SeparatorParams {
            region: 4,
            direct_iterations: 2,
            intensity_iterations: 2,
            chroma_slots: 6,
        };
        let result = separate(&img, w, h, params, |_| {}).unwrap();
        for p in 0..(w * h) as usize {
            for ch in 0..3 {
                assert!(
                    (result.albedo[p][ch] - img[p][ch]).abs() < 0.1,
                    "channel {ch} at pixel {p} diverged"
                );
            }
            assert!(result.shading[p] > 0.0 && result.shading[p].is_finite());
        }
    }

    #[test]
    fn progress_callback_fires_once_per_direct_iteration() {
        let (w, h) = (8u32, 8u32);
        let mut img = flat_image(w, h, [0.6, 0.6, 0.6]);
        crate::pixelmath::clamp(&mut img);
        let params = SeparatorParams {
            region: 4,
            direct_iterations: 3,
            intensity_iterations: 1,
            chroma_slots: 4,
        };
        let mut calls = Vec::new();
        separate(&img, w, h, params, |d| calls.push(d)).unwrap();
        assert_eq!(calls, vec![1, 2, 3]);
    }
}
