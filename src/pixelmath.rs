//! Per-pixel reflectance math: clamp, intensity, chroma.
//!
//! Every operation here is an embarrassingly parallel map — no pixel reads
//! another pixel's value — so each is split across rows with rayon the same
//! way the teacher's `ops/adjustments.rs` parallelizes per-pixel color ops.

use rayon::prelude::*;

/// An RGB triple in `[0, 1]`, row-major with the rest of the crate's image buffers.
pub type Rgb = [f32; 3];

const SHADOW_CAP: f32 = 1.0 / 255.0;
const HIGHLIGHT_CAP: f32 = 254.0 / 255.0;

/// Clamps each channel of every pixel to `[1/255, 254/255]`, removing
/// saturated highlights/shadows without hard quantization.
pub fn clamp(image: &mut [Rgb]) {
    image.par_iter_mut().for_each(|p| {
        for c in p.iter_mut() {
            *c = c.clamp(SHADOW_CAP, HIGHLIGHT_CAP);
        }
    });
}

/// Scalar overload of [`clamp`], for single-channel fields (shading maps,
/// albedo-set inputs read back in) that still need the same highlight/shadow
/// clamp before being fed into a pipeline stage.
pub fn clamp_scalar(field: &mut [f32]) {
    field.par_iter_mut().for_each(|v| {
        *v = v.clamp(SHADOW_CAP, HIGHLIGHT_CAP);
    });
}

/// `(r + g + b) / 3` per pixel.
pub fn intensity(image: &[Rgb]) -> Vec<f32> {
    image
        .par_iter()
        .map(|p| (p[0] + p[1] + p[2]) * (1.0 / 3.0))
        .collect()
}

/// `(r/i, g/i, 3 - r/i - g/i)` per pixel. Precondition: every `intensity[p] > 0`
/// (guaranteed by [`clamp`], which floors channels — and therefore the average
/// — at `1/255`).
pub fn chroma(image: &[Rgb], intensity: &[f32]) -> Vec<Rgb> {
    debug_assert_eq!(image.len(), intensity.len());
    image
        .par_iter()
        .zip(intensity.par_iter())
        .map(|(p, &i)| {
            debug_assert!(i > 0.0, "chroma precondition violated: intensity <= 0");
            let x = p[0] / i;
            let y = p[1] / i;
            [x, y, 3.0 - x - y]
        })
        .collect()
}

/// Componentwise maximum chroma across the whole image, used to normalize
/// [`crate::chroma_hash::hash_chroma`] inputs.
pub fn componentwise_max(chroma: &[Rgb]) -> Rgb {
    chroma.par_iter().cloned().reduce(
        || [f32::MIN, f32::MIN, f32::MIN],
        |a, b| [a[0].max(b[0]), a[1].max(b[1]), a[2].max(b[2])],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_bounds_are_exact() {
        let mut img = vec![[0.0, 1.0, 0.5], [2.0, -3.0, 0.6]];
        clamp(&mut img);
        for p in &img {
            for &c in p {
                assert!(c >= SHADOW_CAP - 1e-6 && c <= HIGHLIGHT_CAP + 1e-6);
            }
        }
    }

    #[test]
    fn clamp_scalar_bounds_are_exact() {
        let mut field = vec![0.0, 1.0, 0.5, 2.0, -3.0];
        clamp_scalar(&mut field);
        for &v in &field {
            assert!(v >= SHADOW_CAP - 1e-6 && v <= HIGHLIGHT_CAP + 1e-6);
        }
    }

    #[test]
    fn clamp_is_idempotent() {
        let mut img = vec![[0.0, 1.0, 0.5], [2.0, -3.0, 0.6], [0.3, 0.3, 0.3]];
        clamp(&mut img);
        let once = img.clone();
        clamp(&mut img);
        assert_eq!(once, img);
    }

    #[test]
    fn chroma_sums_to_three() {
        let img = vec![[0.6, 0.4, 0.2], [0.1, 0.1, 0.8]];
        let i = intensity(&img);
        let c = chroma(&img, &i);
        for p in &c {
            assert!((p[0] + p[1] + p[2] - 3.0).abs() < 1e-5);
        }
    }

    #[test]
    fn intensity_is_average() {
        let img = vec![[0.3, 0.6, 0.9]];
        let i = intensity(&img);
        assert!((i[0] - 0.6).abs() < 1e-6);
    }
}
