//! Gaussian weight map generation and cropped filter-sum, used by the
//! separator (C5) to weight pixel contributions within a region and to
//! renormalize interim albedo intensity for boundary pixels.

/// An `R×R` row-major Gaussian weight map. Not normalized to sum to 1 — the
/// separator compensates via [`filter_sum`] on matching crops (see
/// spec.md §9 open question: verified against reference behavior, not a bug
/// to fix).
pub fn gaussian_filter(side: usize, sigma: f32) -> Vec<f32> {
    let mid = (side as f32 - 1.0) * 0.5;
    let sigma_sqr = sigma * sigma;
    let spread = 1.0 / (sigma_sqr * 2.0);
    let denom = 1.0 / (8.0 * (1.0f32).atan() * sigma_sqr);

    let sample = |x: usize| -> f32 {
        let d = x as f32 - mid;
        (-d * d * spread).exp()
    };

    let gauss_1d: Vec<f32> = (0..side).map(sample).collect();

    let mut filter = vec![0.0f32; side * side];
    for y in 0..side {
        for x in 0..side {
            filter[y * side + x] = gauss_1d[x] * gauss_1d[y] * denom;
        }
    }
    filter
}

/// Sums the `crop.0 × crop.1` top-left corner of an `side×side` filter.
pub fn filter_sum(filter: &[f32], side: usize, crop: (usize, usize)) -> f32 {
    let (cw, ch) = crop;
    let mut sum = 0.0f32;
    for y in 0..ch {
        for x in 0..cw {
            sum += filter[y * side + x];
        }
    }
    sum
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symmetric_about_center() {
        let side = 7;
        let f = gaussian_filter(side, 1.0);
        for y in 0..side {
            for x in 0..side {
                let a = f[y * side + x];
                let b = f[(side - 1 - y) * side + (side - 1 - x)];
                assert!((a - b).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn full_crop_equals_total_sum() {
        let side = 10;
        let f = gaussian_filter(side, 1.0);
        let total: f32 = f.iter().sum();
        let cropped = filter_sum(&f, side, (side, side));
        assert!((total - cropped).abs() < 1e-4);
    }

    #[test]
    fn partial_crop_is_subset_sum() {
        let side = 5;
        let f = gaussian_filter(side, 1.0);
        let mut manual = 0.0;
        for y in 0..3 {
            for x in 0..2 {
                manual += f[y * side + x];
            }
        }
        assert!((manual - filter_sum(&f, side, (2, 3))).abs() < 1e-6);
    }
}
