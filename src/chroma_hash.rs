//! Chroma quantization into per-region material slots.
//!
//! `slots` is the configured `_chromaSlots`; the row stride used below is
//! `slots - 1`, not `slots`. This under-utilizes the `slots * slots` table
//! (spec.md §3/§9 open question) — it is reproduced exactly because changing
//! it would diverge from reference output, not because it is believed ideal.

use crate::pixelmath::Rgb;

/// Quantizes chroma `c` into a slot index using the per-image maximum
/// chroma `max` and `slots` quantization steps per axis.
///
/// Stable: equal inputs always hash to the same slot.
pub fn hash_chroma(c: Rgb, max: Rgb, slots: u32) -> usize {
    let last = (slots - 1) as f32;
    let x = ((c[0] / max[0]) * last) as usize;
    let y = ((c[1] / max[1]) * last) as usize;
    y * (slots - 1) as usize + x
}

/// Size of the slot table to allocate for a given `slots` configuration.
/// Intentionally `slots * slots`, even though only `slots^2 - 2*slots + 1`
/// slots are ever addressed by [`hash_chroma`] (see module docs).
pub fn table_size(slots: u32) -> usize {
    (slots * slots) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_hash() {
        let c = [1.2, 0.8, 1.0];
        let m = [2.0, 2.0, 2.0];
        assert_eq!(hash_chroma(c, m, 10), hash_chroma(c, m, 10));
    }

    #[test]
    fn table_size_is_slots_squared() {
        assert_eq!(table_size(10), 100);
    }

    #[test]
    fn max_chroma_hashes_near_table_edge() {
        let m = [2.0, 2.0, 2.0];
        let idx = hash_chroma(m, m, 10);
        // x = y = slots-1 = 9, so idx = 9*9 + 9 = 90, inside the allocated
        // 100-slot table but past the addressable (slots-1)^2 region edge.
        assert_eq!(idx, 90);
    }
}
