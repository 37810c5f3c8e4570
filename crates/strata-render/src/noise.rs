//! Deterministic integer-hash noise.
//!
//! No RNG state: every value is a pure function of its coordinates and
//! seed, so identical inputs always produce bit-identical terrain.

/// Mix three coordinates into a well-distributed 64-bit hash.
pub const fn hash3(x: u64, y: u64, seed: u64) -> u64 {
    let mut h = x
        .wrapping_mul(0x9E37_79B9_7F4A_7C15)
        .wrapping_add(y.wrapping_mul(0xC2B2_AE3D_27D4_EB4F))
        .wrapping_add(seed.wrapping_mul(0x1656_67B1_9E37_79F9));
    h ^= h >> 30;
    h = h.wrapping_mul(0xBF58_476D_1CE4_E5B9);
    h ^= h >> 27;
    h = h.wrapping_mul(0x94D0_49BB_1331_11EB);
    h ^ (h >> 31)
}

/// Noise in `[0, 1)` at grid position `(x, y)`.
pub fn unit(x: usize, y: usize, seed: u64) -> f64 {
    let h = hash3(x as u64, y as u64, seed);
    (h >> 11) as f64 / (1_u64 << 53) as f64
}
