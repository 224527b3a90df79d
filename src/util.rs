/// Linear RGB color with f32 channels.
pub type Color = rgb::RGB<f32>;

pub const COLOR_WHITE: Color = Color {
    r: 1.0,
    g: 1.0,
    b: 1.0,
};

/// Integer finalizer-style hash, used to decorrelate the shadow jitter
/// from the raw quantized distance and the per-pixel seed.
pub fn hash_mix(mut x: u32) -> u32 {
    x ^= x >> 16;
    x = x.wrapping_mul(0x7feb_352d);
    x ^= x >> 15;
    x = x.wrapping_mul(0x846c_a68b);
    x ^= x >> 16;
    x
}

#[cfg(test)]
mod test {
    use super::*;
    use assert2::assert;

    #[test]
    fn hash_mix_is_deterministic() {
        assert!(hash_mix(12345) == hash_mix(12345));
    }

    #[test]
    fn hash_mix_separates_neighbors() {
        // Neighboring inputs are exactly what the jitter feeds it:
        // quantized distances differing by one. They must not collide.
        let hashes: Vec<u32> = (0..64).map(hash_mix).collect();
        for (i, a) in hashes.iter().enumerate() {
            for b in &hashes[i + 1..] {
                assert!(a != b);
            }
        }
    }

    #[test]
    fn hash_mix_zero_is_not_fixed_point() {
        assert!(hash_mix(0) != 0);
    }
}
