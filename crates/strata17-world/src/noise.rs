/// Deterministic 2D gradient noise seeded from the world seed. Used for biome scalars
/// and the stone-layer height field. Not cryptographic; only needs to be stable and
/// reproducible across implementations given the same seed.
pub struct GradientNoise {
    perm: [u8; 512],
}

const GRADIENTS: [(f64, f64); 8] = [
    (1.0, 0.0),
    (-1.0, 0.0),
    (0.0, 1.0),
    (0.0, -1.0),
    (0.707, 0.707),
    (-0.707, 0.707),
    (0.707, -0.707),
    (-0.707, -0.707),
];

impl GradientNoise {
    pub fn new(seed: i64) -> Self {
        let mut table: [u8; 256] = [0; 256];
        for (i, slot) in table.iter_mut().enumerate() {
            *slot = i as u8;
        }
        // Fisher-Yates, driven by the same xorshift family as the chunk PRNG so the
        // whole generator depends on one seeding strategy.
        let mut rng = crate::prng::ChunkRng::for_chunk(seed, 0, 0);
        for i in (1..table.len()).rev() {
            let j = rng.next_bounded((i + 1) as u32) as usize;
            table.swap(i, j);
        }
        let mut perm = [0u8; 512];
        for i in 0..512 {
            perm[i] = table[i % 256];
        }
        Self { perm }
    }

    fn gradient(&self, ix: i32, iy: i32) -> (f64, f64) {
        let idx = (self.perm[(ix as u32 as usize) & 255] as usize
            ^ self.perm[(iy as u32 as usize) & 255] as usize)
            & 7;
        GRADIENTS[idx]
    }

    fn fade(t: f64) -> f64 {
        t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
    }

    fn lerp(a: f64, b: f64, t: f64) -> f64 {
        a + t * (b - a)
    }

    /// Single-octave noise in roughly `[-1, 1]`.
    pub fn noise2d(&self, x: f64, y: f64) -> f64 {
        let x0 = x.floor() as i32;
        let y0 = y.floor() as i32;
        let x1 = x0 + 1;
        let y1 = y0 + 1;
        let sx = Self::fade(x - x0 as f64);
        let sy = Self::fade(y - y0 as f64);

        let dot = |ix: i32, iy: i32| {
            let (gx, gy) = self.gradient(ix, iy);
            gx * (x - ix as f64) + gy * (y - iy as f64)
        };

        let n00 = dot(x0, y0);
        let n10 = dot(x1, y0);
        let n01 = dot(x0, y1);
        let n11 = dot(x1, y1);

        let ix0 = Self::lerp(n00, n10, sx);
        let ix1 = Self::lerp(n01, n11, sx);
        Self::lerp(ix0, ix1, sy)
    }

    /// Fractal Brownian motion: `octaves` layers of [`Self::noise2d`], each at double
    /// the frequency and half the amplitude of the last.
    pub fn fbm2d(&self, x: f64, y: f64, octaves: u32, persistence: f64) -> f64 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut max_amplitude = 0.0;
        for _ in 0..octaves {
            total += self.noise2d(x * frequency, y * frequency) * amplitude;
            max_amplitude += amplitude;
            amplitude *= persistence;
            frequency *= 2.0;
        }
        total / max_amplitude
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_for_same_seed() {
        let a = GradientNoise::new(7);
        let b = GradientNoise::new(7);
        assert_eq!(a.noise2d(1.23, 4.56), b.noise2d(1.23, 4.56));
    }

    #[test]
    fn differs_across_seeds() {
        let a = GradientNoise::new(7);
        let b = GradientNoise::new(8);
        assert_ne!(a.noise2d(1.23, 4.56), b.noise2d(1.23, 4.56));
    }

    #[test]
    fn fbm_is_bounded() {
        let n = GradientNoise::new(3);
        for i in 0..50 {
            let v = n.fbm2d(i as f64 * 0.3, i as f64 * 0.7, 4, 0.5);
            assert!(v.abs() <= 1.5);
        }
    }
}
