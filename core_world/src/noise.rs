use crate::config::NoiseConfig;
use crate::rng::Mulberry32;

const F2: f64 = 0.366_025_403_784_438_6; // (sqrt(3) - 1) / 2
const G2: f64 = 0.211_324_865_405_187_1; // (3 - sqrt(3)) / 6

const GRAD2: [(f64, f64); 8] = [
    (1.0, 1.0),
    (-1.0, 1.0),
    (1.0, -1.0),
    (-1.0, -1.0),
    (1.0, 0.0),
    (-1.0, 0.0),
    (0.0, 1.0),
    (0.0, -1.0),
];

/// Deterministic 2D simplex noise. The permutation table is shuffled by the
/// world's mulberry32 stream, so equal seeds give bit-identical fields.
#[derive(Debug, Clone)]
pub struct SimplexNoise {
    permutation: [u8; 512],
}

impl SimplexNoise {
    pub fn new(seed: u32) -> Self {
        let mut perm = [0u8; 256];
        for (i, p) in perm.iter_mut().enumerate() {
            *p = i as u8;
        }

        // Fisher-Yates shuffle driven by the seeded stream.
        let mut rng = Mulberry32::new(seed);
        for i in (1..256usize).rev() {
            let j = (rng.next_f64() * (i + 1) as f64) as usize;
            perm.swap(i, j.min(i));
        }

        let mut permutation = [0u8; 512];
        for (i, p) in permutation.iter_mut().enumerate() {
            *p = perm[i % 256];
        }
        Self { permutation }
    }

    fn gradient(&self, ix: i64, iy: i64) -> (f64, f64) {
        let x = (ix & 255) as usize;
        let y = (iy & 255) as usize;
        let h = self.permutation[x + self.permutation[y] as usize] & 7;
        GRAD2[h as usize]
    }

    /// Raw simplex sample in roughly [-1, 1].
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        // Skew into simplex cell space.
        let s = (x + y) * F2;
        let i = (x + s).floor();
        let j = (y + s).floor();
        let t = (i + j) * G2;
        let x0 = x - (i - t);
        let y0 = y - (j - t);

        // Offsets for the middle corner depend on which triangle we are in.
        let (i1, j1) = if x0 > y0 { (1.0, 0.0) } else { (0.0, 1.0) };
        let x1 = x0 - i1 + G2;
        let y1 = y0 - j1 + G2;
        let x2 = x0 - 1.0 + 2.0 * G2;
        let y2 = y0 - 1.0 + 2.0 * G2;

        let gi0 = self.gradient(i as i64, j as i64);
        let gi1 = self.gradient(i as i64 + i1 as i64, j as i64 + j1 as i64);
        let gi2 = self.gradient(i as i64 + 1, j as i64 + 1);

        let mut total = 0.0;
        for ((dx, dy), (gx, gy)) in [(x0, y0), (x1, y1), (x2, y2)]
            .into_iter()
            .zip([gi0, gi1, gi2])
        {
            let falloff = 0.5 - dx * dx - dy * dy;
            if falloff > 0.0 {
                let falloff = falloff * falloff;
                total += falloff * falloff * (gx * dx + gy * dy);
            }
        }
        70.0 * total
    }
}

/// The pipeline's primary generator: a simplex octave stack behind a
/// low-frequency domain warp.
#[derive(Debug, Clone)]
pub struct NoiseField {
    simplex: SimplexNoise,
    octaves: u32,
    persistence: f64,
    lacunarity: f64,
    warp_strength: f64,
}

impl NoiseField {
    pub fn new(seed: u32, config: &NoiseConfig) -> Self {
        Self {
            simplex: SimplexNoise::new(seed),
            octaves: config.octaves.max(1),
            persistence: config.persistence,
            lacunarity: config.lacunarity,
            warp_strength: config.warp_strength,
        }
    }

    /// Multi-octave sample at a normalised point, remapped into [0, 1].
    pub fn sample(&self, nx: f64, ny: f64) -> f64 {
        let mut frequency = 1.0;
        let mut amplitude = 1.0;
        let mut sum = 0.0;
        let mut normaliser = 0.0;
        for _ in 0..self.octaves {
            sum += self
                .simplex
                .sample(nx * frequency * 8.0, ny * frequency * 8.0)
                * amplitude;
            normaliser += amplitude;
            frequency *= self.lacunarity;
            amplitude *= self.persistence;
        }
        let value = sum / normaliser;
        ((value + 1.0) / 2.0).clamp(0.0, 1.0)
    }

    /// Octave sample with the evaluation point displaced by a warp vector
    /// read from the same simplex field at a quarter of the frequency.
    pub fn sample_warped(&self, nx: f64, ny: f64) -> f64 {
        let wx = self.simplex.sample(nx * 4.0, ny * 4.0) * self.warp_strength;
        let wy = self
            .simplex
            .sample(nx * 4.0 + 100.0, ny * 4.0 + 100.0)
            * self.warp_strength;
        self.sample(nx + wx, ny + wy)
    }
}
