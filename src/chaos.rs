/// Chaotic sequence generators
///
/// Each generator is seeded from derived key parameters, discards a fixed
/// burn-in before emitting values, keeps its state inside the map's domain,
/// and reports a non-finite state as `NumericDivergence`.
use crate::error::{CipherError, Result};
use std::f64::consts::PI;

/// Largest f64 strictly below 1.0.
pub const BELOW_ONE: f64 = 1.0 - f64::EPSILON / 2.0;

pub(crate) fn finite(value: f64, generator: &str) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CipherError::NumericDivergence(format!(
            "{} state became non-finite",
            generator
        )))
    }
}

/// `x mod 1` folded into `[0, 1)`.
pub fn unit_fract(x: f64) -> f64 {
    x.rem_euclid(1.0).clamp(0.0, BELOW_ONE)
}

/// Logistic Map chaos generator
/// x(n+1) = r * x(n) * (1 - x(n))
/// where r ∈ [3.57, 4.0] for chaotic behavior
pub struct LogisticMap {
    state: f64,
    r: f64,
}

impl LogisticMap {
    pub fn new(r: f64, x0: f64, burn_in: usize) -> Result<Self> {
        let mut map = Self { state: x0, r };
        for _ in 0..burn_in {
            map.next()?;
        }
        Ok(map)
    }

    /// Generate next chaotic value in [0.0, 1.0]
    pub fn next(&mut self) -> Result<f64> {
        let x = self.r * self.state * (1.0 - self.state);
        self.state = finite(x, "logistic map")?.clamp(0.0, 1.0);
        Ok(self.state)
    }

    pub fn sequence(&mut self, len: usize) -> Result<Vec<f64>> {
        (0..len).map(|_| self.next()).collect()
    }
}

/// Two-dimensional Logistic-Adjusted-Sine Map.
///
/// x' = sin(π μ (y + 3) x (1 - x))
/// y' = sin(π μ (x' + 3) y (1 - y))
///
/// For μ < 1 the sine argument stays in [0, π μ], so the state never leaves
/// [0, 1]. Emitted samples are clamped below 1.
pub struct Lasm2d {
    mu: f64,
    x: f64,
    y: f64,
}

impl Lasm2d {
    pub fn new(mu: f64, x0: f64, y0: f64, burn_in: usize) -> Result<Self> {
        let mut map = Self { mu, x: x0, y: y0 };
        for _ in 0..burn_in {
            map.step()?;
        }
        Ok(map)
    }

    pub fn step(&mut self) -> Result<(f64, f64)> {
        let xn = (PI * self.mu * (self.y + 3.0) * self.x * (1.0 - self.x)).sin();
        let yn = (PI * self.mu * (xn + 3.0) * self.y * (1.0 - self.y)).sin();
        self.x = finite(xn, "LASM")?.clamp(0.0, 1.0);
        self.y = finite(yn, "LASM")?.clamp(0.0, 1.0);
        Ok((self.x.min(BELOW_ONE), self.y.min(BELOW_ONE)))
    }

    /// Row-major `(Sx, Sy)` of `len` samples each.
    pub fn sequence_pair(&mut self, len: usize) -> Result<(Vec<f64>, Vec<f64>)> {
        let mut sx = Vec::with_capacity(len);
        let mut sy = Vec::with_capacity(len);
        for _ in 0..len {
            let (x, y) = self.step()?;
            sx.push(x);
            sy.push(y);
        }
        Ok((sx, sy))
    }
}

/// Two-dimensional Sine-Cosine-Logistic map producing a byte mask.
///
/// x' = k sin(a cos(b acos(x)) (y + c))
/// y' = k sin(a cos(b acos(y)) (x' + c))
pub struct SineCosineLogistic {
    lambda: f64,
    k: f64,
    a: f64,
    b: f64,
    c: f64,
    x: f64,
    y: f64,
}

impl SineCosineLogistic {
    /// All map coefficients follow from the single control value `lambda`.
    pub fn new(lambda: f64, burn_in: usize) -> Result<Self> {
        let mut map = Self {
            lambda,
            k: 0.9 + lambda * 0.1,
            a: 6.0 + lambda * 8.0,
            b: 6.0 + lambda * 8.0,
            c: 2.0 + lambda * 8.0,
            x: lambda,
            y: lambda,
        };
        for _ in 0..burn_in {
            map.step()?;
        }
        Ok(map)
    }

    fn step(&mut self) -> Result<(f64, f64)> {
        let wave = |v: f64| (self.b * v.clamp(-1.0, 1.0).acos()).cos();
        let xn = self.k * (self.a * wave(self.x) * (self.y + self.c)).sin();
        let yn = self.k * (self.a * wave(self.y) * (xn + self.c)).sin();
        let xn = finite(xn, "2D-SCL")?;
        let yn = finite(yn, "2D-SCL")?;
        self.x = xn.clamp(-1.0, 1.0);
        self.y = yn.clamp(-1.0, 1.0);
        Ok((xn, yn))
    }

    pub fn next_byte(&mut self) -> Result<u8> {
        let (x, y) = self.step()?;
        let v = unit_fract(x.abs() + y.abs() + self.lambda);
        Ok((v * 256.0) as u8)
    }

    pub fn mask(&mut self, len: usize) -> Result<Vec<u8>> {
        (0..len).map(|_| self.next_byte()).collect()
    }
}

/// Chen's chaotic system, Euler-integrated.
///
/// dx = a (y - x)
/// dy = (c - a) x - x z + c y
/// dz = x y - b z
pub struct ChenSystem {
    x: f64,
    y: f64,
    z: f64,
}

impl ChenSystem {
    pub const A: f64 = 35.0;
    pub const B: f64 = 3.0;
    pub const C: f64 = 28.0;
    /// Step size keeps the discrete trajectory on the bounded attractor.
    pub const DT: f64 = 0.001;

    pub fn new(x0: f64, y0: f64, z0: f64, burn_in: usize) -> Result<Self> {
        let mut system = Self { x: x0, y: y0, z: z0 };
        for _ in 0..burn_in {
            system.step()?;
        }
        Ok(system)
    }

    pub fn step(&mut self) -> Result<(f64, f64, f64)> {
        let dx = Self::A * (self.y - self.x);
        let dy = (Self::C - Self::A) * self.x - self.x * self.z + Self::C * self.y;
        let dz = self.x * self.y - Self::B * self.z;
        self.x = finite(self.x + Self::DT * dx, "Chen system")?;
        self.y = finite(self.y + Self::DT * dy, "Chen system")?;
        self.z = finite(self.z + Self::DT * dz, "Chen system")?;
        Ok((self.x, self.y, self.z))
    }

    /// `len` XOR key bytes in 1..=254 and `len` rotation amounts in `0..len`.
    pub fn keystream(&mut self, len: usize) -> Result<(Vec<u8>, Vec<usize>)> {
        let mut keys = Vec::with_capacity(len);
        let mut shifts = Vec::with_capacity(len);
        let modulus = len.max(1) as u64;
        for _ in 0..len {
            let (x, y, _) = self.step()?;
            keys.push(((x.abs() * 1e5) as u64 % 254 + 1) as u8);
            shifts.push(((y.abs() * 1e5) as u64 % modulus) as usize);
        }
        Ok((keys, shifts))
    }
}

/// Generalized Bulban map: x' = x sqrt(a / (x - 4a)).
pub struct BulbanMap {
    a: f64,
    x: f64,
}

impl BulbanMap {
    pub const A: f64 = 0.5;
    /// Distance kept above the singular point 4a.
    pub const EPS: f64 = 1e-12;

    pub fn new(x0: f64, burn_in: usize) -> Result<Self> {
        let mut map = Self { a: Self::A, x: x0 };
        for _ in 0..burn_in {
            map.next()?;
        }
        Ok(map)
    }

    pub fn next(&mut self) -> Result<f64> {
        let four_a = 4.0 * self.a;
        if self.x <= four_a + Self::EPS {
            self.x = four_a + Self::EPS;
        }
        self.x = finite(self.x * (self.a / (self.x - four_a)).sqrt(), "Bulban map")?;
        Ok(self.x)
    }

    pub fn sequence(&mut self, len: usize) -> Result<Vec<f64>> {
        (0..len).map(|_| self.next()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logistic_map_range() {
        let mut map = LogisticMap::new(3.99, 0.37, 1000).unwrap();
        for _ in 0..1000 {
            let val = map.next().unwrap();
            assert!((0.0..=1.0).contains(&val));
        }
    }

    #[test]
    fn test_logistic_seed_sensitivity() {
        let a = LogisticMap::new(3.99, 0.37, 1000).unwrap().sequence(16).unwrap();
        let b = LogisticMap::new(3.99, 0.37 + 1e-12, 1000).unwrap().sequence(16).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_logistic_divergence_is_reported() {
        let mut map = LogisticMap { state: f64::NAN, r: 3.9 };
        assert!(matches!(map.next(), Err(CipherError::NumericDivergence(_))));
    }

    #[test]
    fn test_lasm_stays_in_unit_interval() {
        let mut map = Lasm2d::new(0.8, 0.3, 0.6, 1024).unwrap();
        let (sx, sy) = map.sequence_pair(4096).unwrap();
        assert!(sx.iter().chain(sy.iter()).all(|v| (0.0..1.0).contains(v)));
        // Chaotic, not collapsed onto a fixed point.
        let mut distinct = sx.clone();
        distinct.sort_by(|a, b| a.total_cmp(b));
        distinct.dedup();
        assert!(distinct.len() > 4000);
    }

    #[test]
    fn test_lasm_is_deterministic() {
        let a = Lasm2d::new(0.9, 0.1, 0.2, 100).unwrap().sequence_pair(64).unwrap();
        let b = Lasm2d::new(0.9, 0.1, 0.2, 100).unwrap().sequence_pair(64).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_scl_mask_varies() {
        let mask = SineCosineLogistic::new(0.37, 50).unwrap().mask(1024).unwrap();
        let mut seen = [false; 256];
        for &b in &mask {
            seen[b as usize] = true;
        }
        assert!(seen.iter().filter(|&&s| s).count() > 200);
    }

    #[test]
    fn test_chen_keystream_ranges() {
        let mut chen = ChenSystem::new(-10.0, 0.4, 37.4, 50).unwrap();
        let (keys, shifts) = chen.keystream(97).unwrap();
        assert_eq!(keys.len(), 97);
        assert!(keys.iter().all(|&k| (1..=254).contains(&k)));
        assert!(shifts.iter().all(|&s| s < 97));
    }

    #[test]
    fn test_chen_stays_bounded() {
        let mut chen = ChenSystem::new(-10.058, 0.368, 37.368, 50).unwrap();
        for _ in 0..20_000 {
            let (x, y, z) = chen.step().unwrap();
            assert!(x.abs() < 100.0 && y.abs() < 100.0 && z.abs() < 100.0);
        }
    }

    #[test]
    fn test_bulban_domain_guard() {
        // Starting on the singular point must not produce NaN or infinity.
        let mut map = BulbanMap::new(2.0, 0).unwrap();
        for _ in 0..500 {
            let v = map.next().unwrap();
            assert!(v.is_finite() && v >= 2.0);
        }
    }

    #[test]
    fn test_unit_fract() {
        assert_eq!(unit_fract(1.25), 0.25);
        assert_eq!(unit_fract(-0.25), 0.75);
        assert!(unit_fract(-1e-300) < 1.0);
    }
}
