/// Fractional-order discrete Hopfield neural network (FODHNN).
///
/// Three neurons with Caputo-like fractional memory: each state is the seed
/// plus a weighted sum over the last `memory_window` forcing terms. The
/// kernel `w[m] = w[m-1] (ν + m - 1) / m` is built incrementally so it never
/// overflows the way a gamma-function ratio would.
use crate::error::Result;
use crate::key::KeyMaterial;

use crate::chaos::finite;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HopfieldParams {
    /// Fractional order in (0, 1].
    pub nu: f64,
    /// Coupling added to the x→y synapse.
    pub p: f64,
    pub x0: f64,
    pub y0: f64,
    pub z0: f64,
}

impl HopfieldParams {
    pub fn from_key(km: &KeyMaterial) -> Self {
        Self {
            nu: km.interval(0, 0.70, 0.95),
            p: km.interval(1, 0.05, 0.25),
            x0: km.unit_open(2),
            y0: km.unit_open(3),
            z0: km.unit_open(4),
        }
    }
}

/// Recorded states after burn-in.
#[derive(Debug, Clone)]
pub struct Trajectory {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
}

pub struct FractionalHopfield {
    params: HopfieldParams,
    kernel: Vec<f64>,
}

impl FractionalHopfield {
    pub fn new(params: HopfieldParams, memory_window: usize) -> Self {
        let window = memory_window.max(1);
        let mut kernel = Vec::with_capacity(window);
        kernel.push(1.0);
        for m in 1..window {
            let prev = kernel[m - 1];
            kernel.push(prev * (params.nu + m as f64 - 1.0) / m as f64);
        }
        Self { params, kernel }
    }

    pub fn kernel(&self) -> &[f64] {
        &self.kernel
    }

    fn forcing(&self, x: f64, y: f64, z: f64) -> (f64, f64, f64) {
        let (tx, ty, tz) = (x.tanh(), y.tanh(), z.tanh());
        (
            -x + 2.0 * tx - 1.2 * ty,
            -y + (self.params.p + 1.9) * tx + 1.71 * ty + 1.15 * tz,
            -z - 4.75 * tx + 1.1 * tz,
        )
    }

    /// Run `burn_in + n_steps` iterations and keep the last `n_steps`.
    pub fn iterate(&self, n_steps: usize, burn_in: usize) -> Result<Trajectory> {
        let steps = burn_in + n_steps;
        let HopfieldParams { x0, y0, z0, .. } = self.params;

        let mut fx = Vec::with_capacity(steps);
        let mut fy = Vec::with_capacity(steps);
        let mut fz = Vec::with_capacity(steps);
        let mut out = Trajectory {
            x: Vec::with_capacity(n_steps),
            y: Vec::with_capacity(n_steps),
            z: Vec::with_capacity(n_steps),
        };

        let (mut x, mut y, mut z) = (
            finite(x0, "FODHNN")?,
            finite(y0, "FODHNN")?,
            finite(z0, "FODHNN")?,
        );
        for n in 0..steps {
            if n > 0 {
                let span = self.kernel.len().min(n);
                let (mut sx, mut sy, mut sz) = (0.0, 0.0, 0.0);
                for (m, w) in self.kernel[..span].iter().enumerate() {
                    let at = n - 1 - m;
                    sx += w * fx[at];
                    sy += w * fy[at];
                    sz += w * fz[at];
                }
                x = finite(x0 + sx, "FODHNN")?;
                y = finite(y0 + sy, "FODHNN")?;
                z = finite(z0 + sz, "FODHNN")?;
            }

            let (a, b, c) = self.forcing(x, y, z);
            fx.push(a);
            fy.push(b);
            fz.push(c);

            if n >= burn_in {
                out.x.push(x);
                out.y.push(y);
                out.z.push(z);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CipherError;

    fn params() -> HopfieldParams {
        HopfieldParams { nu: 0.85, p: 0.15, x0: 0.3, y0: 0.6, z0: 0.9 }
    }

    #[test]
    fn test_kernel_recurrence() {
        let net = FractionalHopfield::new(params(), 4);
        let k = net.kernel();
        assert_eq!(k.len(), 4);
        assert_eq!(k[0], 1.0);
        assert!((k[1] - 0.85).abs() < 1e-15);
        assert!((k[2] - 0.85 * 1.85 / 2.0).abs() < 1e-15);
    }

    #[test]
    fn test_zero_window_is_promoted() {
        assert_eq!(FractionalHopfield::new(params(), 0).kernel().len(), 1);
    }

    #[test]
    fn test_trajectory_length_and_bounds() {
        let net = FractionalHopfield::new(params(), 256);
        let t = net.iterate(2000, 1024).unwrap();
        assert_eq!(t.x.len(), 2000);
        assert_eq!(t.z.len(), 2000);
        for i in 0..2000 {
            assert!(t.x[i].abs() < 50.0 && t.y[i].abs() < 50.0 && t.z[i].abs() < 50.0);
        }
    }

    #[test]
    fn test_deterministic() {
        let net = FractionalHopfield::new(params(), 64);
        let a = net.iterate(100, 10).unwrap();
        let b = net.iterate(100, 10).unwrap();
        assert_eq!(a.x, b.x);
        assert_eq!(a.y, b.y);
        assert_eq!(a.z, b.z);
    }

    #[test]
    fn test_non_finite_seed_diverges() {
        let mut p = params();
        p.y0 = f64::NAN;
        let net = FractionalHopfield::new(p, 8);
        assert!(matches!(net.iterate(4, 0), Err(CipherError::NumericDivergence(_))));
    }

    #[test]
    fn test_params_from_key() {
        let km = KeyMaterial::derive("k", Some("n"), None).unwrap();
        let p = HopfieldParams::from_key(&km);
        assert!((0.70..0.95).contains(&p.nu));
        assert!((0.05..0.25).contains(&p.p));
        assert!(p.x0 > 0.0 && p.x0 < 1.0);
    }
}
