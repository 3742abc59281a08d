/// Generalized Bulban-map cipher (`bulban`).
///
/// Confusion rolls every row, then every column, by chaotic amounts.
/// Diffusion chains masked additions through the rows from two keyed
/// virtual border rows, then through the columns, meeting around the centre.
/// The overlap offsets are bounded by the plane size rounded up to a
/// multiple of four.
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::chaos::BulbanMap;
use crate::config::Settings;
use crate::confusion::{roll_cols, roll_rows, Roll};
use crate::diffusion::MaskedDiffusion;
use crate::error::Result;
use crate::key::KeyMaterial;
use crate::raster::Image;

use super::{map_planes, validate, ImageCipher};

const BORDER_INFO: &[u8] = b"bulban-border-v1";

pub struct BulbanCipher {
    burn_in: usize,
}

/// Everything derived from `(key, nonce, shape)` except the border rows.
struct Schedule {
    row_shifts: Vec<usize>,
    col_shifts: Vec<usize>,
    row_fwd: Vec<u8>,
    row_bwd: Vec<u8>,
    col_fwd: Vec<u8>,
    col_bwd: Vec<u8>,
    row_offset: usize,
    col_offset: usize,
}

fn seeds(km: &KeyMaterial) -> [f64; 6] {
    let mut x = [0.0; 6];
    for (i, v) in x.iter_mut().enumerate() {
        *v = km.interval(i, 2.0, 102.0);
        // 2.0 is the singular point and 2.5 a fixed point.
        if (*v - 2.0).abs() < 1e-12 || (*v - 2.5).abs() < 1e-12 {
            *v += 0.1;
        }
    }
    x
}

fn ceil4(n: usize) -> usize {
    n.div_ceil(4) * 4
}

fn offset(seeds: &[f64], extent: usize) -> usize {
    let mean = seeds.iter().sum::<f64>() / seeds.len() as f64;
    let bound = (ceil4(extent) / 4).max(1) as u64;
    ((mean * 1e5).floor() as u64 % bound) as usize
}

fn mask_byte(x: f64) -> u8 {
    ((x * 255.0) as u64 & 0xFF) as u8
}

impl BulbanCipher {
    pub fn new(settings: &Settings) -> Self {
        Self { burn_in: settings.bulban_burn_in }
    }

    fn sequence(&self, seed: f64, len: usize) -> Result<Vec<f64>> {
        BulbanMap::new(seed, self.burn_in)?.sequence(len)
    }

    fn shifts(&self, seed: f64, len: usize, modulus: usize) -> Result<Vec<usize>> {
        Ok(self
            .sequence(seed, len)?
            .into_iter()
            .map(|v| ((v * 1e5) as u64 % modulus as u64) as usize)
            .collect())
    }

    fn mask(&self, seed: f64, len: usize) -> Result<Vec<u8>> {
        Ok(self.sequence(seed, len)?.into_iter().map(mask_byte).collect())
    }

    fn schedule(&self, km: &KeyMaterial, height: usize, width: usize) -> Result<Schedule> {
        let x = seeds(km);
        Ok(Schedule {
            row_shifts: self.shifts(x[0], height, width)?,
            col_shifts: self.shifts(x[1], width, height)?,
            row_fwd: self.mask(x[2], width)?,
            row_bwd: self.mask(x[3], width)?,
            col_fwd: self.mask(x[4], height)?,
            col_bwd: self.mask(x[5], height)?,
            row_offset: offset(&x[0..3], height),
            col_offset: offset(&x[3..6], width),
        })
    }
}

/// Keyed top and bottom border rows for one channel.
fn border_rows(km: &KeyMaterial, channel: usize, width: usize) -> (Vec<u8>, Vec<u8>) {
    let mut info = BORDER_INFO.to_vec();
    info.push(channel as u8);
    let mut rng = ChaCha20Rng::from_seed(km.expand_seed(&info));
    let mut top = vec![0u8; width];
    let mut bottom = vec![0u8; width];
    rng.fill_bytes(&mut top);
    rng.fill_bytes(&mut bottom);
    (top, bottom)
}

impl Schedule {
    fn diffusion<'a>(&'a self, top: &'a [u8], bottom: &'a [u8]) -> MaskedDiffusion<'a> {
        MaskedDiffusion {
            top,
            bottom,
            row_fwd: &self.row_fwd,
            row_bwd: &self.row_bwd,
            col_fwd: &self.col_fwd,
            col_bwd: &self.col_bwd,
            row_offset: self.row_offset,
            col_offset: self.col_offset,
        }
    }
}

impl Default for BulbanCipher {
    fn default() -> Self {
        Self::new(&Settings::default())
    }
}

impl ImageCipher for BulbanCipher {
    fn algorithm_name(&self) -> &'static str {
        "bulban"
    }

    fn requires_nonce(&self) -> bool {
        true
    }

    fn encrypt_image(&self, image: &Image, key: &str, nonce: Option<&str>) -> Result<Image> {
        let nonce = validate(image, key, nonce, true)?.unwrap_or_default();
        let km = KeyMaterial::derive(key, Some(nonce), None)?;
        let w = image.width();
        let sched = self.schedule(&km, image.height(), w)?;

        map_planes(image, |ch, mut plane| {
            roll_rows(&mut plane, w, &sched.row_shifts, Roll::Forward);
            roll_cols(&mut plane, w, &sched.col_shifts, Roll::Forward);
            let (top, bottom) = border_rows(&km, ch, w);
            sched.diffusion(&top, &bottom).apply(&mut plane, w);
            Ok(plane)
        })
    }

    fn decrypt_image(&self, image: &Image, key: &str, nonce: Option<&str>) -> Result<Image> {
        let nonce = validate(image, key, nonce, true)?.unwrap_or_default();
        let km = KeyMaterial::derive(key, Some(nonce), None)?;
        let w = image.width();
        let sched = self.schedule(&km, image.height(), w)?;

        map_planes(image, |ch, mut plane| {
            let (top, bottom) = border_rows(&km, ch, w);
            sched.diffusion(&top, &bottom).undo(&mut plane, w);
            roll_cols(&mut plane, w, &sched.col_shifts, Roll::Backward);
            roll_rows(&mut plane, w, &sched.row_shifts, Roll::Backward);
            Ok(plane)
        })
    }
}
