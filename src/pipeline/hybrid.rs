/// Hybrid cipher (`hybrid`, alias `acm_2dscl`).
///
/// Per channel: Arnold cat map on square planes or a keyed row/column
/// shuffle on rectangular ones, a 2D-SCL XOR mask, then one Chen XOR+rotate
/// round over rows and columns. Parameters depend on the image shape as well
/// as the key and nonce.
use crate::chaos::{ChenSystem, SineCosineLogistic};
use crate::config::Settings;
use crate::confusion::{CatMap, Permutation};
use crate::diffusion::{xor_in_place, ChenRound};
use crate::error::Result;
use crate::key::{seed64, KeyMaterial, TWO_POW_32};
use crate::raster::Image;

use super::{map_planes, validate, ImageCipher};

pub struct HybridCipher {
    scl_burn_in: usize,
    chen_burn_in: usize,
}

struct Params {
    cat: CatMap,
    lambda: f64,
}

impl Params {
    fn derive(key: &str, nonce: &str, height: usize, width: usize) -> Result<Self> {
        let km = KeyMaterial::derive(key, Some(nonce), Some((height, width)))?;
        // p, q ∈ {1, 2}
        let small = |i: usize| 1 + (km.word(i) as f64 / TWO_POW_32 * 2.0).floor() as i64;
        Ok(Self {
            cat: CatMap {
                p: small(0),
                q: small(1),
                iterations: 4 + (km.word(2) % 5) as usize,
            },
            lambda: km.interval(3, 0.1, 0.9),
        })
    }

    fn chen_origin(&self) -> (f64, f64, f64) {
        let shift = self.lambda * 0.1;
        (-10.058 + shift, 0.368 + shift, 37.368 + shift)
    }

    fn shuffle_seed(&self, height: usize, width: usize, channel: usize) -> u64 {
        seed64(&format!(
            "{}|{}|{}|{}|{}|{}|rect-permute-v1",
            self.cat.p, self.cat.q, self.cat.iterations, height, width, channel
        ))
    }
}

/// Keystreams shared by every channel of one call.
struct Streams {
    mask: Vec<u8>,
    row_keys: Vec<u8>,
    row_shifts: Vec<usize>,
    col_keys: Vec<u8>,
    col_shifts: Vec<usize>,
}

impl Streams {
    fn round(&self) -> ChenRound<'_> {
        ChenRound {
            row_keys: &self.row_keys,
            row_shifts: &self.row_shifts,
            col_keys: &self.col_keys,
            col_shifts: &self.col_shifts,
        }
    }
}

impl HybridCipher {
    pub fn new(settings: &Settings) -> Self {
        Self {
            scl_burn_in: settings.scl_burn_in,
            chen_burn_in: settings.chen_burn_in,
        }
    }

    fn streams(&self, params: &Params, height: usize, width: usize) -> Result<Streams> {
        let mask = SineCosineLogistic::new(params.lambda, self.scl_burn_in)?.mask(height * width)?;
        // Row and column streams both start from the same initial state.
        let (x0, y0, z0) = params.chen_origin();
        let chen = || ChenSystem::new(x0, y0, z0, self.chen_burn_in);
        let (row_keys, row_shifts) = chen()?.keystream(height)?;
        let (col_keys, col_shifts) = chen()?.keystream(width)?;
        Ok(Streams { mask, row_keys, row_shifts, col_keys, col_shifts })
    }
}

impl Default for HybridCipher {
    fn default() -> Self {
        Self::new(&Settings::default())
    }
}

impl ImageCipher for HybridCipher {
    fn algorithm_name(&self) -> &'static str {
        "hybrid"
    }

    fn requires_nonce(&self) -> bool {
        true
    }

    fn encrypt_image(&self, image: &Image, key: &str, nonce: Option<&str>) -> Result<Image> {
        let nonce = validate(image, key, nonce, true)?.unwrap_or_default();
        let (h, w) = (image.height(), image.width());
        let params = Params::derive(key, nonce, h, w)?;
        let streams = self.streams(&params, h, w)?;

        map_planes(image, |ch, plane| {
            let mut out = if image.is_square() {
                params.cat.scramble(&plane, h)
            } else {
                Permutation::shuffled(h, w, params.shuffle_seed(h, w, ch)).apply_raw(&plane, 1)
            };
            xor_in_place(&mut out, &streams.mask);
            streams.round().apply(&mut out, w);
            Ok(out)
        })
    }

    fn decrypt_image(&self, image: &Image, key: &str, nonce: Option<&str>) -> Result<Image> {
        let nonce = validate(image, key, nonce, true)?.unwrap_or_default();
        let (h, w) = (image.height(), image.width());
        let params = Params::derive(key, nonce, h, w)?;
        let streams = self.streams(&params, h, w)?;

        map_planes(image, |ch, mut plane| {
            streams.round().undo(&mut plane, w);
            xor_in_place(&mut plane, &streams.mask);
            Ok(if image.is_square() {
                params.cat.unscramble(&plane, h)
            } else {
                Permutation::shuffled(h, w, params.shuffle_seed(h, w, ch)).invert_raw(&plane, 1)
            })
        })
    }
}
