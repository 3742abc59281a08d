/// Logistic-map cipher (`chaos`).
///
/// Key-only: rows and columns are reordered by the argsort of two logistic
/// sequences, then every sample is XORed with a third. Any supplied nonce is
/// ignored.
///
/// Keystream bytes follow the map's arcsine density and cluster near 0 and
/// 255, so key sensitivity depends on the plaintext: random content gives
/// NPCR above 99% between keys, flat content slightly less.
use crate::chaos::{unit_fract, LogisticMap};
use crate::config::Settings;
use crate::confusion::Permutation;
use crate::diffusion::xor_in_place;
use crate::error::Result;
use crate::key::{clip_open_unit, KeyMaterial};
use crate::raster::Image;

use super::{validate, ImageCipher};

pub struct LogisticCipher {
    burn_in: usize,
}

struct Params {
    r: f64,
    x0: f64,
}

impl Params {
    fn derive(key: &str) -> Result<Self> {
        let km = KeyMaterial::derive(key, None, None)?;
        Ok(Self {
            r: km.interval(0, 3.97, 4.0),
            x0: km.unit_open(1),
        })
    }

    /// Seed offset from `x0` and folded back into the open unit interval.
    fn seed(&self, offset: f64) -> f64 {
        clip_open_unit(unit_fract(self.x0 + offset))
    }
}

impl LogisticCipher {
    pub fn new(settings: &Settings) -> Self {
        Self { burn_in: settings.logistic_burn_in }
    }

    fn sequence(&self, params: &Params, offset: f64, len: usize) -> Result<Vec<f64>> {
        LogisticMap::new(params.r, params.seed(offset), self.burn_in)?.sequence(len)
    }

    fn permutation(&self, params: &Params, image: &Image) -> Result<Permutation> {
        let rows = self.sequence(params, 0.0, image.height())?;
        let cols = self.sequence(params, 0.1, image.width())?;
        Ok(Permutation::argsort(&rows, &cols))
    }

    fn keystream(&self, params: &Params, len: usize) -> Result<Vec<u8>> {
        Ok(self
            .sequence(params, 0.2, len)?
            .into_iter()
            .map(|x| (x * 255.0) as u8)
            .collect())
    }
}

impl Default for LogisticCipher {
    fn default() -> Self {
        Self::new(&Settings::default())
    }
}

impl ImageCipher for LogisticCipher {
    fn algorithm_name(&self) -> &'static str {
        "chaos"
    }

    fn requires_nonce(&self) -> bool {
        false
    }

    fn encrypt_image(&self, image: &Image, key: &str, nonce: Option<&str>) -> Result<Image> {
        validate(image, key, nonce, false)?;
        let params = Params::derive(key)?;

        let perm = self.permutation(&params, image)?;
        let mut data = perm.apply_raw(image.as_bytes(), image.channels());
        let ks = self.keystream(&params, data.len())?;
        xor_in_place(&mut data, &ks);
        Ok(image.with_data(data))
    }

    fn decrypt_image(&self, image: &Image, key: &str, nonce: Option<&str>) -> Result<Image> {
        validate(image, key, nonce, false)?;
        let params = Params::derive(key)?;

        let mut data = image.as_bytes().to_vec();
        let ks = self.keystream(&params, data.len())?;
        xor_in_place(&mut data, &ks);
        let perm = self.permutation(&params, image)?;
        Ok(image.with_data(perm.invert_raw(&data, image.channels())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_roundtrip_rgb() {
        let data: Vec<u8> = (0..5 * 7 * 3).map(|v| (v * 7) as u8).collect();
        let img = Image::with_channels(5, 7, 3, data).unwrap();
        let cipher = LogisticCipher::default();
        let enc = cipher.encrypt_image(&img, "key", None).unwrap();
        assert_ne!(enc, img);
        assert_eq!(cipher.decrypt_image(&enc, "key", None).unwrap(), img);
    }

    #[test]
    fn test_nonce_is_ignored() {
        let img = Image::gray(4, 4, (0..16).collect()).unwrap();
        let cipher = LogisticCipher::default();
        let a = cipher.encrypt_image(&img, "key", None).unwrap();
        let b = cipher.encrypt_image(&img, "key", Some("anything")).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_roundtrip_gray_odd_length() {
        let img = Image::gray(3, 11, (0..33).map(|v| (v * 29) as u8).collect()).unwrap();
        let cipher = LogisticCipher::default();
        let enc = cipher.encrypt_image(&img, "key", None).unwrap();
        assert_eq!(enc.shape(), vec![3, 11]);
        assert_eq!(cipher.decrypt_image(&enc, "key", None).unwrap(), img);
    }

    #[test]
    fn test_keystream_clusters_at_extremes() {
        // Zero plaintext: the cipher is the bare keystream.
        let img = Image::gray(32, 32, vec![0; 1024]).unwrap();
        let enc = LogisticCipher::default().encrypt_image(&img, "key", None).unwrap();
        let edges = enc.as_bytes().iter().filter(|&&b| b < 32 || b > 223).count();
        assert!(edges as f64 / 1024.0 > 0.35);
    }

    #[test]
    fn test_key_sensitivity_on_random_content() {
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        let img = Image::gray(64, 64, (0..4096).map(|_| rng.gen()).collect()).unwrap();
        let cipher = LogisticCipher::default();
        let a = cipher.encrypt_image(&img, "key-1", None).unwrap();
        let b = cipher.encrypt_image(&img, "key-2", None).unwrap();
        assert!(crate::metrics::npcr(&a, &b).unwrap() > 99.0);
    }

    #[test]
    fn test_seed_offsets_stay_interior() {
        let params = Params { r: 3.99, x0: 0.95 };
        let s = params.seed(0.1);
        assert!(s > 0.0 && s < 1.0);
        assert!((s - 0.05).abs() < 1e-12);
    }
}
