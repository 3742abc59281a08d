/// 2-D LASM forward/backward cipher (`lasm_fb`).
///
/// One LASM run is quantized to 32 bits per sample and pushed through a
/// salted SplitMix64 avalanche mixed with the pixel coordinates. The mixed
/// words rank rows and columns and key a two-pass chained diffusion.
use crate::chaos::{unit_fract, Lasm2d};
use crate::config::Settings;
use crate::confusion::Permutation;
use crate::diffusion::{splitmix64, two_pass, undo_two_pass};
use crate::error::Result;
use crate::key::{KeyMaterial, TWO_POW_32};
use crate::raster::Image;

use super::{map_planes, validate, ImageCipher};

const SALT_X: u64 = 0x9E37_79B9_7F4A_7C15;
const SALT_Y: u64 = 0x85EB_CA6B;
const SALT_Z: u64 = 0xC2B2_AE35;

pub struct LasmFbCipher {
    burn_in: usize,
}

struct Keystreams {
    x: Vec<u64>,
    y: Vec<u64>,
    z: Vec<u8>,
}

/// `splitmix64(⌊s·2^32⌋ ^ salt ^ ((i << 32) ^ j))`.
fn quantize_mix(s: f64, salt: u64, i: u64, j: u64) -> u64 {
    let u = (s * TWO_POW_32).floor() as u64;
    splitmix64(u ^ salt ^ ((i << 32) ^ j))
}

impl LasmFbCipher {
    pub fn new(settings: &Settings) -> Self {
        Self { burn_in: settings.lasm_burn_in }
    }

    fn keystreams(&self, image: &Image, key: &str, nonce: &str) -> Result<Keystreams> {
        let km = KeyMaterial::derive(key, Some(nonce), None)?;
        let w = image.width();
        let mu = km.interval(0, 0.70, 0.90);
        let (sx, sy) = Lasm2d::new(mu, km.unit_open(1), km.unit_open(2), self.burn_in)?
            .sequence_pair(image.plane_len())?;

        let mut ks = Keystreams {
            x: Vec::with_capacity(sx.len()),
            y: Vec::with_capacity(sx.len()),
            z: Vec::with_capacity(sx.len()),
        };
        for (idx, (&a, &b)) in sx.iter().zip(&sy).enumerate() {
            let (i, j) = ((idx / w) as u64, (idx % w) as u64);
            let tag = idx as u32;
            ks.x.push(((quantize_mix(a, SALT_X, i, j) as u32) ^ tag.wrapping_mul(0x9E37)) as u64);
            ks.y.push(((quantize_mix(b, SALT_Y, i, j) as u32) ^ tag.wrapping_mul(0x85EB)) as u64);
            ks.z.push((quantize_mix(unit_fract(a + b), SALT_Z, i, j) & 0xFF) as u8);
        }
        Ok(ks)
    }
}

impl Default for LasmFbCipher {
    fn default() -> Self {
        Self::new(&Settings::default())
    }
}

impl ImageCipher for LasmFbCipher {
    fn algorithm_name(&self) -> &'static str {
        "lasm_fb"
    }

    fn requires_nonce(&self) -> bool {
        true
    }

    fn encrypt_image(&self, image: &Image, key: &str, nonce: Option<&str>) -> Result<Image> {
        let nonce = validate(image, key, nonce, true)?.unwrap_or_default();
        let ks = self.keystreams(image, key, nonce)?;

        let perm = Permutation::lexsort(image.height(), image.width(), &ks.x, &ks.y);
        map_planes(&perm.apply(image), |_, plane| Ok(two_pass(&plane, &ks.z)))
    }

    fn decrypt_image(&self, image: &Image, key: &str, nonce: Option<&str>) -> Result<Image> {
        let nonce = validate(image, key, nonce, true)?.unwrap_or_default();
        let ks = self.keystreams(image, key, nonce)?;

        let permuted = map_planes(image, |_, plane| Ok(undo_two_pass(&plane, &ks.z)))?;
        let perm = Permutation::lexsort(image.height(), image.width(), &ks.x, &ks.y);
        Ok(perm.invert(&permuted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let cipher = LasmFbCipher::default();
        let img = Image::with_channels(3, 11, 3, (0..99).map(|v| (v * 5) as u8).collect()).unwrap();
        let enc = cipher.encrypt_image(&img, "k", Some("n")).unwrap();
        assert_ne!(enc, img);
        assert_eq!(cipher.decrypt_image(&enc, "k", Some("n")).unwrap(), img);
    }

    #[test]
    fn test_mix_depends_on_coordinates() {
        assert_ne!(quantize_mix(0.5, SALT_Z, 0, 1), quantize_mix(0.5, SALT_Z, 1, 0));
        assert_ne!(quantize_mix(0.5, SALT_X, 0, 0), quantize_mix(0.5, SALT_Y, 0, 0));
    }

    #[test]
    fn test_keystream_bytes_spread() {
        let img = Image::gray(32, 32, vec![0; 1024]).unwrap();
        let ks = LasmFbCipher::default().keystreams(&img, "k", "n").unwrap();
        let mut seen = [false; 256];
        ks.z.iter().for_each(|&b| seen[b as usize] = true);
        assert!(seen.iter().filter(|&&s| s).count() > 200);
    }

    #[test]
    fn test_tampered_byte_stays_local_before_unpermute() {
        // Bumping cipher byte p shifts the whole backward-chain prefix by the
        // same amount, which the forward accumulation then cancels everywhere
        // except at lane positions 0 and p + 1.
        let cipher = LasmFbCipher::default();
        let (h, w, p) = (6, 9, 20);
        let img = Image::gray(h, w, (0..h * w).map(|v| (v * 37 + 5) as u8).collect()).unwrap();
        let enc = cipher.encrypt_image(&img, "k", Some("n")).unwrap();

        let mut bytes = enc.as_bytes().to_vec();
        bytes[p] = bytes[p].wrapping_add(1);
        let tampered = Image::gray(h, w, bytes).unwrap();

        let clean = cipher.decrypt_image(&enc, "k", Some("n")).unwrap();
        let dirty = cipher.decrypt_image(&tampered, "k", Some("n")).unwrap();
        assert_eq!(clean, img);

        let ks = cipher.keystreams(&img, "k", "n").unwrap();
        let perm = Permutation::lexsort(h, w, &ks.x, &ks.y);
        let (a, b) = (perm.apply(&clean), perm.apply(&dirty));
        let changed: Vec<usize> = (0..h * w)
            .filter(|&i| a.as_bytes()[i] != b.as_bytes()[i])
            .collect();
        assert_eq!(changed, vec![0, p + 1]);
        assert_eq!(b.as_bytes()[0], a.as_bytes()[0].wrapping_add(1));
        assert_eq!(b.as_bytes()[p + 1], a.as_bytes()[p + 1].wrapping_sub(1));
    }

    #[test]
    fn test_tampered_last_byte_touches_only_first() {
        let cipher = LasmFbCipher::default();
        let img = Image::gray(4, 5, (0..20).map(|v| (v * 11) as u8).collect()).unwrap();
        let enc = cipher.encrypt_image(&img, "k", Some("n")).unwrap();

        let mut bytes = enc.as_bytes().to_vec();
        bytes[19] ^= 0x80;
        let tampered = Image::gray(4, 5, bytes).unwrap();
        let dirty = cipher.decrypt_image(&tampered, "k", Some("n")).unwrap();

        let ks = cipher.keystreams(&img, "k", "n").unwrap();
        let perm = Permutation::lexsort(4, 5, &ks.x, &ks.y);
        let (a, b) = (perm.apply(&img), perm.apply(&dirty));
        let changed: Vec<usize> = (0..20)
            .filter(|&i| a.as_bytes()[i] != b.as_bytes()[i])
            .collect();
        assert_eq!(changed, vec![0]);
    }
}
