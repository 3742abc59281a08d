/// Fractional-order Hopfield cipher (`fodhnn`).
///
/// The network trajectory yields three keystreams: `X` and `Y` rank rows
/// and columns, `Z` keys a forward-accumulate then backward-chain diffusion
/// over each flattened channel.
use crate::config::Settings;
use crate::confusion::Permutation;
use crate::diffusion::{two_pass, undo_two_pass};
use crate::error::Result;
use crate::hopfield::{FractionalHopfield, HopfieldParams};
use crate::key::KeyMaterial;
use crate::raster::Image;

use super::{map_planes, validate, ImageCipher};

const INDEX_MODULUS: f64 = 65536.0;

pub struct HopfieldCipher {
    memory_window: usize,
    burn_in: usize,
}

struct Keystreams {
    x: Vec<u64>,
    y: Vec<u64>,
    z: Vec<u8>,
}

impl HopfieldCipher {
    pub fn new(settings: &Settings) -> Self {
        Self {
            memory_window: settings.hopfield_memory_window,
            burn_in: settings.hopfield_burn_in,
        }
    }

    fn keystreams(&self, image: &Image, key: &str, nonce: &str) -> Result<Keystreams> {
        let km = KeyMaterial::derive(key, Some(nonce), None)?;
        let net = FractionalHopfield::new(HopfieldParams::from_key(&km), self.memory_window);
        let traj = net.iterate(image.plane_len(), self.burn_in)?;

        let width = image.width() as f64;
        let index = |v: f64, i: usize| {
            ((v * width + (i + 1) as f64) * 1e7).rem_euclid(INDEX_MODULUS) as u64
        };
        Ok(Keystreams {
            x: traj.x.iter().enumerate().map(|(i, &v)| index(v, i)).collect(),
            y: traj.y.iter().enumerate().map(|(i, &v)| index(v, i)).collect(),
            z: traj.z.iter().map(|&v| ((v - v.floor()) * 255.0) as u8).collect(),
        })
    }
}

impl Default for HopfieldCipher {
    fn default() -> Self {
        Self::new(&Settings::default())
    }
}

impl ImageCipher for HopfieldCipher {
    fn algorithm_name(&self) -> &'static str {
        "fodhnn"
    }

    fn requires_nonce(&self) -> bool {
        true
    }

    fn encrypt_image(&self, image: &Image, key: &str, nonce: Option<&str>) -> Result<Image> {
        let nonce = validate(image, key, nonce, true)?.unwrap_or_default();
        let ks = self.keystreams(image, key, nonce)?;

        let perm = Permutation::lexsort(image.height(), image.width(), &ks.x, &ks.y);
        let permuted = perm.apply(image);
        map_planes(&permuted, |_, plane| Ok(two_pass(&plane, &ks.z)))
    }

    fn decrypt_image(&self, image: &Image, key: &str, nonce: Option<&str>) -> Result<Image> {
        let nonce = validate(image, key, nonce, true)?.unwrap_or_default();
        let ks = self.keystreams(image, key, nonce)?;

        let permuted = map_planes(image, |_, plane| Ok(undo_two_pass(&plane, &ks.z)))?;
        let perm = Permutation::lexsort(image.height(), image.width(), &ks.x, &ks.y);
        Ok(perm.invert(&permuted))
    }
}
