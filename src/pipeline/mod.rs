/// Cipher pipelines and the registry that selects one by name.
///
/// Each pipeline owns only its tuning constants; every call re-derives all
/// key-dependent state, so one instance can be shared across threads.
use rayon::prelude::*;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

use crate::config::Settings;
use crate::error::{CipherError, Result};
use crate::key::{validate_key, KeyMaterial};
use crate::raster::Image;

mod bulban;
mod hopfield;
mod hybrid;
mod lasm;
mod lasm_fb;
mod logistic;

pub use bulban::BulbanCipher;
pub use hopfield::HopfieldCipher;
pub use hybrid::HybridCipher;
pub use lasm::Lasm2dCipher;
pub use lasm_fb::LasmFbCipher;
pub use logistic::LogisticCipher;

/// A keyed, invertible image transform.
///
/// `decrypt_image(encrypt_image(img, k, n), k, n) == img` for every valid
/// image, key and nonce. The output always has the input's shape.
pub trait ImageCipher: Send + Sync {
    fn algorithm_name(&self) -> &'static str;

    fn requires_nonce(&self) -> bool;

    fn encrypt_image(&self, image: &Image, key: &str, nonce: Option<&str>) -> Result<Image>;

    fn decrypt_image(&self, image: &Image, key: &str, nonce: Option<&str>) -> Result<Image>;

    /// Non-secret description of a keyed configuration.
    fn encryption_info(&self, key: &str) -> EncryptionInfo {
        EncryptionInfo {
            algorithm: self.algorithm_name(),
            requires_nonce: self.requires_nonce(),
            key_hash: key_fingerprint(key),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncryptionInfo {
    pub algorithm: &'static str,
    pub requires_nonce: bool,
    /// First 16 hex digits of SHA-256(key).
    pub key_hash: String,
}

fn key_fingerprint(key: &str) -> String {
    Sha256::digest(key.as_bytes())
        .iter()
        .take(8)
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Check image, then key, then nonce. Returns the nonce when the pipeline
/// needs one.
pub(crate) fn validate<'a>(
    image: &Image,
    key: &str,
    nonce: Option<&'a str>,
    requires_nonce: bool,
) -> Result<Option<&'a str>> {
    image.validate()?;
    validate_key(key)?;
    if requires_nonce {
        KeyMaterial::require_nonce(nonce).map(Some)
    } else {
        Ok(None)
    }
}

/// Run `f(channel, plane)` on every channel plane in parallel.
pub(crate) fn map_planes<F>(image: &Image, f: F) -> Result<Image>
where
    F: Fn(usize, Vec<u8>) -> Result<Vec<u8>> + Send + Sync,
{
    let planes = image
        .to_planes()
        .into_par_iter()
        .enumerate()
        .map(|(ch, plane)| f(ch, plane))
        .collect::<Result<Vec<_>>>()?;
    Ok(image.from_planes(planes))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    Chaos,
    Fodhnn,
    Lasm2d,
    LasmFb,
    Hybrid,
    Bulban,
}

impl Algorithm {
    pub const ALL: [Algorithm; 6] = [
        Algorithm::Chaos,
        Algorithm::Fodhnn,
        Algorithm::Lasm2d,
        Algorithm::LasmFb,
        Algorithm::Hybrid,
        Algorithm::Bulban,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::Chaos => "chaos",
            Algorithm::Fodhnn => "fodhnn",
            Algorithm::Lasm2d => "2dlasm",
            Algorithm::LasmFb => "lasm_fb",
            Algorithm::Hybrid => "hybrid",
            Algorithm::Bulban => "bulban",
        }
    }

    pub fn cipher(&self, settings: &Settings) -> Box<dyn ImageCipher> {
        match self {
            Algorithm::Chaos => Box::new(LogisticCipher::new(settings)),
            Algorithm::Fodhnn => Box::new(HopfieldCipher::new(settings)),
            Algorithm::Lasm2d => Box::new(Lasm2dCipher::new(settings)),
            Algorithm::LasmFb => Box::new(LasmFbCipher::new(settings)),
            Algorithm::Hybrid => Box::new(HybridCipher::new(settings)),
            Algorithm::Bulban => Box::new(BulbanCipher::new(settings)),
        }
    }
}

impl FromStr for Algorithm {
    type Err = CipherError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chaos" => Ok(Algorithm::Chaos),
            "fodhnn" => Ok(Algorithm::Fodhnn),
            "2dlasm" => Ok(Algorithm::Lasm2d),
            "lasm_fb" => Ok(Algorithm::LasmFb),
            "hybrid" | "acm_2dscl" => Ok(Algorithm::Hybrid),
            "bulban" => Ok(Algorithm::Bulban),
            _ => Err(CipherError::UnknownAlgorithm(s.to_string())),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_names() {
        for alg in Algorithm::ALL {
            let cipher = alg.cipher(&Settings::default());
            assert_eq!(cipher.algorithm_name(), alg.name());
            assert_eq!(alg.name().parse::<Algorithm>().unwrap(), alg);
            assert_eq!(cipher.requires_nonce(), alg != Algorithm::Chaos);
        }
    }

    #[test]
    fn test_alias_and_unknown() {
        assert_eq!("acm_2dscl".parse::<Algorithm>().unwrap(), Algorithm::Hybrid);
        assert_eq!(" FODHNN ".parse::<Algorithm>().unwrap(), Algorithm::Fodhnn);
        assert_eq!(
            "aes".parse::<Algorithm>(),
            Err(CipherError::UnknownAlgorithm("aes".into()))
        );
    }

    #[test]
    fn test_encryption_info() {
        let info = Algorithm::Bulban.cipher(&Settings::default()).encryption_info("secret");
        assert_eq!(info.algorithm, "bulban");
        assert!(info.requires_nonce);
        assert_eq!(info.key_hash, "2bb80d537b1da3e3");
    }

    #[test]
    fn test_validation_order() {
        // Key errors win over nonce errors.
        let image = Image::gray(1, 1, vec![0]).unwrap();
        assert_eq!(validate(&image, " ", None, true), Err(CipherError::InvalidKey));
        assert_eq!(validate(&image, "k", None, true), Err(CipherError::MissingNonce));
        assert_eq!(validate(&image, "k", None, false), Ok(None));
        assert_eq!(validate(&image, "k", Some("n"), true), Ok(Some("n")));
    }
}
