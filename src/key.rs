/// Key-to-parameter derivation.
///
/// Every pipeline turns `(key, nonce, shape)` into numeric parameters through
/// one SHA-256 digest. The digest is split into eight big-endian `u32` words,
/// and each named parameter is mapped from one word into its interval.
/// Nothing is cached: identical inputs always re-derive identical values.
use crate::error::{CipherError, Result};
use hkdf::Hkdf;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

const SEPARATOR: &str = "|";

/// Smallest distance kept from 0 and 1 for seeds that must be strictly
/// interior to the unit interval.
pub const UNIT_EPS: f64 = 1e-9;

pub const TWO_POW_32: f64 = 4_294_967_296.0;

pub struct KeyMaterial {
    digest: Zeroizing<[u8; 32]>,
}

impl KeyMaterial {
    /// Digest `key`, then `|nonce` if given, then `|HxW` if the caller is
    /// shape-sensitive.
    pub fn derive(key: &str, nonce: Option<&str>, shape: Option<(usize, usize)>) -> Result<Self> {
        validate_key(key)?;

        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        if let Some(nonce) = nonce {
            hasher.update(SEPARATOR.as_bytes());
            hasher.update(nonce.as_bytes());
        }
        if let Some((h, w)) = shape {
            hasher.update(SEPARATOR.as_bytes());
            hasher.update(format!("{}x{}", h, w).as_bytes());
        }
        let digest: [u8; 32] = hasher.finalize().into();
        Ok(Self { digest: Zeroizing::new(digest) })
    }

    /// Return the nonce, failing closed when it is absent or blank.
    pub fn require_nonce(nonce: Option<&str>) -> Result<&str> {
        match nonce {
            Some(n) if !n.trim().is_empty() => Ok(n),
            _ => Err(CipherError::MissingNonce),
        }
    }

    /// Big-endian 32-bit chunk `i` (0..8) of the digest.
    pub fn word(&self, i: usize) -> u32 {
        let at = 4 * (i % 8);
        u32::from_be_bytes([
            self.digest[at],
            self.digest[at + 1],
            self.digest[at + 2],
            self.digest[at + 3],
        ])
    }

    /// `lo + (word / 2^32) * (hi - lo)`, always in `[lo, hi)`.
    pub fn interval(&self, i: usize, lo: f64, hi: f64) -> f64 {
        map_to_interval(self.word(i), lo, hi)
    }

    /// Word `i` mapped into the open unit interval.
    pub fn unit_open(&self, i: usize) -> f64 {
        clip_open_unit(self.interval(i, 0.0, 1.0))
    }

    /// 32-byte PRNG seed from HKDF-SHA256 over the digest, domain separated
    /// by `info`.
    pub fn expand_seed(&self, info: &[u8]) -> [u8; 32] {
        let hk = Hkdf::<Sha256>::new(None, &self.digest[..]);
        let mut okm = [0u8; 32];
        hk.expand(info, &mut okm)
            .expect("HKDF expand should never fail with valid length");
        okm
    }
}

pub fn validate_key(key: &str) -> Result<()> {
    if key.trim().is_empty() {
        return Err(CipherError::InvalidKey);
    }
    Ok(())
}

pub fn map_to_interval(word: u32, lo: f64, hi: f64) -> f64 {
    lo + (word as f64 / TWO_POW_32) * (hi - lo)
}

pub fn clip_open_unit(x: f64) -> f64 {
    x.clamp(UNIT_EPS, 1.0 - UNIT_EPS)
}

/// 64-bit seed from the SHA-256 of a label, little-endian.
pub fn seed64(label: &str) -> u64 {
    let out: [u8; 32] = Sha256::digest(label.as_bytes()).into();
    let mut head = [0u8; 8];
    head.copy_from_slice(&out[..8]);
    u64::from_le_bytes(head)
}
