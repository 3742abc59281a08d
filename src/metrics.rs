/// Statistical quality measures for cipher images.
///
/// - **Entropy**: Shannon entropy of the byte histogram, ideal 8 bits
/// - **NPCR**: percentage of positions whose bytes differ, ideal ≈ 99.61%
/// - **UACI**: mean absolute byte difference as a percentage of 255,
///   ideal ≈ 33.46%
/// - **PSNR**: peak signal-to-noise ratio in dB, infinite for equal images
use crate::error::{CipherError, Result};
use crate::raster::Image;

pub fn entropy(data: &[u8]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let mut hist = [0usize; 256];
    for &b in data {
        hist[b as usize] += 1;
    }
    let n = data.len() as f64;
    hist.iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / n;
            -p * p.log2()
        })
        .sum()
}

fn same_shape<'a>(a: &'a Image, b: &'a Image) -> Result<(&'a [u8], &'a [u8])> {
    if a.shape() != b.shape() {
        return Err(CipherError::InvalidImage(format!(
            "shape mismatch: {:?} vs {:?}",
            a.shape(),
            b.shape()
        )));
    }
    Ok((a.as_bytes(), b.as_bytes()))
}

pub fn npcr(a: &Image, b: &Image) -> Result<f64> {
    let (a, b) = same_shape(a, b)?;
    let changed = a.iter().zip(b).filter(|(x, y)| x != y).count();
    Ok(100.0 * changed as f64 / a.len() as f64)
}

pub fn uaci(a: &Image, b: &Image) -> Result<f64> {
    let (a, b) = same_shape(a, b)?;
    let total: f64 = a.iter().zip(b).map(|(&x, &y)| (x as f64 - y as f64).abs()).sum();
    Ok(100.0 * total / (255.0 * a.len() as f64))
}

pub fn psnr(a: &Image, b: &Image) -> Result<f64> {
    let (a, b) = same_shape(a, b)?;
    let mse = a
        .iter()
        .zip(b)
        .map(|(&x, &y)| {
            let d = x as f64 - y as f64;
            d * d
        })
        .sum::<f64>()
        / a.len() as f64;
    if mse == 0.0 {
        return Ok(f64::INFINITY);
    }
    Ok(10.0 * (255.0 * 255.0 / mse).log10())
}
