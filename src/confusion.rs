/// Pixel-position scrambling (confusion).
///
/// Row/column permutations move whole rows and columns of every channel at
/// once. The Arnold cat map and the keyed shuffle act on one channel plane.
/// Every transform here is a bijection and is never stored: decryption
/// rebuilds it from the same key material.
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use std::cmp::Ordering;

use crate::raster::Image;

/// Separate row and column orderings; `out[r][c] = in[rows[r]][cols[c]]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permutation {
    pub rows: Vec<usize>,
    pub cols: Vec<usize>,
}

impl Permutation {
    /// Rows ordered by `(Σ_row x, y[r][0], r)`, columns by
    /// `(Σ_col y, x[0][c], c)`. `x` and `y` are row-major `h*w` weights.
    pub fn lexsort(height: usize, width: usize, x: &[u64], y: &[u64]) -> Self {
        debug_assert_eq!(x.len(), height * width);
        debug_assert_eq!(y.len(), height * width);

        let row_keys: Vec<(u128, u64)> = (0..height)
            .map(|r| {
                let sum = x[r * width..(r + 1) * width].iter().map(|&v| v as u128).sum();
                (sum, y[r * width])
            })
            .collect();
        let col_keys: Vec<(u128, u64)> = (0..width)
            .map(|c| {
                let sum = (0..height).map(|r| y[r * width + c] as u128).sum();
                (sum, x[c])
            })
            .collect();

        let mut rows: Vec<usize> = (0..height).collect();
        rows.sort_by_key(|&r| row_keys[r]);
        let mut cols: Vec<usize> = (0..width).collect();
        cols.sort_by_key(|&c| col_keys[c]);
        Self { rows, cols }
    }

    /// Orderings that sort each real sequence ascending.
    pub fn argsort(row_seq: &[f64], col_seq: &[f64]) -> Self {
        Self {
            rows: argsort_f64(row_seq),
            cols: argsort_f64(col_seq),
        }
    }

    /// Keyed Fisher-Yates shuffle of rows then columns.
    ///
    /// `gen_range` is drawn over `u32` so the permutation is identical on
    /// 32- and 64-bit targets.
    pub fn shuffled(height: usize, width: usize, seed: u64) -> Self {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let mut rows: Vec<usize> = (0..height).collect();
        fisher_yates(&mut rows, &mut rng);
        let mut cols: Vec<usize> = (0..width).collect();
        fisher_yates(&mut cols, &mut rng);
        Self { rows, cols }
    }

    pub fn inverse(&self) -> Self {
        Self {
            rows: invert_indices(&self.rows),
            cols: invert_indices(&self.cols),
        }
    }

    /// Gather rows and columns of an interleaved `h*w*channels` buffer.
    pub fn apply_raw(&self, data: &[u8], channels: usize) -> Vec<u8> {
        let width = self.cols.len();
        let mut out = Vec::with_capacity(data.len());
        for &src_row in &self.rows {
            let base = src_row * width;
            for &src_col in &self.cols {
                let at = (base + src_col) * channels;
                out.extend_from_slice(&data[at..at + channels]);
            }
        }
        out
    }

    /// Undo [`apply_raw`](Self::apply_raw).
    pub fn invert_raw(&self, data: &[u8], channels: usize) -> Vec<u8> {
        self.inverse().apply_raw(data, channels)
    }

    pub fn apply(&self, image: &Image) -> Image {
        image.with_data(self.apply_raw(image.as_bytes(), image.channels()))
    }

    pub fn invert(&self, image: &Image) -> Image {
        image.with_data(self.invert_raw(image.as_bytes(), image.channels()))
    }
}

fn argsort_f64(seq: &[f64]) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..seq.len()).collect();
    idx.sort_by(|&a, &b| match seq[a].total_cmp(&seq[b]) {
        Ordering::Equal => a.cmp(&b),
        other => other,
    });
    idx
}

fn invert_indices(perm: &[usize]) -> Vec<usize> {
    let mut inv = vec![0usize; perm.len()];
    for (i, &p) in perm.iter().enumerate() {
        inv[p] = i;
    }
    inv
}

fn fisher_yates(items: &mut [usize], rng: &mut ChaCha20Rng) {
    let n = items.len();
    for i in (1..n).rev() {
        let j = rng.gen_range(0..=(i as u32)) as usize;
        items.swap(i, j);
    }
}

/// Arnold cat map parameters for an `n×n` plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatMap {
    pub p: i64,
    pub q: i64,
    pub iterations: usize,
}

impl CatMap {
    /// `(x, y) → (x + p y, q x + (pq + 1) y) mod n`, iterated.
    pub fn scramble(&self, plane: &[u8], n: usize) -> Vec<u8> {
        let (p, q) = (self.p, self.q);
        self.iterate(plane, n, |x, y| (x + p * y, q * x + (p * q + 1) * y))
    }

    /// `(x, y) → ((pq + 1) x - p y, -q x + y) mod n`, iterated.
    pub fn unscramble(&self, plane: &[u8], n: usize) -> Vec<u8> {
        let (p, q) = (self.p, self.q);
        self.iterate(plane, n, |x, y| ((p * q + 1) * x - p * y, -q * x + y))
    }

    fn iterate(&self, plane: &[u8], n: usize, map: impl Fn(i64, i64) -> (i64, i64)) -> Vec<u8> {
        debug_assert_eq!(plane.len(), n * n);
        let size = n as i64;
        let mut cur = plane.to_vec();
        let mut next = vec![0u8; cur.len()];
        for _ in 0..self.iterations {
            for x in 0..size {
                for y in 0..size {
                    let (nx, ny) = map(x, y);
                    let (nx, ny) = (nx.rem_euclid(size), ny.rem_euclid(size));
                    next[(nx * size + ny) as usize] = cur[(x * size + y) as usize];
                }
            }
            std::mem::swap(&mut cur, &mut next);
        }
        cur
    }
}

/// Direction of a cyclic lane shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Roll {
    /// Towards higher indices (right for rows, down for columns).
    Forward,
    Backward,
}

pub(crate) fn rotate(lane: &mut [u8], shift: usize, roll: Roll) {
    if lane.is_empty() {
        return;
    }
    let k = shift % lane.len();
    match roll {
        Roll::Forward => lane.rotate_right(k),
        Roll::Backward => lane.rotate_left(k),
    }
}

/// Cyclically shift row `i` of a `*×width` plane by `shifts[i]`.
pub fn roll_rows(plane: &mut [u8], width: usize, shifts: &[usize], roll: Roll) {
    for (row, &shift) in plane.chunks_mut(width).zip(shifts) {
        rotate(row, shift, roll);
    }
}

/// Cyclically shift column `j` of a `*×width` plane by `shifts[j]`.
pub fn roll_cols(plane: &mut [u8], width: usize, shifts: &[usize], roll: Roll) {
    for (col, &shift) in shifts.iter().enumerate().take(width) {
        with_column(plane, width, col, |lane| rotate(lane, shift, roll));
    }
}

/// Run `f` on a copy of column `col` and write the result back.
pub(crate) fn with_column(plane: &mut [u8], width: usize, col: usize, f: impl FnOnce(&mut [u8])) {
    let mut lane: Vec<u8> = plane.iter().skip(col).step_by(width).copied().collect();
    f(&mut lane);
    for (r, v) in lane.into_iter().enumerate() {
        plane[r * width + col] = v;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_bijection(perm: &[usize]) -> bool {
        let mut seen = vec![false; perm.len()];
        for &p in perm {
            if p >= perm.len() || seen[p] {
                return false;
            }
            seen[p] = true;
        }
        true
    }

    #[test]
    fn test_lexsort_orders_by_sum_then_tiebreak() {
        // 3x2: row sums of x are 5, 5, 1; tie broken by y[r][0].
        let x = [2, 3, 4, 1, 0, 1];
        let y = [9, 0, 4, 0, 7, 7];
        let perm = Permutation::lexsort(3, 2, &x, &y);
        assert_eq!(perm.rows, vec![2, 1, 0]);
        // column sums of y: 20, 7.
        assert_eq!(perm.cols, vec![1, 0]);
    }

    #[test]
    fn test_lexsort_is_stable_on_full_ties() {
        let perm = Permutation::lexsort(3, 3, &[1; 9], &[1; 9]);
        assert_eq!(perm.rows, vec![0, 1, 2]);
        assert_eq!(perm.cols, vec![0, 1, 2]);
    }

    #[test]
    fn test_argsort_uses_index_tiebreak() {
        let perm = Permutation::argsort(&[0.5, 0.1, 0.5, 0.0], &[1.0]);
        assert_eq!(perm.rows, vec![3, 1, 0, 2]);
        assert_eq!(perm.cols, vec![0]);
    }

    #[test]
    fn test_apply_then_invert_is_identity() {
        let perm = Permutation::shuffled(5, 7, 42);
        assert!(is_bijection(&perm.rows));
        assert!(is_bijection(&perm.cols));

        let data: Vec<u8> = (0..105).map(|v| v as u8).collect();
        let img = Image::with_channels(5, 7, 3, data).unwrap();
        let scrambled = perm.apply(&img);
        assert_ne!(scrambled, img);
        assert_eq!(perm.invert(&scrambled), img);
    }

    #[test]
    fn test_apply_gathers() {
        let perm = Permutation { rows: vec![1, 0], cols: vec![1, 0] };
        assert_eq!(perm.apply_raw(&[1, 2, 3, 4], 1), vec![4, 3, 2, 1]);
    }

    #[test]
    fn test_shuffle_is_keyed() {
        assert_eq!(Permutation::shuffled(16, 16, 7), Permutation::shuffled(16, 16, 7));
        assert_ne!(Permutation::shuffled(16, 16, 7), Permutation::shuffled(16, 16, 8));
    }

    #[test]
    fn test_cat_map_roundtrip() {
        let plane: Vec<u8> = (0..49).collect();
        let cat = CatMap { p: 2, q: 1, iterations: 5 };
        let scrambled = cat.scramble(&plane, 7);
        assert_ne!(scrambled, plane);
        let mut sorted = scrambled.clone();
        sorted.sort();
        assert_eq!(sorted, plane);
        assert_eq!(cat.unscramble(&scrambled, 7), plane);
    }

    #[test]
    fn test_cat_map_single_pixel() {
        let cat = CatMap { p: 1, q: 2, iterations: 8 };
        assert_eq!(cat.scramble(&[9], 1), vec![9]);
    }

    #[test]
    fn test_rolls_roundtrip() {
        let original: Vec<u8> = (0..12).collect();
        let mut plane = original.clone();
        roll_rows(&mut plane, 4, &[1, 2, 7], Roll::Forward);
        assert_eq!(&plane[0..4], &[3, 0, 1, 2]);
        roll_cols(&mut plane, 4, &[1, 0, 5, 3], Roll::Forward);
        roll_cols(&mut plane, 4, &[1, 0, 5, 3], Roll::Backward);
        roll_rows(&mut plane, 4, &[1, 2, 7], Roll::Backward);
        assert_eq!(plane, original);
    }
}
