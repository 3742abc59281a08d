/// Value-level mixing (diffusion).
///
/// All lanes are byte vectors combined with keystreams modulo 256 or by XOR.
/// Every encrypting routine has an exact inverse below it.
use crate::confusion::{rotate, with_column, Roll};

/// `out[i] = Σ_{j≤i} (lane[j] + ks[j]) mod 256`.
pub fn forward_accumulate(lane: &[u8], ks: &[u8]) -> Vec<u8> {
    let mut acc = 0u8;
    lane.iter()
        .zip(ks)
        .map(|(&v, &k)| {
            acc = acc.wrapping_add(v).wrapping_add(k);
            acc
        })
        .collect()
}

pub fn undo_forward_accumulate(lane: &[u8], ks: &[u8]) -> Vec<u8> {
    let mut prev = 0u8;
    lane.iter()
        .zip(ks)
        .map(|(&c, &k)| {
            let v = c.wrapping_sub(prev).wrapping_sub(k);
            prev = c;
            v
        })
        .collect()
}

/// `out[L-1] = lane[L-1] - ks[L-1]`, `out[i] = lane[i] - lane[i+1] - ks[i]`.
///
/// Each output depends on the *input* neighbour, so the inverse has to walk
/// from the end and use the neighbour it has already recovered.
pub fn backward_chain(lane: &[u8], ks: &[u8]) -> Vec<u8> {
    let n = lane.len();
    let mut out = vec![0u8; n];
    for i in (0..n).rev() {
        let next = if i + 1 < n { lane[i + 1] } else { 0 };
        out[i] = lane[i].wrapping_sub(next).wrapping_sub(ks[i]);
    }
    out
}

pub fn undo_backward_chain(lane: &[u8], ks: &[u8]) -> Vec<u8> {
    let n = lane.len();
    let mut out = vec![0u8; n];
    for i in (0..n).rev() {
        let next = if i + 1 < n { out[i + 1] } else { 0 };
        out[i] = lane[i].wrapping_add(next).wrapping_add(ks[i]);
    }
    out
}

/// Forward accumulation keyed by `ks`, then backward chaining keyed by `ks`
/// reversed.
pub fn two_pass(lane: &[u8], ks: &[u8]) -> Vec<u8> {
    let reversed: Vec<u8> = ks.iter().rev().copied().collect();
    backward_chain(&forward_accumulate(lane, ks), &reversed)
}

pub fn undo_two_pass(lane: &[u8], ks: &[u8]) -> Vec<u8> {
    let reversed: Vec<u8> = ks.iter().rev().copied().collect();
    undo_forward_accumulate(&undo_backward_chain(lane, &reversed), ks)
}

/// Self-inverse keystream XOR.
pub fn xor_in_place(data: &mut [u8], ks: &[u8]) {
    for (v, k) in data.iter_mut().zip(ks) {
        *v ^= k;
    }
}

/// Row-wise then column-wise prefix XOR of a `*×width` plane.
///
/// `A = plane ^ mask_h`, each row replaced by its running XOR, then
/// `B = A ^ mask_v`, each column replaced by its running XOR.
pub fn prefix_xor(plane: &[u8], width: usize, mask_h: &[u8], mask_v: &[u8]) -> Vec<u8> {
    let mut out = plane.to_vec();
    xor_in_place(&mut out, mask_h);
    for row in out.chunks_mut(width) {
        for j in 1..row.len() {
            row[j] ^= row[j - 1];
        }
    }
    xor_in_place(&mut out, mask_v);
    for i in width..out.len() {
        out[i] ^= out[i - width];
    }
    out
}

pub fn undo_prefix_xor(plane: &[u8], width: usize, mask_h: &[u8], mask_v: &[u8]) -> Vec<u8> {
    let mut out = plane.to_vec();
    for i in (width..out.len()).rev() {
        out[i] ^= out[i - width];
    }
    xor_in_place(&mut out, mask_v);
    for row in out.chunks_mut(width) {
        for j in (1..row.len()).rev() {
            row[j] ^= row[j - 1];
        }
    }
    xor_in_place(&mut out, mask_h);
    out
}

/// MurmurHash3 32-bit finalizer.
pub fn fmix32(mut h: u32) -> u32 {
    h ^= h >> 16;
    h = h.wrapping_mul(0x85EB_CA6B);
    h ^= h >> 13;
    h = h.wrapping_mul(0xC2B2_AE35);
    h ^= h >> 16;
    h
}

/// SplitMix64 output avalanche.
pub fn splitmix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// One Chen round: XOR + left rotation on every row, then on every column.
///
/// `row_keys`/`row_shifts` hold one entry per row, `col_keys`/`col_shifts`
/// one per column. Shifts are reduced modulo the lane length.
pub struct ChenRound<'a> {
    pub row_keys: &'a [u8],
    pub row_shifts: &'a [usize],
    pub col_keys: &'a [u8],
    pub col_shifts: &'a [usize],
}

impl ChenRound<'_> {
    pub fn apply(&self, plane: &mut [u8], width: usize) {
        for (i, row) in plane.chunks_mut(width).enumerate() {
            xor_lane(row, self.row_keys[i]);
            rotate(row, self.row_shifts[i], Roll::Backward);
        }
        for j in 0..width {
            let (key, shift) = (self.col_keys[j], self.col_shifts[j]);
            with_column(plane, width, j, |col| {
                xor_lane(col, key);
                rotate(col, shift, Roll::Backward);
            });
        }
    }

    pub fn undo(&self, plane: &mut [u8], width: usize) {
        for j in 0..width {
            let (key, shift) = (self.col_keys[j], self.col_shifts[j]);
            with_column(plane, width, j, |col| {
                rotate(col, shift, Roll::Forward);
                xor_lane(col, key);
            });
        }
        for (i, row) in plane.chunks_mut(width).enumerate() {
            rotate(row, self.row_shifts[i], Roll::Forward);
            xor_lane(row, self.row_keys[i]);
        }
    }
}

fn xor_lane(lane: &mut [u8], key: u8) {
    lane.iter_mut().for_each(|v| *v ^= key);
}

/// Masked additive diffusion over the rows, then the columns, of one plane.
///
/// Rows are chained forward from a virtual top border row over the upper
/// part of the plane and backward from a virtual bottom border row over the
/// lower part; the two parts overlap around the centre by the row offset.
/// Columns are chained the same way without borders, left to right and
/// right to left. Every step adds `neighbour ^ mask` modulo 256.
pub struct MaskedDiffusion<'a> {
    pub top: &'a [u8],
    pub bottom: &'a [u8],
    pub row_fwd: &'a [u8],
    pub row_bwd: &'a [u8],
    pub col_fwd: &'a [u8],
    pub col_bwd: &'a [u8],
    pub row_offset: usize,
    pub col_offset: usize,
}

impl MaskedDiffusion<'_> {
    fn row_spans(&self, height: usize) -> (usize, usize) {
        let up = (height / 2 + self.row_offset + 1).min(height);
        let low = (height / 2).saturating_sub(self.row_offset);
        (up, low)
    }

    fn col_spans(&self, width: usize) -> (usize, usize) {
        let left = (width / 2 + self.col_offset + 1).min(width);
        let right = (width / 2).saturating_sub(self.col_offset);
        (left, right)
    }

    pub fn apply(&self, plane: &mut [u8], width: usize) {
        let height = plane.len() / width;
        let (up, low) = self.row_spans(height);
        let (left, right) = self.col_spans(width);

        for i in 0..up {
            let prev: Vec<u8> = if i == 0 {
                self.top.to_vec()
            } else {
                row(plane, width, i - 1).to_vec()
            };
            add_masked(row_mut(plane, width, i), &prev, self.row_fwd);
        }
        for i in (low..height).rev() {
            let next: Vec<u8> = if i + 1 == height {
                self.bottom.to_vec()
            } else {
                row(plane, width, i + 1).to_vec()
            };
            add_masked(row_mut(plane, width, i), &next, self.row_bwd);
        }

        for j in 1..left {
            for i in 0..height {
                let n = plane[i * width + j - 1] ^ self.col_fwd[i];
                plane[i * width + j] = plane[i * width + j].wrapping_add(n);
            }
        }
        for j in (right..width.saturating_sub(1)).rev() {
            for i in 0..height {
                let n = plane[i * width + j + 1] ^ self.col_bwd[i];
                plane[i * width + j] = plane[i * width + j].wrapping_add(n);
            }
        }
    }

    pub fn undo(&self, plane: &mut [u8], width: usize) {
        let height = plane.len() / width;
        let (up, low) = self.row_spans(height);
        let (left, right) = self.col_spans(width);

        for j in right..width.saturating_sub(1) {
            for i in 0..height {
                let n = plane[i * width + j + 1] ^ self.col_bwd[i];
                plane[i * width + j] = plane[i * width + j].wrapping_sub(n);
            }
        }
        for j in (1..left).rev() {
            for i in 0..height {
                let n = plane[i * width + j - 1] ^ self.col_fwd[i];
                plane[i * width + j] = plane[i * width + j].wrapping_sub(n);
            }
        }

        for i in low..height {
            let next: Vec<u8> = if i + 1 == height {
                self.bottom.to_vec()
            } else {
                row(plane, width, i + 1).to_vec()
            };
            sub_masked(row_mut(plane, width, i), &next, self.row_bwd);
        }
        for i in (0..up).rev() {
            let prev: Vec<u8> = if i == 0 {
                self.top.to_vec()
            } else {
                row(plane, width, i - 1).to_vec()
            };
            sub_masked(row_mut(plane, width, i), &prev, self.row_fwd);
        }
    }
}

fn row(plane: &[u8], width: usize, i: usize) -> &[u8] {
    &plane[i * width..(i + 1) * width]
}

fn row_mut(plane: &mut [u8], width: usize, i: usize) -> &mut [u8] {
    &mut plane[i * width..(i + 1) * width]
}

fn add_masked(lane: &mut [u8], neighbour: &[u8], mask: &[u8]) {
    for ((v, &n), &m) in lane.iter_mut().zip(neighbour).zip(mask) {
        *v = v.wrapping_add(n ^ m);
    }
}

fn sub_masked(lane: &mut [u8], neighbour: &[u8], mask: &[u8]) {
    for ((v, &n), &m) in lane.iter_mut().zip(neighbour).zip(mask) {
        *v = v.wrapping_sub(n ^ m);
    }
}
