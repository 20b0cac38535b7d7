//! BLAKE-256, one of the four CryptoNight finalists.
//!
//! This is the SHA-3-finalist BLAKE (14 rounds, 32-bit words), not BLAKE2;
//! the ecosystem has no maintained crate for it, so it lives here behind the
//! same digest-shaped interface the other finalists expose.

use crate::util::subarray_copy;

/// One-shot digest interface, mirroring the subset of [`digest::Digest`]
/// the finalist dispatch needs.
pub(crate) trait Digest {
    fn new() -> Self;
    fn update(&mut self, data: impl AsRef<[u8]>);
    fn finalize(self) -> [u8; 32];

    fn digest(data: impl AsRef<[u8]>) -> [u8; 32]
    where
        Self: Sized,
    {
        let mut hasher = Self::new();
        hasher.update(data);
        hasher.finalize()
    }
}

const BLOCK_SIZE: usize = 64;
const ROUNDS: usize = 14;

// SHA-256 initialization vector, shared by BLAKE-256.
const IV: [u32; 8] = [
    0x6a09_e667,
    0xbb67_ae85,
    0x3c6e_f372,
    0xa54f_f53a,
    0x510e_527f,
    0x9b05_688c,
    0x1f83_d9ab,
    0x5be0_cd19,
];

// First digits of pi.
const U: [u32; 16] = [
    0x243f_6a88,
    0x85a3_08d3,
    0x1319_8a2e,
    0x0370_7344,
    0xa409_3822,
    0x299f_31d0,
    0x082e_fa98,
    0xec4e_6c89,
    0x4528_21e6,
    0x38d0_1377,
    0xbe54_66cf,
    0x34e9_0c6c,
    0xc0ac_29b7,
    0xc97c_50dd,
    0x3f84_d5b5,
    0xb547_0917,
];

#[rustfmt::skip]
const SIGMA: [[usize; 16]; 10] = [
    [ 0,  1,  2,  3,  4,  5,  6,  7,  8,  9, 10, 11, 12, 13, 14, 15],
    [14, 10,  4,  8,  9, 15, 13,  6,  1, 12,  0,  2, 11,  7,  5,  3],
    [11,  8, 12,  0,  5,  2, 15, 13, 10, 14,  3,  6,  7,  1,  9,  4],
    [ 7,  9,  3,  1, 13, 12, 11, 14,  2,  6,  5, 10,  4,  0, 15,  8],
    [ 9,  0,  5,  7,  2,  4, 10, 15, 14,  1, 11, 12,  6,  8,  3, 13],
    [ 2, 12,  6, 10,  0, 11,  8,  3,  4, 13,  7,  5, 15, 14,  1,  9],
    [12,  5,  1, 15, 14, 13,  4, 10,  0,  7,  6,  3,  9,  2,  8, 11],
    [13, 11,  7, 14, 12,  1,  3,  9,  5,  0, 15,  4,  8,  6,  2, 10],
    [ 6, 15, 14,  9, 11,  3,  0,  8, 12,  2, 13,  7,  1,  4, 10,  5],
    [10,  2,  8,  4,  7,  6,  1,  5, 15, 11,  9, 14,  3, 12, 13,  0],
];

// (a, b, c, d) state indices for the four column steps followed by the four
// diagonal steps of a round.
const QUARTERS: [(usize, usize, usize, usize); 8] = [
    (0, 4, 8, 12),
    (1, 5, 9, 13),
    (2, 6, 10, 14),
    (3, 7, 11, 15),
    (0, 5, 10, 15),
    (1, 6, 11, 12),
    (2, 7, 8, 13),
    (3, 4, 9, 14),
];

fn g(v: &mut [u32; 16], a: usize, b: usize, c: usize, d: usize, x: u32, y: u32) {
    v[a] = v[a].wrapping_add(v[b]).wrapping_add(x);
    v[d] = (v[d] ^ v[a]).rotate_right(16);
    v[c] = v[c].wrapping_add(v[d]);
    v[b] = (v[b] ^ v[c]).rotate_right(12);
    v[a] = v[a].wrapping_add(v[b]).wrapping_add(y);
    v[d] = (v[d] ^ v[a]).rotate_right(8);
    v[c] = v[c].wrapping_add(v[d]);
    v[b] = (v[b] ^ v[c]).rotate_right(7);
}

pub(crate) struct Blake256 {
    h: [u32; 8],
    buf: [u8; BLOCK_SIZE],
    buf_len: usize,
    /// Message bits compressed so far.
    counter: u64,
}

impl Blake256 {
    /// `counter` is the number of message bits up to and including this
    /// block, or 0 for a block that contains only padding.
    fn compress(h: &mut [u32; 8], block: &[u8; BLOCK_SIZE], counter: u64) {
        let mut m = [0_u32; 16];
        for (i, word) in m.iter_mut().enumerate() {
            *word = u32::from_be_bytes(subarray_copy(block, i * 4));
        }

        let mut v = [0_u32; 16];
        v[..8].copy_from_slice(h);
        v[8..12].copy_from_slice(&U[..4]);
        #[expect(clippy::cast_possible_truncation)]
        let (t0, t1) = (counter as u32, (counter >> 32) as u32);
        v[12] = U[4] ^ t0;
        v[13] = U[5] ^ t0;
        v[14] = U[6] ^ t1;
        v[15] = U[7] ^ t1;

        for round in 0..ROUNDS {
            let s = &SIGMA[round % SIGMA.len()];
            for (i, &(a, b, c, d)) in QUARTERS.iter().enumerate() {
                let x = m[s[2 * i]] ^ U[s[2 * i + 1]];
                let y = m[s[2 * i + 1]] ^ U[s[2 * i]];
                g(&mut v, a, b, c, d, x, y);
            }
        }

        for (i, h_i) in h.iter_mut().enumerate() {
            *h_i ^= v[i] ^ v[i + 8];
        }
    }
}

impl Digest for Blake256 {
    fn new() -> Self {
        Self {
            h: IV,
            buf: [0; BLOCK_SIZE],
            buf_len: 0,
            counter: 0,
        }
    }

    fn update(&mut self, data: impl AsRef<[u8]>) {
        let mut data = data.as_ref();

        if self.buf_len > 0 {
            let take = (BLOCK_SIZE - self.buf_len).min(data.len());
            self.buf[self.buf_len..self.buf_len + take].copy_from_slice(&data[..take]);
            self.buf_len += take;
            data = &data[take..];
            if self.buf_len == BLOCK_SIZE {
                self.counter += 8 * BLOCK_SIZE as u64;
                let block = self.buf;
                Self::compress(&mut self.h, &block, self.counter);
                self.buf_len = 0;
            }
        }

        while data.len() >= BLOCK_SIZE {
            self.counter += 8 * BLOCK_SIZE as u64;
            Self::compress(&mut self.h, &subarray_copy(data, 0), self.counter);
            data = &data[BLOCK_SIZE..];
        }

        if !data.is_empty() {
            self.buf[..data.len()].copy_from_slice(data);
            self.buf_len = data.len();
        }
    }

    fn finalize(mut self) -> [u8; 32] {
        let bit_len = self.counter + 8 * self.buf_len as u64;
        let mut block = [0_u8; BLOCK_SIZE];
        block[..self.buf_len].copy_from_slice(&self.buf[..self.buf_len]);
        block[self.buf_len] = 0x80;

        if self.buf_len <= 55 {
            // Message, 0x80…0x01 padding and the 64-bit length fit in one
            // block (0x80 and 0x01 coincide in the 55-byte case).
            block[55] |= 0x01;
            block[56..].copy_from_slice(&bit_len.to_be_bytes());
            let counter = if self.buf_len == 0 { 0 } else { bit_len };
            Self::compress(&mut self.h, &block, counter);
        } else {
            // No room for the length: close out the message block, then a
            // padding-only block (counter 0) carries the length.
            Self::compress(&mut self.h, &block, bit_len);
            let mut last = [0_u8; BLOCK_SIZE];
            last[55] = 0x01;
            last[56..].copy_from_slice(&bit_len.to_be_bytes());
            Self::compress(&mut self.h, &last, 0);
        }

        let mut out = [0_u8; 32];
        for (i, word) in self.h.iter().enumerate() {
            out[i * 4..(i + 1) * 4].copy_from_slice(&word.to_be_bytes());
        }
        out
    }
}
