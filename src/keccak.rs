//! The Keccak-1600 state primitive used by CryptoNight.
//!
//! CryptoNight never truncates Keccak output: both uses below operate on the
//! whole 1600-bit state, serialized as 200 bytes in little-endian lane order.

use digest::Digest as _;

use crate::util::subarray_copy;

pub(crate) const KECCAK1600_BYTE_SIZE: usize = 200;

/// Sponge absorb with rate 136 bytes and the legacy Keccak padding
/// (`0x01 … 0x80`, not SHA-3's `0x06`), returning the full 25-lane state
/// after the final permutation.
pub(crate) fn keccak1600(input: &[u8], out: &mut [u8; KECCAK1600_BYTE_SIZE]) {
    let mut hasher = sha3::Keccak256Full::new();
    hasher.update(input);
    out.copy_from_slice(hasher.finalize().as_ref());
}

/// One Keccak-f[1600] permutation (24 rounds) applied in place to the
/// serialized state.
pub(crate) fn hash_permutation(state_bytes: &mut [u8; KECCAK1600_BYTE_SIZE]) {
    let mut state = [0_u64; 25];
    for (i, lane) in state.iter_mut().enumerate() {
        *lane = u64::from_le_bytes(subarray_copy(state_bytes, i * 8));
    }

    keccak::keccak_p(&mut state, 24);

    for (i, lane) in state.iter().enumerate() {
        state_bytes[i * 8..(i + 1) * 8].copy_from_slice(&lane.to_le_bytes());
    }
}
