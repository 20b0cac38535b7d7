//! The CryptoNight pipeline: Keccak absorb, scratchpad initialization, the
//! memory-hard loop and finalization, driven through a reusable [`Cache`].

use digest::Digest as _;
use groestl::Groestl256;
use jh::Jh256;
use skein::{consts::U32, Skein512};

use crate::{
    blake256::{Blake256, Digest as _},
    cnaes::{self, AES_BLOCK_SIZE, CN_AES_KEY_SIZE},
    hash_v2::{variant2_integer_math, variant2_shuffle},
    keccak::{hash_permutation, keccak1600, KECCAK1600_BYTE_SIZE},
    util::{subarray_copy, subarray_mut},
    Error, Variant,
};

/// 2 MiB of scratch memory.
pub(crate) const MEMORY: usize = 1 << 21;
/// The scratchpad as 16-byte cells.
pub(crate) const MEMORY_BLOCKS: usize = MEMORY / AES_BLOCK_SIZE;

const ITERATIONS: usize = 1 << 19;
const INIT_BLOCKS: usize = 8;
/// The blocks buffer lives at state bytes 64..192.
const INIT_OFFSET: usize = 64;
const INIT_SIZE: usize = INIT_BLOCKS * AES_BLOCK_SIZE;

/// Variant 1 folds input bytes 35..43 into its tweak, hence its minimum
/// input length.
pub(crate) const V1_MIN_INPUT_LEN: usize = 43;
const V1_TWEAK_INPUT_OFFSET: usize = 35;

/// Reusable CryptoNight hashing state: the 200-byte Keccak-1600 state and
/// the 2 MiB scratchpad, together a bit over 2,097,352 bytes.
///
/// Both buffers are fully overwritten by every [`Cache::sum`] call, so a
/// cache carries no data between calls and can be handed from job to job
/// freely. Hashing takes `&mut self`: one cache supports one hash at a
/// time, and concurrent hashing wants one cache per worker (or an external
/// pool returning caches only after the call completes).
pub struct Cache {
    /// 25-lane Keccak-1600 state, serialized in little-endian lane order.
    final_state: [u8; KECCAK1600_BYTE_SIZE],
    /// Heap-backed so the cache itself stays cheap to move; always exactly
    /// [`MEMORY_BLOCKS`] cells.
    scratchpad: Vec<u128>,
}

impl Default for Cache {
    fn default() -> Self {
        Self::new()
    }
}

impl Cache {
    /// Creates a ready-to-use cache, allocating the full scratchpad up
    /// front. Caches are intended to be long-lived; see [`crate::sum`] for
    /// the one-shot form.
    #[must_use]
    pub fn new() -> Self {
        Self {
            final_state: [0; KECCAK1600_BYTE_SIZE],
            scratchpad: vec![0; MEMORY_BLOCKS],
        }
    }

    /// Computes the CryptoNight digest of `data` under `variant`.
    ///
    /// # Errors
    /// [`Error::InputTooShort`] for variant 1 input under 43 bytes; no
    /// digest is produced in that case.
    #[expect(clippy::cast_possible_truncation)]
    pub fn sum(&mut self, data: &[u8], variant: Variant) -> Result<[u8; 32], Error> {
        keccak1600(data, &mut self.final_state);

        let tweak = variant1_init(&self.final_state, data, variant)?;
        let (mut division_result, mut sqrt_result) = (0_u64, 0_u64);

        // Scratchpad initialization: iterated AES over the blocks drawn
        // from state bytes 64..192, keyed by the first half of the state.
        let expanded_key = cnaes::key_extend(&self.aes_key0());
        let mut blocks = self.init_blocks();

        let k = self.k();
        let mut a = k[0] ^ k[2];
        let mut b = k[1] ^ k[3];

        let long_state: &mut [u128; MEMORY_BLOCKS] = subarray_mut(&mut self.scratchpad, 0);
        for (i, cell) in long_state.iter_mut().enumerate() {
            let block = &mut blocks[i % INIT_BLOCKS];
            *block = cnaes::aesb_pseudo_round(*block, &expanded_key);
            *cell = *block;
        }

        for _ in 0..ITERATIONS {
            /* Dependency chain per iteration:
             *   address <- a -> read cell -> AES(a) -> writeback
             *   address <- b -> read cell -> MUL -> writeback
             */
            let addr = to_scratchpad_address(a);
            let mut c = long_state[addr];
            cnaes::aesb_single_round(&mut c, a);
            variant2_shuffle(long_state, addr, variant);
            long_state[addr] = b ^ c;
            variant1_1(&mut long_state[addr], variant);
            b = c;

            let addr = to_scratchpad_address(b);
            let mut c2 = long_state[addr];
            variant2_integer_math(&mut c2, b, &mut division_result, &mut sqrt_result, variant);
            let product = mul(b as u64, c2 as u64);
            variant2_shuffle(long_state, addr, variant);
            a = sum_half_blocks(a, product);
            long_state[addr] = a;
            a ^= c2;
            // Variant 1: the stored cell's high lane absorbs the tweak
            // scalar, the accumulator does not.
            if variant == Variant::V1 {
                long_state[addr] ^= u128::from(tweak) << 64;
            }
        }

        // Finalization: fold the whole scratchpad back through AES keyed by
        // the second half of the state, splice the result into the state,
        // permute once more and hand off to a finalist.
        let expanded_key = cnaes::key_extend(&self.aes_key1());
        let mut blocks = self.init_blocks();
        for (i, cell) in self.scratchpad.iter().enumerate() {
            let block = &mut blocks[i % INIT_BLOCKS];
            *block = cnaes::aesb_pseudo_round(*block ^ *cell, &expanded_key);
        }
        self.set_init_blocks(&blocks);

        hash_permutation(&mut self.final_state);

        Ok(extra_hashes(&self.final_state))
    }

    /// State bytes 0..64 as four 128-bit values; XORed pairwise they seed
    /// the loop accumulators.
    fn k(&self) -> [u128; 4] {
        let mut k = [0_u128; 4];
        for (i, k_i) in k.iter_mut().enumerate() {
            *k_i = u128::from_le_bytes(subarray_copy(&self.final_state, i * AES_BLOCK_SIZE));
        }
        k
    }

    fn aes_key0(&self) -> [u8; CN_AES_KEY_SIZE] {
        subarray_copy(&self.final_state, 0)
    }

    fn aes_key1(&self) -> [u8; CN_AES_KEY_SIZE] {
        subarray_copy(&self.final_state, CN_AES_KEY_SIZE)
    }

    /// The eight-cell buffer both scratchpad passes start from.
    fn init_blocks(&self) -> [u128; INIT_BLOCKS] {
        let mut blocks = [0_u128; INIT_BLOCKS];
        let bytes = &self.final_state[INIT_OFFSET..INIT_OFFSET + INIT_SIZE];
        for (block, chunk) in blocks.iter_mut().zip(bytes.chunks_exact(AES_BLOCK_SIZE)) {
            *block = u128::from_le_bytes(chunk.try_into().unwrap());
        }
        blocks
    }

    fn set_init_blocks(&mut self, blocks: &[u128; INIT_BLOCKS]) {
        let bytes = &mut self.final_state[INIT_OFFSET..INIT_OFFSET + INIT_SIZE];
        for (chunk, block) in bytes.chunks_exact_mut(AES_BLOCK_SIZE).zip(blocks) {
            chunk.copy_from_slice(&block.to_le_bytes());
        }
    }
}

/// Derives a scratchpad cell index from the low 64 bits of `v`: bits 4..21,
/// i.e. the low 21 bits aligned down to the 16-byte cell size. Always in
/// `[0, MEMORY_BLOCKS)`.
#[inline]
#[expect(clippy::cast_possible_truncation)]
const fn to_scratchpad_address(v: u128) -> usize {
    const MASK: u64 = (MEMORY_BLOCKS - 1) as u64;
    ((v as u64 / AES_BLOCK_SIZE as u64) & MASK) as usize
}

/// 64×64→128 multiply with the halves stored swapped: the high part in the
/// low lane and vice versa, matching how the loop folds the product into
/// the accumulator lanes. A 64-bit rotation of the wide product is exactly
/// that swap.
fn mul(x: u64, y: u64) -> u128 {
    (u128::from(x) * u128::from(y)).rotate_left(64)
}

/// Adds two 128-bit values as independent wrapping 64-bit lanes; no carry
/// crosses the middle.
#[expect(clippy::cast_possible_truncation)]
fn sum_half_blocks(a: u128, b: u128) -> u128 {
    let sum_low = (a as u64).wrapping_add(b as u64);
    let sum_high = ((a >> 64) as u64).wrapping_add((b >> 64) as u64);

    (u128::from(sum_high) << 64) | u128::from(sum_low)
}

/// The variant 1 tweak scalar: state lane 24 XOR input bytes 35..43.
fn variant1_init(
    state: &[u8; KECCAK1600_BYTE_SIZE],
    data: &[u8],
    variant: Variant,
) -> Result<u64, Error> {
    if variant != Variant::V1 {
        return Ok(0);
    }
    if data.len() < V1_MIN_INPUT_LEN {
        return Err(Error::InputTooShort(data.len()));
    }

    let mut tweak = u64::from_le_bytes(subarray_copy(state, 24 * 8));
    tweak ^= u64::from_le_bytes(subarray_copy(data, V1_TWEAK_INPUT_OFFSET));

    Ok(tweak)
}

/// Variant 1 tweak of the just-written cell: bits 4..6 of stored byte 11
/// flip as a function of bits 0, 4 and 5 of that byte.
///
/// Byte 11 sits 24 bits into the high lane, so the whole computation runs
/// on the shifted-down lane; only a two-bit XOR mask comes back out of it.
#[expect(clippy::cast_possible_truncation)]
fn variant1_1(cell: &mut u128, variant: Variant) {
    if variant != Variant::V1 {
        return;
    }

    let t = ((*cell >> 64) as u64) >> 24;
    let inv_bit0 = (!t) & 1;
    let flips = (inv_bit0 << 4) | (((inv_bit0 << 4) & t) << 1) | ((t & 32) >> 1);
    *cell ^= u128::from(flips << 24) << 64;
}

/// Hands the 200-byte state to the finalist selected by its two low bits.
fn extra_hashes(state_bytes: &[u8; KECCAK1600_BYTE_SIZE]) -> [u8; 32] {
    let finalists: [fn(&[u8]) -> [u8; 32]; 4] = [
        |bytes| Blake256::digest(bytes),
        |bytes| Groestl256::digest(bytes).into(),
        |bytes| Jh256::digest(bytes).into(),
        |bytes| Skein512::<U32>::digest(bytes).into(),
    ];
    finalists[usize::from(state_bytes[0] & 0x3)](state_bytes)
}
