#![doc = include_str!("../README.md")]

mod blake256;
mod cnaes;
mod hash_v2;
mod keccak;
mod slow_hash;
mod util;

pub use slow_hash::Cache;

/// CryptoNight variant selector.
///
/// Only variants 0, 1 and 2 exist at this layer; later CryptoNote forks
/// (variant 4 / CryptoNight-R and friends) are different algorithms and out
/// of scope. Numeric job fields convert via [`TryFrom<u8>`], so an unknown
/// variant is rejected at the boundary instead of silently hashed wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    /// The original CNS008 algorithm.
    V0,
    /// The "v7" tweak variant; needs at least 43 bytes of input.
    V1,
    /// The "v8" variant: sibling-cell shuffle plus a division and square
    /// root each iteration.
    V2,
}

impl TryFrom<u8> for Variant {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Error> {
        match value {
            0 => Ok(Self::V0),
            1 => Ok(Self::V1),
            2 => Ok(Self::V2),
            other => Err(Error::UnknownVariant(other)),
        }
    }
}

/// Caller-visible failures. The hash itself is total: once the
/// preconditions hold, no call path produces an error or a partial digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Variant 1 reads its tweak from input bytes 35..43.
    #[error("variant 1 requires at least 43 input bytes, got {0}")]
    InputTooShort(usize),
    /// Numeric variant outside `{0, 1, 2}`.
    #[error("unknown CryptoNight variant {0}")]
    UnknownVariant(u8),
}

/// One-shot convenience over [`Cache::sum`], allocating a fresh 2 MiB cache
/// for the single call.
///
/// Anything that hashes in a loop (miners, pool share validation) should
/// hold on to a [`Cache`] instead of paying the allocation per hash.
///
/// # Errors
/// [`Error::InputTooShort`] for variant 1 input under 43 bytes.
pub fn sum(data: &[u8], variant: Variant) -> Result<[u8; 32], Error> {
    Cache::new().sum(data, variant)
}
