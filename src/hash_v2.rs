//! Variant 2 per-iteration extensions: the halfword shuffle of the three
//! sibling cells and the integer division / square-root step.

use crate::{slow_hash::MEMORY_BLOCKS, Variant};

/// The fixed variant 2 permutation. The cells at `offset ^ 0x1`,
/// `offset ^ 0x2` and `offset ^ 0x3` are viewed as 24 consecutive
/// little-endian 16-bit lanes; destination lane `i` takes source lane
/// `SHUFFLE_TABLE[i]`, so the new first cell draws from the old third,
/// the new second from the old first and the new third from the old second.
#[rustfmt::skip]
const SHUFFLE_TABLE: [usize; 24] = [
    18, 22, 19, 23, 16, 17, 20, 21,
     2,  5,  3,  4,  6,  7,  0,  1,
     9, 13,  8, 12, 10, 11, 14, 15,
];

const LANES_PER_CELL: usize = 8;

#[expect(clippy::cast_possible_truncation)]
fn cell_to_lanes(cell: u128) -> [u16; LANES_PER_CELL] {
    let mut lanes = [0_u16; LANES_PER_CELL];
    for (i, lane) in lanes.iter_mut().enumerate() {
        *lane = (cell >> (16 * i)) as u16;
    }
    lanes
}

fn lanes_to_cell(lanes: &[u16]) -> u128 {
    let mut cell = 0_u128;
    for (i, &lane) in lanes.iter().enumerate() {
        cell |= u128::from(lane) << (16 * i);
    }
    cell
}

/// Applies the shuffle around `offset` (a cell index). Sources and
/// destinations are the same three cells, so all 24 lanes are gathered
/// before anything is written back.
pub(crate) fn variant2_shuffle(
    long_state: &mut [u128; MEMORY_BLOCKS],
    offset: usize,
    variant: Variant,
) {
    if variant != Variant::V2 {
        return;
    }

    let cells = [offset ^ 0x1, offset ^ 0x2, offset ^ 0x3];

    let mut lanes = [0_u16; 3 * LANES_PER_CELL];
    for (&cell, lanes) in cells.iter().zip(lanes.chunks_exact_mut(LANES_PER_CELL)) {
        lanes.copy_from_slice(&cell_to_lanes(long_state[cell]));
    }

    let mut shuffled = [0_u16; 3 * LANES_PER_CELL];
    for (dst, &src) in shuffled.iter_mut().zip(&SHUFFLE_TABLE) {
        *dst = lanes[src];
    }

    for (&cell, lanes) in cells.iter().zip(shuffled.chunks_exact(LANES_PER_CELL)) {
        long_state[cell] = lanes_to_cell(lanes);
    }
}

/// The variant 2 arithmetic step. Folds the previous iteration's division
/// and square-root results into the high lane of `c2`, then derives the next
/// pair from `b`:
/// a 64/33-bit division packing quotient and remainder, and the f64 square
/// root of the (at most 48-bit) value `(b.low + division_result) >> 16`.
#[expect(clippy::cast_possible_truncation)]
pub(crate) fn variant2_integer_math(
    c2: &mut u128,
    b: u128,
    division_result: &mut u64,
    sqrt_result: &mut u64,
    variant: Variant,
) {
    const U32_MASK: u64 = u32::MAX as u64;

    if variant != Variant::V2 {
        return;
    }

    *c2 ^= u128::from(*division_result ^ *sqrt_result) << 64;

    let b_low = b as u64;
    let dividend = (b >> 64) as u64;
    let divisor = (b_low & U32_MASK) | 0x8000_0001;
    *division_result = ((dividend / divisor) & U32_MASK) | ((dividend % divisor) << 32);

    *sqrt_result = integer_sqrt_v2(b_low.wrapping_add(*division_result) >> 16);
}

/// Consensus mandates the IEEE-754 double-precision square root, truncated
/// toward zero. The input fits in 48 bits, so the u64→f64 conversion is
/// exact; an arbitrary-precision integer square root would diverge on inputs
/// where the f64 result rounds up across an integer boundary.
#[expect(clippy::cast_possible_truncation, clippy::cast_precision_loss, clippy::cast_sign_loss)]
fn integer_sqrt_v2(input: u64) -> u64 {
    (input as f64).sqrt() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_sqrt_v2() {
        assert_eq!(integer_sqrt_v2(0), 0);
        assert_eq!(integer_sqrt_v2(1), 1);
        assert_eq!(integer_sqrt_v2(3), 1);
        assert_eq!(integer_sqrt_v2(4), 2);
        // Exact power of two vs. one below: the f64 result must truncate,
        // never round up.
        assert_eq!(integer_sqrt_v2(1 << 46), 1 << 23);
        assert_eq!(integer_sqrt_v2((1 << 46) - 1), (1 << 23) - 1);
        // Largest input the loop can produce (48 bits).
        assert_eq!(integer_sqrt_v2(u64::MAX >> 16), (1 << 24) - 1);
    }

    #[test]
    fn test_variant2_integer_math() {
        // Previous results fold into the high lane only.
        let mut c2 = 0_u128;
        let (mut division_result, mut sqrt_result) = (5_u64, 3_u64);
        variant2_integer_math(&mut c2, 0, &mut division_result, &mut sqrt_result, Variant::V2);
        assert_eq!(c2, 6_u128 << 64);
        assert_eq!(division_result, 0);
        assert_eq!(sqrt_result, 0);

        // divisor = 0xFFFF_FFFF, dividend = 2^32: quotient 1, remainder 1.
        let b = (0x1_0000_0000_u128 << 64) | 0xFFFF_FFFF;
        let mut c2 = 0_u128;
        let (mut division_result, mut sqrt_result) = (0_u64, 0_u64);
        variant2_integer_math(&mut c2, b, &mut division_result, &mut sqrt_result, Variant::V2);
        assert_eq!(c2, 0);
        assert_eq!(division_result, 0x1_0000_0001);
        // (0xFFFF_FFFF + 0x1_0000_0001) >> 16 == 0x20000; floor(sqrt) == 362
        assert_eq!(sqrt_result, 362);

        // The sqrt input addition wraps.
        let b = (0x1_0000_0002_u128 << 64) | u128::from(u64::MAX);
        let mut c2 = 0_u128;
        let (mut division_result, mut sqrt_result) = (0_u64, 0_u64);
        variant2_integer_math(&mut c2, b, &mut division_result, &mut sqrt_result, Variant::V2);
        // 0x1_0000_0002 = 1 * 0xFFFF_FFFF + 3
        assert_eq!(division_result, 0x3_0000_0001);
        // (u64::MAX +w 0x3_0000_0001) >> 16 == 0x30000; floor(sqrt) == 443
        assert_eq!(sqrt_result, 443);
    }

    #[test]
    fn integer_math_is_variant2_only() {
        for variant in [Variant::V0, Variant::V1] {
            let mut c2 = 7_u128;
            let (mut division_result, mut sqrt_result) = (5_u64, 3_u64);
            variant2_integer_math(&mut c2, 9, &mut division_result, &mut sqrt_result, variant);
            assert_eq!((c2, division_result, sqrt_result), (7, 5, 3));
        }
    }

    fn patterned_state() -> Vec<u128> {
        // Lane j of cell i holds i * 8 + j so every 16-bit lane is unique
        // within the shuffle neighborhood.
        (0..MEMORY_BLOCKS)
            .map(|i| {
                let lanes: Vec<u16> = (0..LANES_PER_CELL)
                    .map(|j| u16::try_from((i * LANES_PER_CELL + j) & 0xFFFF).unwrap())
                    .collect();
                lanes_to_cell(&lanes)
            })
            .collect()
    }

    #[test]
    fn test_variant2_shuffle() {
        let mut long_state = patterned_state();
        let state: &mut [u128; MEMORY_BLOCKS] =
            crate::util::subarray_mut(&mut long_state, 0);
        let offset = 0x40;

        variant2_shuffle(state, offset, Variant::V2);

        // chunk0 (cell offset^1) lanes were 520..528, chunk1 (offset^2)
        // 528..536, chunk2 (offset^3) 536..544.
        assert_eq!(
            cell_to_lanes(state[offset ^ 0x1]),
            [538, 542, 539, 543, 536, 537, 540, 541]
        );
        assert_eq!(
            cell_to_lanes(state[offset ^ 0x2]),
            [522, 525, 523, 524, 526, 527, 520, 521]
        );
        assert_eq!(
            cell_to_lanes(state[offset ^ 0x3]),
            [529, 533, 528, 532, 530, 531, 534, 535]
        );

        // The addressed cell itself and everything outside the three
        // siblings stay untouched.
        assert_eq!(cell_to_lanes(state[offset]), [512, 513, 514, 515, 516, 517, 518, 519]);
        assert_eq!(state[offset ^ 0x4], patterned_state()[offset ^ 0x4]);
    }

    #[test]
    fn shuffle_is_variant2_only() {
        let mut long_state = patterned_state();
        let expected = long_state.clone();
        let state: &mut [u128; MEMORY_BLOCKS] =
            crate::util::subarray_mut(&mut long_state, 0);

        variant2_shuffle(state, 0x40, Variant::V0);
        variant2_shuffle(state, 0x40, Variant::V1);
        assert_eq!(long_state, expected);
    }
}
