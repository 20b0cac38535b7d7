/// Copies `LEN` elements starting at `start` into a fixed-size array.
///
/// # Panics
/// Panics if the source holds fewer than `start + LEN` elements.
#[inline]
pub(crate) fn subarray_copy<T: AsRef<[U]> + ?Sized, U: Copy, const LEN: usize>(
    array: &T,
    start: usize,
) -> [U; LEN] {
    array
        .as_ref()
        .get(start..start + LEN)
        .and_then(|window| window.try_into().ok())
        .expect("subarray out of bounds")
}

/// Borrows `LEN` elements starting at `start` as a mutable fixed-size
/// array; writes through it land in the source.
///
/// # Panics
/// Panics if the source holds fewer than `start + LEN` elements.
#[inline]
pub(crate) fn subarray_mut<T: AsMut<[U]> + ?Sized, U, const LEN: usize>(
    array: &mut T,
    start: usize,
) -> &mut [U; LEN] {
    array
        .as_mut()
        .get_mut(start..start + LEN)
        .and_then(|window| window.try_into().ok())
        .expect("subarray out of bounds")
}

#[cfg(test)]
pub(crate) fn hex_to_array<const N: usize>(hex: &str) -> [u8; N] {
    let mut out = [0_u8; N];
    hex::decode_to_slice(hex, &mut out).expect("valid hex of the exact array size");
    out
}
