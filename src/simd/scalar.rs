//! Portable scalar kernels.
//!
//! These back the prefix and suffix of every segmented call, and the whole
//! buffer when no vector backend is available. They operate on slices only,
//! so they are alignment-agnostic and never reinterpret bytes as wider words.

use num::traits::WrappingAdd;

/// Manual unroll factor of the scalar accumulation loop.
pub(crate) const BLOCK: usize = 8;

/// Adds every source byte into the matching destination element with
/// wraparound. `D` is the destination element type (`u8` or `i16`); source
/// bytes are zero-extended before the addition.
#[inline]
pub fn accumulate<D>(src: &[u8], dst: &mut [D])
where
    D: WrappingAdd + From<u8> + Copy,
{
    debug_assert_eq!(src.len(), dst.len(), "Vectors must be the same length");

    let mut dst_blocks = dst.chunks_exact_mut(BLOCK);
    let mut src_blocks = src.chunks_exact(BLOCK);

    for (d, s) in (&mut dst_blocks).zip(&mut src_blocks) {
        for k in 0..BLOCK {
            d[k] = WrappingAdd::wrapping_add(&d[k], &D::from(s[k]));
        }
    }

    for (d, &s) in dst_blocks
        .into_remainder()
        .iter_mut()
        .zip(src_blocks.remainder())
    {
        *d = WrappingAdd::wrapping_add(&*d, &D::from(s));
    }
}

/// Writes `base + i` into `out` for every `i` with `src[i] > threshold`.
///
/// `written` is the number of slots of `out` already used; the new count is
/// returned.
#[inline]
pub fn greater_than(
    src: &[i16],
    threshold: i16,
    base: usize,
    out: &mut [usize],
    mut written: usize,
) -> usize {
    for (i, &value) in src.iter().enumerate() {
        if value > threshold {
            out[written] = base + i;
            written += 1;
        }
    }
    written
}

/// Appends the lane indexes of the set bits of `mask` to `out`.
///
/// Bit `k` of `mask` stands for element `base + k`.
#[inline(always)]
pub(crate) fn decode_mask(mut mask: u32, base: usize, out: &mut [usize], mut written: usize) -> usize {
    while mask != 0 {
        let lane = mask.trailing_zeros() as usize;
        out[written] = base + lane;
        written += 1;
        mask &= mask - 1;
    }
    written
}
