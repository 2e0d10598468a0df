//! ARM NEON kernels for 128-bit vector operations.
//!
//! NEON is mandatory on AArch64, which covers Apple Silicon, AWS Graviton and
//! modern mobile devices. NEON has no byte `movemask`, so the threshold scan
//! builds its per-element bit mask by weighting each comparison byte with its
//! bit value and summing each half horizontally.

use std::arch::aarch64::*;

use crate::simd::scalar::decode_mask;
use crate::simd::traits::{VectorKernel, SCAN_CHUNK};

/// NEON memory alignment requirement in bytes.
pub(crate) const NEON_ALIGNMENT: usize = 16;

const I16_LANES: usize = NEON_ALIGNMENT / 2;

const BIT_WEIGHTS: [u8; 16] = [1, 2, 4, 8, 16, 32, 64, 128, 1, 2, 4, 8, 16, 32, 64, 128];

/// Marker type selecting the NEON kernels.
#[derive(Copy, Clone, Debug, Default)]
pub struct Neon;

impl VectorKernel for Neon {
    const WIDTH: usize = NEON_ALIGNMENT;

    #[inline(always)]
    unsafe fn add_u8_body(src: *const u8, dst: *mut u8, len: usize) {
        add_u8_aligned(src, dst, len)
    }

    #[inline(always)]
    unsafe fn add_u8_to_i16_body(src: *const u8, dst: *mut i16, len: usize) {
        add_u8_to_i16_aligned(src, dst, len)
    }

    #[inline(always)]
    unsafe fn gt_i16_body(
        src: *const i16,
        len: usize,
        threshold: i16,
        base: usize,
        out: &mut [usize],
        written: usize,
    ) -> usize {
        gt_i16_aligned(src, len, threshold, base, out, written)
    }
}

#[target_feature(enable = "neon")]
unsafe fn add_u8_aligned(src: *const u8, dst: *mut u8, len: usize) {
    let mut i = 0;
    while i < len {
        let s = vld1q_u8(src.add(i));
        let d = dst.add(i);
        vst1q_u8(d, vaddq_u8(vld1q_u8(d), s));
        i += NEON_ALIGNMENT;
    }
}

#[target_feature(enable = "neon")]
unsafe fn add_u8_to_i16_aligned(src: *const u8, dst: *mut i16, len: usize) {
    let mut i = 0;
    while i < len {
        let s = vld1q_u8(src.add(i));
        let low = vreinterpretq_s16_u16(vmovl_u8(vget_low_u8(s)));
        let high = vreinterpretq_s16_u16(vmovl_high_u8(s));

        let d = dst.add(i);
        vst1q_s16(d, vaddq_s16(vld1q_s16(d), low));
        vst1q_s16(d.add(I16_LANES), vaddq_s16(vld1q_s16(d.add(I16_LANES)), high));

        i += NEON_ALIGNMENT;
    }
}

#[target_feature(enable = "neon")]
unsafe fn gt_i16_aligned(
    src: *const i16,
    len: usize,
    threshold: i16,
    base: usize,
    out: &mut [usize],
    mut written: usize,
) -> usize {
    let limit = vdupq_n_s16(threshold);
    let weights = vld1q_u8(BIT_WEIGHTS.as_ptr());

    let mut i = 0;
    while i < len {
        let low = vcgtq_s16(vld1q_s16(src.add(i)), limit);
        let high = vcgtq_s16(vld1q_s16(src.add(i + I16_LANES)), limit);

        let bytes = vcombine_u8(vmovn_u16(low), vmovn_u16(high));
        let bits = vandq_u8(bytes, weights);
        let mask = vaddv_u8(vget_low_u8(bits)) as u32 | (vaddv_u8(vget_high_u8(bits)) as u32) << 8;

        written = decode_mask(mask, base + i, out, written);
        i += SCAN_CHUNK;
    }

    written
}
