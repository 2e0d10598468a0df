//! SSE2 kernels for 128-bit vector operations.
//!
//! SSE2 is part of the x86_64 baseline, so this backend is available on every
//! 64-bit x86 processor and on most 32-bit ones.
//!
//! # Performance Characteristics
//!
//! - **Vector Width**: 128 bits (16 × u8, 8 × i16)
//! - **Memory Alignment**: the destination body is 16-byte aligned, so
//!   destination loads and stores use the aligned forms; source loads are unaligned

#[cfg(target_arch = "x86")]
use std::arch::x86::*;

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

use crate::simd::scalar::decode_mask;
use crate::simd::traits::{VectorKernel, SCAN_CHUNK};

/// SSE memory alignment requirement in bytes.
pub(crate) const SSE_ALIGNMENT: usize = 16;

/// Number of i16 lanes in one SSE register.
const I16_LANES: usize = SSE_ALIGNMENT / 2;

/// Marker type selecting the SSE2 kernels.
#[derive(Copy, Clone, Debug, Default)]
pub struct Sse2;

impl VectorKernel for Sse2 {
    const WIDTH: usize = SSE_ALIGNMENT;

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

#[target_feature(enable = "sse2")]
unsafe fn add_u8_aligned(src: *const u8, dst: *mut u8, len: usize) {
    let mut i = 0;
    while i < len {
        let s = _mm_loadu_si128(src.add(i) as *const __m128i);
        let d = dst.add(i) as *mut __m128i;
        _mm_store_si128(d, _mm_add_epi8(_mm_load_si128(d), s));
        i += SSE_ALIGNMENT;
    }
}

#[target_feature(enable = "sse2")]
unsafe fn add_u8_to_i16_aligned(src: *const u8, dst: *mut i16, len: usize) {
    let zero = _mm_setzero_si128();

    let mut i = 0;
    while i < len {
        let s = _mm_loadu_si128(src.add(i) as *const __m128i);

        // zero-extend the 16 bytes into two vectors of 8 shorts
        let low = _mm_unpacklo_epi8(s, zero);
        let high = _mm_unpackhi_epi8(s, zero);

        let d = dst.add(i) as *mut __m128i;
        _mm_store_si128(d, _mm_add_epi16(_mm_load_si128(d), low));
        _mm_store_si128(d.add(1), _mm_add_epi16(_mm_load_si128(d.add(1)), high));

        i += SSE_ALIGNMENT;
    }
}

#[target_feature(enable = "sse2")]
unsafe fn gt_i16_aligned(
    src: *const i16,
    len: usize,
    threshold: i16,
    base: usize,
    out: &mut [usize],
    mut written: usize,
) -> usize {
    let limit = _mm_set1_epi16(threshold);

    let mut i = 0;
    while i < len {
        let low = _mm_load_si128(src.add(i) as *const __m128i);
        let high = _mm_load_si128(src.add(i + I16_LANES) as *const __m128i);

        // Narrow the 0 / -1 lanes to bytes so the byte mask has one bit per element.
        let packed = _mm_packs_epi16(_mm_cmpgt_epi16(low, limit), _mm_cmpgt_epi16(high, limit));
        let mask = _mm_movemask_epi8(packed) as u32;

        written = decode_mask(mask, base + i, out, written);
        i += SCAN_CHUNK;
    }

    written
}
