//! AVX2 kernels for 256-bit vector operations.
//!
//! This module contains the kernels using Intel's Advanced Vector Extensions 2 (AVX2)
//! instruction set. AVX2 is available on most Intel processors since Haswell (2013)
//! and AMD processors since Excavator (2015).
//!
//! # Architecture Requirements
//!
//! - **CPU Support**: Intel Haswell (2013+) or AMD Excavator (2015+)
//! - **Target Architecture**: x86 or x86_64
//! - **Runtime Detection**: [`crate::simd::Backend::Avx2`] is only dispatched to
//!   after `is_x86_feature_detected!("avx2")` succeeds
//!
//! # Lane Layout
//!
//! AVX2 unpack instructions work inside each 128-bit half, so interleaving a
//! 32-byte load with zero would scramble the element order across halves.
//! The widening add therefore zero-extends each 16-byte half with
//! `_mm256_cvtepu8_epi16`, which keeps elements in memory order.

#[cfg(target_arch = "x86")]
use std::arch::x86::*;

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

use crate::simd::scalar::decode_mask;
use crate::simd::traits::{VectorKernel, SCAN_CHUNK};

/// AVX2 memory alignment requirement in bytes.
pub(crate) const AVX_ALIGNMENT: usize = 32;

/// Bytes in one 128-bit half of an AVX2 register.
const HALF: usize = AVX_ALIGNMENT / 2;

/// Marker type selecting the AVX2 kernels.
#[derive(Copy, Clone, Debug, Default)]
pub struct Avx2;

impl VectorKernel for Avx2 {
    const WIDTH: usize = AVX_ALIGNMENT;

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

#[target_feature(enable = "avx2")]
unsafe fn add_u8_aligned(src: *const u8, dst: *mut u8, len: usize) {
    let mut i = 0;
    while i < len {
        let s = _mm256_loadu_si256(src.add(i) as *const __m256i);
        let d = dst.add(i) as *mut __m256i;
        _mm256_store_si256(d, _mm256_add_epi8(_mm256_load_si256(d), s));
        i += AVX_ALIGNMENT;
    }
}

#[target_feature(enable = "avx2")]
unsafe fn add_u8_to_i16_aligned(src: *const u8, dst: *mut i16, len: usize) {
    let mut i = 0;
    while i < len {
        let low = _mm256_cvtepu8_epi16(_mm_loadu_si128(src.add(i) as *const __m128i));
        let high = _mm256_cvtepu8_epi16(_mm_loadu_si128(src.add(i + HALF) as *const __m128i));

        let d = dst.add(i) as *mut __m256i;
        _mm256_store_si256(d, _mm256_add_epi16(_mm256_load_si256(d), low));
        _mm256_store_si256(d.add(1), _mm256_add_epi16(_mm256_load_si256(d.add(1)), high));

        i += AVX_ALIGNMENT;
    }
}

#[target_feature(enable = "avx2")]
unsafe fn gt_i16_aligned(
    src: *const i16,
    len: usize,
    threshold: i16,
    base: usize,
    out: &mut [usize],
    mut written: usize,
) -> usize {
    let limit = _mm256_set1_epi16(threshold);

    let mut i = 0;
    while i < len {
        let values = _mm256_load_si256(src.add(i) as *const __m256i);
        let greater = _mm256_cmpgt_epi16(values, limit);

        // Pack the two halves to one byte per element, in memory order.
        let packed = _mm_packs_epi16(
            _mm256_castsi256_si128(greater),
            _mm256_extracti128_si256::<1>(greater),
        );
        let mask = _mm_movemask_epi8(packed) as u32;

        written = decode_mask(mask, base + i, out, written);
        i += SCAN_CHUNK;
    }

    written
}
