//! Element-wise accumulation of a byte buffer into a byte or short buffer.
//!
//! Both variants add every source byte into the matching destination
//! element with wraparound (no saturation):
//!
//! - [`add_byte_to_byte_vector`]: `dst[i] = (dst[i] + src[i]) mod 256`
//! - [`add_byte_to_short_vector`]: `dst[i] = (dst[i] + src[i]) mod 65536`,
//!   with `src[i]` zero-extended
//!
//! The destination is split into an unaligned prefix, a vector-aligned body
//! and a suffix (see [`Segments`]). Prefix and suffix run through the scalar
//! kernel; the body runs through the active [`Backend`] with aligned
//! destination loads and stores and unaligned source loads.
//!
//! # Entry Points
//!
//! | Function | Validation | Backend |
//! |----------|------------|---------|
//! | `add_*_vector` | lengths, alignment | [`Backend::active`] |
//! | `add_*_vector_with` | lengths, alignment, backend support | caller's choice |
//! | `par_add_*_vector` | lengths, alignment | active, across rayon workers |
//! | `add_*_vector_unchecked` | none (`unsafe`) | [`Backend::active`] |
//!
//! # Usage
//!
//! ```rust
//! use simdarith::accumulate::add_byte_to_byte_vector;
//!
//! let src = [1u8; 17];
//! let mut dst = [0u8; 17];
//! add_byte_to_byte_vector(&src, &mut dst).unwrap();
//! assert!(dst.iter().all(|&v| v == 1));
//! ```

use std::slice;

use rayon::prelude::*;

use crate::error::{ensure_element_aligned, ensure_same_len, Result};
use crate::simd::{dispatch_kernel, scalar, Backend, Segments, SimdAccumulate, VectorKernel};

/// Elements per rayon task in the parallel entry points. A multiple of every
/// vector width.
pub const PAR_CHUNK_LEN: usize = 64 * 1024;

// ================================================================================================
// SEGMENTED DRIVERS
// ================================================================================================

/// # Safety
///
/// `K` must be supported by the running CPU.
#[inline(always)]
unsafe fn byte_to_byte_segmented<K: VectorKernel>(src: &[u8], dst: &mut [u8]) -> Segments {
    let seg = Segments::split(dst.as_ptr() as usize, 1, K::WIDTH, K::WIDTH, dst.len());

    scalar::accumulate(&src[seg.prefix_range()], &mut dst[seg.prefix_range()]);

    let body = seg.body_range();
    if !body.is_empty() {
        K::add_u8_body(
            src[body.clone()].as_ptr(),
            dst[body].as_mut_ptr(),
            seg.body,
        );
    }

    scalar::accumulate(&src[seg.suffix_range()], &mut dst[seg.suffix_range()]);

    seg
}

/// # Safety
///
/// `K` must be supported by the running CPU.
#[inline(always)]
unsafe fn byte_to_short_segmented<K: VectorKernel>(src: &[u8], dst: &mut [i16]) -> Segments {
    let seg = Segments::split(
        dst.as_ptr() as usize,
        std::mem::size_of::<i16>(),
        K::WIDTH,
        K::WIDTH,
        dst.len(),
    );

    scalar::accumulate(&src[seg.prefix_range()], &mut dst[seg.prefix_range()]);

    let body = seg.body_range();
    if !body.is_empty() {
        K::add_u8_to_i16_body(
            src[body.clone()].as_ptr(),
            dst[body].as_mut_ptr(),
            seg.body,
        );
    }

    scalar::accumulate(&src[seg.suffix_range()], &mut dst[seg.suffix_range()]);

    seg
}

/// `backend` must be supported and the lengths equal.
#[inline]
fn byte_to_byte(backend: Backend, src: &[u8], dst: &mut [u8]) -> Segments {
    dispatch_kernel!(
        backend,
        K => unsafe { byte_to_byte_segmented::<K>(src, dst) },
        scalar => {
            scalar::accumulate(src, dst);
            Segments::scalar(dst.len())
        },
    )
}

/// `backend` must be supported, the lengths equal and `dst` element aligned.
#[inline]
fn byte_to_short(backend: Backend, src: &[u8], dst: &mut [i16]) -> Segments {
    dispatch_kernel!(
        backend,
        K => unsafe { byte_to_short_segmented::<K>(src, dst) },
        scalar => {
            scalar::accumulate(src, dst);
            Segments::scalar(dst.len())
        },
    )
}

// ================================================================================================
// BYTE + BYTE
// ================================================================================================

/// Adds `src` into `dst` element-wise, modulo 256, with the active backend.
///
/// # Errors
///
/// [`SimdarithError::LengthMismatch`](crate::SimdarithError::LengthMismatch)
/// if the slices differ in length.
pub fn add_byte_to_byte_vector(src: &[u8], dst: &mut [u8]) -> Result<()> {
    add_byte_to_byte_vector_with(Backend::active(), src, dst)
}

/// Same as [`add_byte_to_byte_vector`], with an explicit backend.
///
/// # Errors
///
/// Also fails with `UnsupportedBackend` if the CPU cannot run `backend`.
pub fn add_byte_to_byte_vector_with(backend: Backend, src: &[u8], dst: &mut [u8]) -> Result<()> {
    ensure_same_len(src.len(), dst.len())?;
    let backend = backend.ensure_supported()?;

    let seg = byte_to_byte(backend, src, dst);
    log::trace!("add_byte_to_byte_vector: backend={backend} segments={seg:?}");

    Ok(())
}

/// Parallel [`add_byte_to_byte_vector`]: the buffers are cut into
/// [`PAR_CHUNK_LEN`]-element chunks accumulated on the rayon pool.
pub fn par_add_byte_to_byte_vector(src: &[u8], dst: &mut [u8]) -> Result<()> {
    ensure_same_len(src.len(), dst.len())?;
    let backend = Backend::active();

    dst.par_chunks_mut(PAR_CHUNK_LEN)
        .zip(src.par_chunks(PAR_CHUNK_LEN))
        .for_each(|(dst_chunk, src_chunk)| {
            byte_to_byte(backend, src_chunk, dst_chunk);
        });

    Ok(())
}

/// Adds `count` bytes at `src` into `count` bytes at `dst`, modulo 256.
///
/// This is the raw-pointer surface for callers that hold buffers outside of
/// Rust's ownership model. Nothing is validated.
///
/// # Safety
///
/// When `count > 0`:
/// - `src` must be non-null and valid for `count` byte reads
/// - `dst` must be non-null and valid for `count` byte reads and writes
/// - the two ranges must not overlap, and nothing else may access `dst`
///   for the duration of the call
pub unsafe fn add_byte_to_byte_vector_unchecked(src: *const u8, dst: *mut u8, count: usize) {
    if count == 0 {
        return;
    }

    let src = slice::from_raw_parts(src, count);
    let dst = slice::from_raw_parts_mut(dst, count);

    byte_to_byte(Backend::active(), src, dst);
}

// ================================================================================================
// BYTE + SHORT (WIDENING)
// ================================================================================================

/// Adds every zero-extended byte of `src` into `dst`, modulo 65536, with the
/// active backend.
///
/// # Errors
///
/// - `LengthMismatch` if the slices differ in length
/// - `MisalignedBuffer` if `dst` does not start on a 2-byte boundary
pub fn add_byte_to_short_vector(src: &[u8], dst: &mut [i16]) -> Result<()> {
    add_byte_to_short_vector_with(Backend::active(), src, dst)
}

/// Same as [`add_byte_to_short_vector`], with an explicit backend.
pub fn add_byte_to_short_vector_with(backend: Backend, src: &[u8], dst: &mut [i16]) -> Result<()> {
    ensure_same_len(src.len(), dst.len())?;
    ensure_element_aligned(dst.as_ptr())?;
    let backend = backend.ensure_supported()?;

    let seg = byte_to_short(backend, src, dst);
    log::trace!("add_byte_to_short_vector: backend={backend} segments={seg:?}");

    Ok(())
}

/// Parallel [`add_byte_to_short_vector`].
pub fn par_add_byte_to_short_vector(src: &[u8], dst: &mut [i16]) -> Result<()> {
    ensure_same_len(src.len(), dst.len())?;
    ensure_element_aligned(dst.as_ptr())?;
    let backend = Backend::active();

    dst.par_chunks_mut(PAR_CHUNK_LEN)
        .zip(src.par_chunks(PAR_CHUNK_LEN))
        .for_each(|(dst_chunk, src_chunk)| {
            byte_to_short(backend, src_chunk, dst_chunk);
        });

    Ok(())
}

/// Adds `count` zero-extended bytes at `src` into `count` shorts at `dst`,
/// modulo 65536. Nothing is validated.
///
/// # Safety
///
/// When `count > 0`:
/// - `src` must be non-null and valid for `count` byte reads
/// - `dst` must be non-null, aligned to 2 bytes and valid for `count` short
///   reads and writes
/// - the two ranges must not overlap, and nothing else may access `dst`
///   for the duration of the call
pub unsafe fn add_byte_to_short_vector_unchecked(src: *const u8, dst: *mut i16, count: usize) {
    if count == 0 {
        return;
    }

    let src = slice::from_raw_parts(src, count);
    let dst = slice::from_raw_parts_mut(dst, count);

    byte_to_short(Backend::active(), src, dst);
}

// ================================================================================================
// SLICE TRAITS
// ================================================================================================

impl SimdAccumulate<[u8]> for [u8] {
    #[inline(always)]
    fn simd_accumulate(&mut self, rhs: &[u8]) -> Result<()> {
        add_byte_to_byte_vector(rhs, self)
    }

    #[inline(always)]
    fn par_simd_accumulate(&mut self, rhs: &[u8]) -> Result<()> {
        par_add_byte_to_byte_vector(rhs, self)
    }

    #[inline(always)]
    fn scalar_accumulate(&mut self, rhs: &[u8]) -> Result<()> {
        add_byte_to_byte_vector_with(Backend::Scalar, rhs, self)
    }
}

impl SimdAccumulate<[u8]> for [i16] {
    #[inline(always)]
    fn simd_accumulate(&mut self, rhs: &[u8]) -> Result<()> {
        add_byte_to_short_vector(rhs, self)
    }

    #[inline(always)]
    fn par_simd_accumulate(&mut self, rhs: &[u8]) -> Result<()> {
        par_add_byte_to_short_vector(rhs, self)
    }

    #[inline(always)]
    fn scalar_accumulate(&mut self, rhs: &[u8]) -> Result<()> {
        add_byte_to_short_vector_with(Backend::Scalar, rhs, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::length_mismatch;

    #[test]
    fn test_seventeen_ones_at_every_offset() {
        let mut storage = vec![0u8; 17 + 64];
        for backend in Backend::available() {
            for offset in 0..32 {
                storage.iter_mut().for_each(|v| *v = 0);
                let dst = &mut storage[offset..offset + 17];
                add_byte_to_byte_vector_with(backend, &[1u8; 17], dst).unwrap();
                assert!(
                    dst.iter().all(|&v| v == 1),
                    "backend={backend} offset={offset}: {dst:?}"
                );
                assert!(storage[..offset].iter().all(|&v| v == 0));
                assert!(storage[offset + 17..].iter().all(|&v| v == 0));
            }
        }
    }

    #[test]
    fn test_byte_segments_for_wide_backends() {
        for backend in Backend::available() {
            let mut dst = vec![0u8; 200];
            let seg = byte_to_byte(backend, &[3u8; 200], &mut dst);
            assert_eq!(seg.len(), 200);
            if backend != Backend::Scalar {
                assert_eq!(seg.body % backend.vector_width(), 0);
                assert_eq!((dst.as_ptr() as usize + seg.prefix) % backend.vector_width(), 0);
            }
        }
    }

    #[test]
    fn test_short_segments_align_in_bytes() {
        for backend in Backend::available() {
            let mut dst = vec![0i16; 200];
            let seg = byte_to_short(backend, &[3u8; 199], &mut dst[1..]);
            assert_eq!(seg.len(), 199);
            if seg.body > 0 {
                let body_addr = dst[1..].as_ptr() as usize + seg.prefix * 2;
                assert_eq!(body_addr % backend.vector_width(), 0);
            }
            assert!(dst[1..].iter().all(|&v| v == 3));
            assert_eq!(dst[0], 0);
        }
    }

    #[test]
    fn test_length_mismatch_is_reported() {
        let mut dst = [0u8; 4];
        assert_eq!(
            add_byte_to_byte_vector(&[1u8; 5], &mut dst),
            Err(length_mismatch(5, 4))
        );
        assert_eq!(dst, [0; 4]);

        let mut wide = [0i16; 4];
        assert_eq!(
            add_byte_to_short_vector(&[1u8; 3], &mut wide),
            Err(length_mismatch(3, 4))
        );
    }

    #[test]
    fn test_unchecked_zero_count_accepts_null() {
        unsafe {
            add_byte_to_byte_vector_unchecked(std::ptr::null(), std::ptr::null_mut(), 0);
            add_byte_to_short_vector_unchecked(std::ptr::null(), std::ptr::null_mut(), 0);
        }
    }

    #[test]
    fn test_unchecked_matches_checked() {
        let src: Vec<u8> = (0..100u8).collect();
        let mut a = vec![250u8; 100];
        let mut b = a.clone();
        add_byte_to_byte_vector(&src, &mut a).unwrap();
        unsafe { add_byte_to_byte_vector_unchecked(src.as_ptr(), b.as_mut_ptr(), b.len()) };
        assert_eq!(a, b);
    }
}
