//! Threshold scan over 16-bit buffers.
//!
//! Reports every position `i` of a source buffer with `source[i] > threshold`
//! (signed comparison).
//!
//! # Output Format
//!
//! Results are a **dense, strictly ascending list of indexes** written to the
//! front of a caller-supplied `usize` buffer; the functions return how many
//! indexes were written. The output must have room for one index per source
//! element, which is the worst case.
//!
//! # Algorithm
//!
//! The source is split like the accumulator buffers (see [`Segments`]), with a
//! body step of [`SCAN_CHUNK`] elements. Each body chunk is compared lane-wise
//! against a broadcast threshold, narrowed to one bit per element and decoded
//! with a `trailing_zeros` loop. The unaligned prefix and the tail shorter than
//! one chunk are scanned by the scalar path, so no read goes past the end of
//! the source.
//!
//! ```rust
//! use simdarith::threshold::indexes_greater_than;
//!
//! assert_eq!(indexes_greater_than(&[10, 5, 4, -1, 0, 0, 0, 0], 5), vec![0]);
//! ```

use std::slice;

use crate::error::{ensure_element_aligned, output_too_small, Result};
use crate::simd::{dispatch_kernel, scalar, Backend, Segments, SimdThreshold, VectorKernel, SCAN_CHUNK};

/// # Safety
///
/// `K` must be supported by the running CPU and `out.len() >= src.len()`.
#[inline(always)]
unsafe fn scan_segmented<K: VectorKernel>(src: &[i16], threshold: i16, out: &mut [usize]) -> (usize, Segments) {
    let seg = Segments::split(
        src.as_ptr() as usize,
        std::mem::size_of::<i16>(),
        K::WIDTH,
        SCAN_CHUNK,
        src.len(),
    );

    let prefix = seg.prefix_range();
    let mut written = scalar::greater_than(&src[prefix], threshold, 0, out, 0);

    let body = seg.body_range();
    if !body.is_empty() {
        written = K::gt_i16_body(src[body.clone()].as_ptr(), seg.body, threshold, body.start, out, written);
    }

    let suffix = seg.suffix_range();
    let base = suffix.start;
    written = scalar::greater_than(&src[suffix], threshold, base, out, written);

    (written, seg)
}

/// `backend` must be supported and `out.len() >= src.len()`.
#[inline]
fn scan(backend: Backend, src: &[i16], threshold: i16, out: &mut [usize]) -> (usize, Segments) {
    dispatch_kernel!(
        backend,
        K => unsafe { scan_segmented::<K>(src, threshold, out) },
        scalar => (
            scalar::greater_than(src, threshold, 0, out, 0),
            Segments::scalar(src.len()),
        ),
    )
}

/// Writes the indexes of all elements of `source` greater than `threshold`
/// to the front of `output` and returns their count, with the active backend.
///
/// # Errors
///
/// - `OutputTooSmall` if `output.len() < source.len()`
/// - `MisalignedBuffer` if `source` does not start on a 2-byte boundary
pub fn find_indexes_greater_than(source: &[i16], threshold: i16, output: &mut [usize]) -> Result<usize> {
    find_indexes_greater_than_with(Backend::active(), source, threshold, output)
}

/// Same as [`find_indexes_greater_than`], with an explicit backend.
pub fn find_indexes_greater_than_with(
    backend: Backend,
    source: &[i16],
    threshold: i16,
    output: &mut [usize],
) -> Result<usize> {
    if output.len() < source.len() {
        return Err(output_too_small(source.len(), output.len()));
    }
    ensure_element_aligned(source.as_ptr())?;
    let backend = backend.ensure_supported()?;

    let (count, seg) = scan(backend, source, threshold, output);
    log::trace!("find_indexes_greater_than: backend={backend} segments={seg:?} matches={count}");

    Ok(count)
}

/// Allocating form of [`find_indexes_greater_than`].
pub fn indexes_greater_than(source: &[i16], threshold: i16) -> Vec<usize> {
    indexes_greater_than_with(Backend::active(), source, threshold)
}

fn indexes_greater_than_with(backend: Backend, source: &[i16], threshold: i16) -> Vec<usize> {
    let mut output = vec![0usize; source.len()];
    let (count, _) = scan(backend, source, threshold, &mut output);
    output.truncate(count);
    output
}

/// Raw-pointer form of [`find_indexes_greater_than`]. Nothing is validated.
///
/// # Safety
///
/// When `count > 0`:
/// - `source` must be non-null, aligned to 2 bytes and valid for `count` reads
/// - `output` must be non-null, aligned for `usize` and valid for `count` writes
/// - the two ranges must not overlap
pub unsafe fn find_indexes_greater_than_unchecked(
    source: *const i16,
    count: usize,
    threshold: i16,
    output: *mut usize,
) -> usize {
    if count == 0 {
        return 0;
    }

    let source = slice::from_raw_parts(source, count);
    let output = slice::from_raw_parts_mut(output, count);

    scan(Backend::active(), source, threshold, output).0
}

impl SimdThreshold<i16> for [i16] {
    #[inline(always)]
    fn simd_indexes_greater_than(&self, threshold: i16) -> Vec<usize> {
        indexes_greater_than(self, threshold)
    }

    #[inline(always)]
    fn scalar_indexes_greater_than(&self, threshold: i16) -> Vec<usize> {
        indexes_greater_than_with(Backend::Scalar, self, threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::output_too_small;

    #[test]
    fn test_single_match_scenario() {
        let source = [10i16, 5, 4, -1, 0, 0, 0, 0];
        for backend in Backend::available() {
            let mut out = [usize::MAX; 8];
            let n = find_indexes_greater_than_with(backend, &source, 5, &mut out).unwrap();
            assert_eq!(&out[..n], &[0], "backend={backend}");
        }
    }

    #[test]
    fn test_single_element_source() {
        for backend in Backend::available() {
            let mut out = [usize::MAX; 1];
            assert_eq!(find_indexes_greater_than_with(backend, &[7], 6, &mut out), Ok(1));
            assert_eq!(out, [0]);
            assert_eq!(find_indexes_greater_than_with(backend, &[6], 6, &mut out), Ok(0));
        }
    }

    #[test]
    fn test_output_capacity_is_checked() {
        let mut out = [0usize; 3];
        assert_eq!(
            find_indexes_greater_than(&[1, 2, 3, 4], 0, &mut out),
            Err(output_too_small(4, 3))
        );
    }

    #[test]
    fn test_empty_source() {
        let mut out: [usize; 0] = [];
        assert_eq!(find_indexes_greater_than(&[], 0, &mut out), Ok(0));
        assert!(indexes_greater_than(&[], i16::MIN).is_empty());
        assert_eq!(unsafe { find_indexes_greater_than_unchecked(std::ptr::null(), 0, 0, std::ptr::null_mut()) }, 0);
    }

    #[test]
    fn test_chunk_boundaries_and_extremes() {
        let source: Vec<i16> = (0..100).map(|i| if i % 17 == 0 { i16::MAX } else { i16::MIN }).collect();
        let expected: Vec<usize> = (0..100).filter(|i| i % 17 == 0).collect();

        for backend in Backend::available() {
            for start in 0..20 {
                let slice = &source[start..];
                let mut out = vec![0usize; slice.len()];
                let n = find_indexes_greater_than_with(backend, slice, 0, &mut out).unwrap();
                let shifted: Vec<usize> = expected.iter().filter(|&&i| i >= start).map(|i| i - start).collect();
                assert_eq!(&out[..n], shifted.as_slice(), "backend={backend} start={start}");
            }
        }
    }
}
