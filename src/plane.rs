//! Accumulation of whole 2-D planes held in `ndarray` views.
//!
//! Template-matching pipelines keep their response maps as row-major planes,
//! often as windows into larger images whose rows are not adjacent in memory.
//! These helpers route contiguous planes to a single accumulator call and
//! walk strided planes row by row, so callers never have to reason about
//! strides themselves.
//!
//! # Shifted accumulation
//!
//! [`add_plane_to_plane`] reads the source as its row-major flattening
//! starting at `(row, col)`: destination element `k` (in row-major order)
//! receives source element `k + row * width + col`, for every `k` whose
//! source element exists. Destination elements past the end of the source
//! are left untouched. Contiguous and strided planes give identical results.

use ndarray::{s, ArrayView1, ArrayView2, ArrayViewMut1, ArrayViewMut2};

use crate::accumulate::{add_byte_to_byte_vector, add_byte_to_short_vector};
use crate::error::{validation_error, Result};

fn ensure_same_shape(src: (usize, usize), dst: (usize, usize)) -> Result<()> {
    if src != dst {
        return Err(validation_error(format!(
            "plane shapes differ: source is {}x{}, destination is {}x{}",
            src.0, src.1, dst.0, dst.1
        )));
    }
    Ok(())
}

fn add_row(src: ArrayView1<u8>, mut dst: ArrayViewMut1<u8>) -> Result<()> {
    if let (Some(s), Some(d)) = (src.as_slice(), dst.as_slice_mut()) {
        return add_byte_to_byte_vector(s, d);
    }

    for (d, &s) in dst.iter_mut().zip(src.iter()) {
        *d = d.wrapping_add(s);
    }
    Ok(())
}

fn add_wide_row(src: ArrayView1<u8>, mut dst: ArrayViewMut1<i16>) -> Result<()> {
    if let (Some(s), Some(d)) = (src.as_slice(), dst.as_slice_mut()) {
        return add_byte_to_short_vector(s, d);
    }

    for (d, &s) in dst.iter_mut().zip(src.iter()) {
        *d = d.wrapping_add(i16::from(s));
    }
    Ok(())
}

/// Adds the 8-bit plane `src`, shifted by `offset = (row, col)`, into the
/// 8-bit plane `dst`, modulo 256.
///
/// # Errors
///
/// - `ValidationError` if the shapes differ or `offset` lies outside the plane
///   (only `(0, 0)` is accepted for an empty plane)
pub fn add_plane_to_plane(
    src: ArrayView2<u8>,
    mut dst: ArrayViewMut2<u8>,
    offset: (usize, usize),
) -> Result<()> {
    ensure_same_shape(src.dim(), dst.dim())?;

    let (height, width) = src.dim();
    let (row, col) = offset;

    if height == 0 || width == 0 {
        return match offset {
            (0, 0) => Ok(()),
            _ => Err(validation_error(format!(
                "offset ({row}, {col}) is outside an empty plane"
            ))),
        };
    }
    if row >= height || col >= width {
        return Err(validation_error(format!(
            "offset ({row}, {col}) is outside a {height}x{width} plane"
        )));
    }

    let start = row * width + col;
    let count = height * width - start;

    if let (Some(s), Some(d)) = (src.as_slice(), dst.as_slice_mut()) {
        return add_byte_to_byte_vector(&s[start..], &mut d[..count]);
    }

    for (r, mut dst_row) in dst.rows_mut().into_iter().enumerate() {
        let row_start = r * width;
        if row_start >= count {
            break;
        }
        let row_end = (row_start + width).min(count);

        // One destination row draws from at most two source rows.
        let mut k = row_start;
        while k < row_end {
            let (src_r, src_c) = ((k + start) / width, (k + start) % width);
            let n = (width - src_c).min(row_end - k);

            let local = k - row_start;
            add_row(
                src.slice(s![src_r, src_c..src_c + n]),
                dst_row.slice_mut(s![local..local + n]),
            )?;

            k += n;
        }
    }

    Ok(())
}

/// Adds the 8-bit plane `src` into the 16-bit plane `dst` element-wise,
/// zero-extending each byte, modulo 65536.
///
/// # Errors
///
/// `ValidationError` if the shapes differ.
pub fn add_plane_to_wide_plane(src: ArrayView2<u8>, mut dst: ArrayViewMut2<i16>) -> Result<()> {
    ensure_same_shape(src.dim(), dst.dim())?;

    if let (Some(s), Some(d)) = (src.as_slice(), dst.as_slice_mut()) {
        return add_byte_to_short_vector(s, d);
    }

    for (src_row, dst_row) in src.rows().into_iter().zip(dst.rows_mut()) {
        add_wide_row(src_row, dst_row)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn test_shape_mismatch() {
        let src = Array2::<u8>::zeros((2, 3));
        let mut dst = Array2::<u8>::zeros((3, 2));
        assert!(add_plane_to_plane(src.view(), dst.view_mut(), (0, 0)).is_err());

        let mut wide = Array2::<i16>::zeros((3, 2));
        assert!(add_plane_to_wide_plane(src.view(), wide.view_mut()).is_err());
    }

    #[test]
    fn test_offset_outside_plane() {
        let src = Array2::<u8>::ones((2, 3));
        let mut dst = Array2::<u8>::zeros((2, 3));
        assert!(add_plane_to_plane(src.view(), dst.view_mut(), (2, 0)).is_err());
        assert!(add_plane_to_plane(src.view(), dst.view_mut(), (0, 3)).is_err());
        assert!(dst.iter().all(|&v| v == 0));
    }

    #[test]
    fn test_empty_plane() {
        let src = Array2::<u8>::zeros((0, 4));
        let mut dst = Array2::<u8>::zeros((0, 4));
        assert!(add_plane_to_plane(src.view(), dst.view_mut(), (0, 0)).is_ok());
        assert!(add_plane_to_plane(src.view(), dst.view_mut(), (0, 1)).is_err());
    }

    #[test]
    fn test_contiguous_shift() {
        let src = Array2::from_shape_vec((2, 3), vec![1u8, 2, 3, 4, 5, 6]).unwrap();
        let mut dst = Array2::<u8>::zeros((2, 3));
        add_plane_to_plane(src.view(), dst.view_mut(), (0, 2)).unwrap();
        assert_eq!(dst.as_slice().unwrap(), &[3, 4, 5, 6, 0, 0]);
    }
}
