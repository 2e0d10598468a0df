//! Three-segment split of a buffer around a vector-aligned body.
//!
//! Every kernel in this crate walks its buffer in the same three steps:
//!
//! 1. an unaligned **prefix**, processed by the scalar path, that ends on the
//!    first address aligned to the backend's vector width;
//! 2. an aligned **body** whose length is a whole number of vector steps,
//!    processed with aligned vector loads and stores;
//! 3. a **suffix** holding whatever does not fill a final step, processed by
//!    the scalar path again.
//!
//! The three ranges partition `0..len` exactly. When the buffer is too short
//! to reach an aligned address, the prefix swallows the whole buffer and the
//! body and suffix are empty.

use std::ops::Range;

/// Element counts of the prefix, body and suffix of one buffer.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Segments {
    /// Elements before the first vector-aligned element.
    pub prefix: usize,
    /// Elements in the aligned, vectorizable middle. A multiple of the step.
    pub body: usize,
    /// Elements left after the body.
    pub suffix: usize,
}

impl Segments {
    /// Splits `len` elements of size `elem_size` starting at byte address `addr`.
    ///
    /// # Arguments
    ///
    /// * `addr` - Address of the first element (of the buffer that drives alignment)
    /// * `elem_size` - Size in bytes of one element of that buffer
    /// * `align` - Vector width in bytes; must be a power of two
    /// * `step` - Elements consumed by one iteration of the vector body
    /// * `len` - Number of elements in the buffer
    ///
    /// `addr` is expected to be a multiple of `elem_size`. Checked entry points
    /// validate this before calling; a remainder would simply be dropped from
    /// the prefix and leave the body misaligned.
    #[inline]
    pub fn split(addr: usize, elem_size: usize, align: usize, step: usize, len: usize) -> Self {
        debug_assert!(align.is_power_of_two(), "alignment must be a power of two");
        debug_assert!(elem_size > 0 && step > 0);
        debug_assert_eq!(addr % elem_size, 0, "address must be element aligned");

        // Bytes until the next aligned address, computed in the native address width.
        let misalignment = addr.wrapping_neg() & (align - 1);
        let prefix = (misalignment / elem_size).min(len);

        let body = (len - prefix) / step * step;
        let suffix = len - prefix - body;

        Segments {
            prefix,
            body,
            suffix,
        }
    }

    /// A split with no vector body, used by the scalar backend.
    #[inline]
    pub const fn scalar(len: usize) -> Self {
        Segments {
            prefix: len,
            body: 0,
            suffix: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.prefix + self.body + self.suffix
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn prefix_range(&self) -> Range<usize> {
        0..self.prefix
    }

    #[inline]
    pub fn body_range(&self) -> Range<usize> {
        self.prefix..self.prefix + self.body
    }

    #[inline]
    pub fn suffix_range(&self) -> Range<usize> {
        self.prefix + self.body..self.len()
    }
}
