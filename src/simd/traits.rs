use crate::error::Result;

/// Number of 16-bit elements compared per threshold-scan step, on every backend.
pub const SCAN_CHUNK: usize = 16;

/// Uniform interface over one vector instruction set.
///
/// Each method processes only the aligned body of a segmented call; the
/// scalar prefix and suffix are handled by the generic drivers in
/// [`crate::accumulate`] and [`crate::threshold`].
pub trait VectorKernel {
    /// Vector register width in bytes. Body pointers are aligned to it.
    const WIDTH: usize;

    /// Adds `len` source bytes into `len` destination bytes with wraparound.
    ///
    /// # Safety
    ///
    /// The backend must be supported by the running CPU, `src` must be valid
    /// for `len` reads, `dst` valid for `len` reads and writes and aligned to
    /// [`Self::WIDTH`], and `len` a multiple of [`Self::WIDTH`].
    unsafe fn add_u8_body(src: *const u8, dst: *mut u8, len: usize);

    /// Adds `len` zero-extended source bytes into `len` destination shorts
    /// with wraparound.
    ///
    /// # Safety
    ///
    /// Same as [`Self::add_u8_body`], with `dst` valid for `len` shorts.
    unsafe fn add_u8_to_i16_body(src: *const u8, dst: *mut i16, len: usize);

    /// Writes `base + i` into `out` for every `i < len` with `src[i] > threshold`
    /// and returns the new number of used slots of `out`.
    ///
    /// # Safety
    ///
    /// The backend must be supported by the running CPU, `src` must be valid
    /// for `len` reads and aligned to [`Self::WIDTH`], `len` must be a
    /// multiple of [`SCAN_CHUNK`], and `out` must have room for `len` more
    /// indexes after `written`.
    unsafe fn gt_i16_body(
        src: *const i16,
        len: usize,
        threshold: i16,
        base: usize,
        out: &mut [usize],
        written: usize,
    ) -> usize;
}

/// Element-wise wraparound accumulation of a byte slice into `self`.
pub trait SimdAccumulate<Rhs: ?Sized = Self> {
    /// Vectorized accumulation with the active backend.
    fn simd_accumulate(&mut self, rhs: &Rhs) -> Result<()>;
    /// Vectorized accumulation split across the rayon thread pool.
    fn par_simd_accumulate(&mut self, rhs: &Rhs) -> Result<()>;
    /// Plain scalar accumulation.
    fn scalar_accumulate(&mut self, rhs: &Rhs) -> Result<()>;
}

/// Indexes of the elements of `self` strictly greater than a threshold.
pub trait SimdThreshold<T> {
    fn simd_indexes_greater_than(&self, threshold: T) -> Vec<usize>;
    fn scalar_indexes_greater_than(&self, threshold: T) -> Vec<usize>;
}
