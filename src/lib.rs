//! # simdarith
//!
//! Vectorized arithmetic primitives for template-matching pipelines:
//!
//! - [`accumulate`]: element-wise wraparound addition of a byte buffer into a
//!   byte buffer, or into a 16-bit buffer with zero-extension
//! - [`threshold`]: indexes of the 16-bit elements above a threshold
//! - [`plane`]: the same accumulation over 2-D `ndarray` planes
//!
//! Every kernel splits its buffer into an unaligned prefix, a vector-aligned
//! body and a suffix ([`simd::Segments`]); the body runs on the active
//! [`Backend`] (SSE2, AVX2 or NEON) and the edges on a portable scalar path.
//!
//! ```rust
//! use simdarith::{Backend, SimdAccumulate};
//!
//! let src = vec![200u8; 1000];
//! let mut dst = vec![100i16; 1000];
//! dst.as_mut_slice().simd_accumulate(src.as_slice()).unwrap();
//! assert!(dst.iter().all(|&v| v == 300));
//!
//! println!("running on {}", Backend::active());
//! ```

pub mod accumulate;
pub mod error;
pub mod plane;
pub mod simd;
pub mod threshold;

pub use accumulate::{
    add_byte_to_byte_vector, add_byte_to_short_vector, par_add_byte_to_byte_vector,
    par_add_byte_to_short_vector,
};
pub use error::{Result, SimdarithError};
pub use simd::{Backend, SimdAccumulate, SimdThreshold};
pub use threshold::{find_indexes_greater_than, indexes_greater_than};
