//! Error types for simdarith operations.
//!
//! The SIMD kernels themselves never fail: every contract they rely on
//! (matching lengths, element alignment, output capacity) is validated by
//! the checked entry points before a kernel runs, and reported through
//! [`SimdarithError`] instead of being left as undefined behavior.

use std::fmt;

/// Errors that can occur during simdarith operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimdarithError {
    /// Source and destination buffers hold a different number of elements.
    LengthMismatch {
        /// Number of elements in the source buffer.
        source_len: usize,
        /// Number of elements in the destination buffer.
        destination_len: usize,
    },
    /// A buffer does not start on a multiple of its element size.
    MisalignedBuffer {
        /// Starting address of the offending buffer.
        address: usize,
        /// Alignment the buffer must satisfy, in bytes.
        required_alignment: usize,
    },
    /// The index output buffer cannot hold one index per source element.
    OutputTooSmall {
        /// Capacity the output must have.
        required: usize,
        /// Capacity the caller supplied.
        available: usize,
    },
    /// An explicitly requested backend cannot run on this CPU or target.
    UnsupportedBackend {
        /// Name of the requested backend.
        backend: &'static str,
    },
    /// Input validation error.
    ValidationError {
        /// Human-readable error message.
        message: String,
    },
}

impl fmt::Display for SimdarithError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimdarithError::LengthMismatch {
                source_len,
                destination_len,
            } => write!(
                f,
                "Length mismatch: source has {} elements, destination has {}",
                source_len, destination_len
            ),
            SimdarithError::MisalignedBuffer {
                address,
                required_alignment,
            } => write!(
                f,
                "Misaligned buffer: address {:#x} is not a multiple of {} bytes",
                address, required_alignment
            ),
            SimdarithError::OutputTooSmall {
                required,
                available,
            } => write!(
                f,
                "Output buffer too small: {} slots required, {} available",
                required, available
            ),
            SimdarithError::UnsupportedBackend { backend } => {
                write!(f, "Backend '{}' is not supported on this machine", backend)
            }
            SimdarithError::ValidationError { message } => {
                write!(f, "Validation error: {}", message)
            }
        }
    }
}

impl std::error::Error for SimdarithError {}

/// Result type alias for simdarith operations.
pub type Result<T> = std::result::Result<T, SimdarithError>;

/// Creates a length mismatch error.
pub fn length_mismatch(source_len: usize, destination_len: usize) -> SimdarithError {
    SimdarithError::LengthMismatch {
        source_len,
        destination_len,
    }
}

/// Creates a misaligned buffer error.
pub fn misaligned(address: usize, required_alignment: usize) -> SimdarithError {
    SimdarithError::MisalignedBuffer {
        address,
        required_alignment,
    }
}

/// Creates an output capacity error.
pub fn output_too_small(required: usize, available: usize) -> SimdarithError {
    SimdarithError::OutputTooSmall {
        required,
        available,
    }
}

/// Creates an unsupported backend error.
pub fn unsupported_backend(backend: &'static str) -> SimdarithError {
    SimdarithError::UnsupportedBackend { backend }
}

/// Creates a validation error.
pub fn validation_error(message: impl Into<String>) -> SimdarithError {
    SimdarithError::ValidationError {
        message: message.into(),
    }
}

/// Checks that two buffers hold the same number of elements.
#[inline]
pub(crate) fn ensure_same_len(source_len: usize, destination_len: usize) -> Result<()> {
    if source_len != destination_len {
        return Err(length_mismatch(source_len, destination_len));
    }
    Ok(())
}

/// Checks that `ptr` sits on a multiple of `T`'s size.
#[inline]
pub(crate) fn ensure_element_aligned<T>(ptr: *const T) -> Result<()> {
    let address = ptr as usize;
    let required_alignment = std::mem::size_of::<T>();
    if required_alignment > 1 && address % required_alignment != 0 {
        return Err(misaligned(address, required_alignment));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_mismatch_display() {
        let error = length_mismatch(17, 16);
        let display = format!("{}", error);
        assert!(display.contains("Length mismatch"));
        assert!(display.contains("17 elements"));
        assert!(display.contains("destination has 16"));
    }

    #[test]
    fn test_misaligned_display() {
        let error = misaligned(0x1001, 2);
        let display = format!("{}", error);
        assert!(display.contains("Misaligned buffer"));
        assert!(display.contains("0x1001"));
        assert!(display.contains("2 bytes"));
    }

    #[test]
    fn test_output_too_small_display() {
        let error = output_too_small(8, 1);
        let display = format!("{}", error);
        assert!(display.contains("8 slots required"));
        assert!(display.contains("1 available"));
    }

    #[test]
    fn test_unsupported_backend_display() {
        let display = format!("{}", unsupported_backend("avx2"));
        assert!(display.contains("'avx2'"));
    }

    #[test]
    fn test_validation_error_display() {
        let error = validation_error("plane shapes differ");
        let display = format!("{}", error);
        assert!(display.contains("Validation error"));
        assert!(display.contains("plane shapes differ"));
    }

    #[test]
    fn test_error_equality() {
        assert_eq!(length_mismatch(4, 5), length_mismatch(4, 5));
        assert_ne!(length_mismatch(4, 5), length_mismatch(5, 4));
    }

    #[test]
    fn test_ensure_helpers() {
        assert!(ensure_same_len(3, 3).is_ok());
        assert_eq!(ensure_same_len(3, 4), Err(length_mismatch(3, 4)));

        let words = [0i16; 4];
        assert!(ensure_element_aligned(words.as_ptr()).is_ok());

        let odd = 0x1001usize as *const i16;
        assert_eq!(ensure_element_aligned(odd), Err(misaligned(0x1001, 2)));

        let bytes = 0x1001usize as *const u8;
        assert!(ensure_element_aligned(bytes).is_ok());
    }

    #[test]
    fn test_error_trait_implementation() {
        let error = validation_error("test error");
        let _: &dyn std::error::Error = &error;
        assert!(std::error::Error::source(&error).is_none());
    }
}
