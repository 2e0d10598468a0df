//! Backend selection for the vector kernels.
//!
//! Every kernel exists in up to four flavors: a portable scalar one and one per
//! supported instruction set. [`Backend`] names them; [`Backend::active`]
//! picks the one used by the default entry points.
//!
//! # Selection
//!
//! `build.rs` emits exactly one of the `avx2`, `sse`, `neon` or `fallback`
//! cfg flags, from host CPU detection on native builds or the
//! `SIMDARITH_BACKEND` environment variable. That flag is the
//! [`Backend::preferred`] backend. At run time the preferred backend is
//! confirmed with CPU feature detection; when the running CPU lacks it, the
//! next narrower supported backend is used instead, down to
//! [`Backend::Scalar`].

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::error::{validation_error, SimdarithError};

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub mod avx2;

#[cfg(target_arch = "aarch64")]
pub mod neon;

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub mod sse;

pub mod scalar;
pub mod segments;
pub mod traits;

pub use segments::Segments;
pub use traits::{SimdAccumulate, SimdThreshold, VectorKernel, SCAN_CHUNK};

/// Runs `$vector` with `$kernel` bound to the [`VectorKernel`] of `$backend`,
/// or `$scalar` for [`Backend::Scalar`] and backends this target cannot build.
///
/// The backend must already be known to be supported by the running CPU.
macro_rules! dispatch_kernel {
    ($backend:expr, $kernel:ident => $vector:expr, scalar => $scalar:expr $(,)?) => {
        match $backend {
            #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
            $crate::simd::Backend::Avx2 => {
                type $kernel = $crate::simd::avx2::Avx2;
                $vector
            }
            #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
            $crate::simd::Backend::Sse2 => {
                type $kernel = $crate::simd::sse::Sse2;
                $vector
            }
            #[cfg(target_arch = "aarch64")]
            $crate::simd::Backend::Neon => {
                type $kernel = $crate::simd::neon::Neon;
                $vector
            }
            #[allow(unreachable_patterns)]
            _ => $scalar,
        }
    };
}

pub(crate) use dispatch_kernel;

/// A family of kernels sharing one vector width.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Backend {
    /// Portable element-by-element loops.
    Scalar,
    /// 128-bit x86 vectors.
    Sse2,
    /// 256-bit x86 vectors.
    Avx2,
    /// 128-bit AArch64 vectors.
    Neon,
}

static ACTIVE_BACKEND: OnceLock<Backend> = OnceLock::new();

impl Backend {
    pub const ALL: [Backend; 4] = [Backend::Avx2, Backend::Sse2, Backend::Neon, Backend::Scalar];

    pub const fn name(self) -> &'static str {
        match self {
            Backend::Scalar => "scalar",
            Backend::Sse2 => "sse2",
            Backend::Avx2 => "avx2",
            Backend::Neon => "neon",
        }
    }

    /// Vector width in bytes, or `1` for the scalar backend, which has no
    /// alignment requirement.
    pub const fn vector_width(self) -> usize {
        match self {
            Backend::Scalar => 1,
            Backend::Sse2 | Backend::Neon => 16,
            Backend::Avx2 => 32,
        }
    }

    /// Whether the running CPU can execute this backend.
    pub fn is_supported(self) -> bool {
        match self {
            Backend::Scalar => true,
            #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
            Backend::Sse2 => is_x86_feature_detected!("sse2"),
            #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
            Backend::Avx2 => is_x86_feature_detected!("avx2"),
            #[cfg(target_arch = "aarch64")]
            Backend::Neon => std::arch::is_aarch64_feature_detected!("neon"),
            #[allow(unreachable_patterns)]
            _ => false,
        }
    }

    /// The backend chosen at build time.
    pub const fn preferred() -> Backend {
        if cfg!(avx2) {
            Backend::Avx2
        } else if cfg!(sse) {
            Backend::Sse2
        } else if cfg!(neon) {
            Backend::Neon
        } else {
            Backend::Scalar
        }
    }

    /// Backends to try, widest first, when this one is preferred.
    fn fallback_chain(self) -> &'static [Backend] {
        match self {
            Backend::Avx2 => &[Backend::Avx2, Backend::Sse2, Backend::Scalar],
            Backend::Sse2 => &[Backend::Sse2, Backend::Scalar],
            Backend::Neon => &[Backend::Neon, Backend::Scalar],
            Backend::Scalar => &[Backend::Scalar],
        }
    }

    /// The backend used by the default entry points, resolved once per process.
    pub fn active() -> Backend {
        *ACTIVE_BACKEND.get_or_init(|| {
            let preferred = Backend::preferred();
            let resolved = preferred
                .fallback_chain()
                .iter()
                .copied()
                .find(|backend| backend.is_supported())
                .unwrap_or(Backend::Scalar);

            log::debug!(
                "simdarith backend resolved: preferred={}, active={}",
                preferred,
                resolved
            );

            resolved
        })
    }

    /// Every backend the running CPU supports, widest first.
    pub fn available() -> Vec<Backend> {
        Backend::ALL
            .iter()
            .copied()
            .filter(|backend| backend.is_supported())
            .collect()
    }

    /// Returns `self` if the running CPU supports it.
    pub fn ensure_supported(self) -> crate::error::Result<Backend> {
        if self.is_supported() {
            Ok(self)
        } else {
            Err(crate::error::unsupported_backend(self.name()))
        }
    }
}

impl Default for Backend {
    fn default() -> Self {
        Backend::active()
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Backend {
    type Err = SimdarithError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "scalar" | "fallback" => Ok(Backend::Scalar),
            "sse" | "sse2" => Ok(Backend::Sse2),
            "avx2" => Ok(Backend::Avx2),
            "neon" => Ok(Backend::Neon),
            other => Err(validation_error(format!("unknown backend '{other}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_is_always_available() {
        assert!(Backend::Scalar.is_supported());
        assert!(Backend::available().contains(&Backend::Scalar));
        assert_eq!(Backend::available().last(), Some(&Backend::Scalar));
    }

    #[test]
    fn test_active_is_supported_and_stable() {
        let active = Backend::active();
        assert!(active.is_supported());
        assert_eq!(active, Backend::active());
        assert!(Backend::preferred().fallback_chain().contains(&active));
    }

    #[test]
    fn test_vector_widths() {
        assert_eq!(Backend::Scalar.vector_width(), 1);
        assert_eq!(Backend::Sse2.vector_width(), 16);
        assert_eq!(Backend::Neon.vector_width(), 16);
        assert_eq!(Backend::Avx2.vector_width(), 32);
    }

    #[test]
    fn test_parse_backend_names() {
        assert_eq!("AVX2".parse::<Backend>(), Ok(Backend::Avx2));
        assert_eq!(" sse ".parse::<Backend>(), Ok(Backend::Sse2));
        assert_eq!("fallback".parse::<Backend>(), Ok(Backend::Scalar));
        assert_eq!("neon".parse::<Backend>(), Ok(Backend::Neon));
        assert!("avx512".parse::<Backend>().is_err());

        for backend in Backend::ALL {
            assert_eq!(backend.to_string().parse::<Backend>(), Ok(backend));
        }
    }

    #[test]
    fn test_ensure_supported() {
        for backend in Backend::ALL {
            assert_eq!(backend.ensure_supported().is_ok(), backend.is_supported());
        }
    }

    #[cfg(target_arch = "x86_64")]
    #[test]
    fn test_sse2_is_baseline_on_x86_64() {
        assert!(Backend::Sse2.is_supported());
        assert!(!Backend::Neon.is_supported());
    }
}
