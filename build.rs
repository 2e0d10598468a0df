use std::cmp::Ordering;
use std::env;
use std::process::Command;

const BACKEND_ENV: &str = "SIMDARITH_BACKEND";

// CPU features that select an accumulation backend
#[derive(PartialEq, Eq, Debug)]
struct CpuFeature {
    name: &'static str,
    cfg_flag: &'static str,
    target_arch: &'static str,
    detected: bool,
}

impl CpuFeature {
    // Priority order between backends (Lowest number == Highest Priority)
    fn priority(&self) -> usize {
        match self.name {
            "avx2" => 0,
            "sse2" => 1,
            "neon" => 2,
            _ => usize::MAX,
        }
    }

    fn features() -> Vec<CpuFeature> {
        vec![
            CpuFeature {
                name: "sse2",
                cfg_flag: "sse",
                target_arch: "x86_64",
                detected: false,
            },
            CpuFeature {
                name: "avx2",
                cfg_flag: "avx2",
                target_arch: "x86_64",
                detected: false,
            },
            CpuFeature {
                name: "neon",
                cfg_flag: "neon",
                target_arch: "aarch64",
                detected: false,
            },
        ]
    }

    fn matches_arch(&self, target_arch: &str) -> bool {
        match target_arch {
            "x86" | "x86_64" => self.target_arch == "x86_64",
            other => self.target_arch == other,
        }
    }
}

impl Ord for CpuFeature {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority().cmp(&other.priority())
    }
}

impl PartialOrd for CpuFeature {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

trait CpuFeatureDetector {
    fn detect_features(&self, features: &mut [CpuFeature]);
    fn is_applicable(&self) -> bool;
}

struct LinuxDetector;
impl CpuFeatureDetector for LinuxDetector {
    fn detect_features(&self, features: &mut [CpuFeature]) {
        if let Ok(cpuinfo) = std::fs::read_to_string("/proc/cpuinfo") {
            let contents = cpuinfo.to_lowercase();
            for feature in features.iter_mut() {
                feature.detected = match feature.name {
                    // aarch64 kernels report advanced SIMD as "asimd"
                    "neon" => contents.contains("asimd") || contents.contains("neon"),
                    name => contents.contains(name),
                };
            }
        }
    }

    fn is_applicable(&self) -> bool {
        cfg!(target_os = "linux")
    }
}

struct MacOSDetector;
impl CpuFeatureDetector for MacOSDetector {
    fn detect_features(&self, features: &mut [CpuFeature]) {
        let output = Command::new("sysctl").args(["-a"]).output();

        if let Ok(output) = output {
            let contents = String::from_utf8_lossy(&output.stdout).to_lowercase();

            for feature in features.iter_mut() {
                match feature.name {
                    "avx2" => feature.detected = contents.contains("hw.optional.avx2_0: 1"),
                    "sse2" => feature.detected = contents.contains("hw.optional.sse2: 1"),
                    "neon" => {
                        feature.detected = contents.contains("hw.optional.neon: 1")
                            || contents.contains("hw.optional.arm.advsimd: 1")
                    }
                    _ => {}
                }
            }
        }
    }

    fn is_applicable(&self) -> bool {
        cfg!(target_os = "macos")
    }
}

struct PlatformDetector;
impl PlatformDetector {
    fn cpu_features_detectors() -> Vec<Box<dyn CpuFeatureDetector>> {
        vec![Box::new(LinuxDetector), Box::new(MacOSDetector)]
    }

    fn detect_cpu_features(features: &mut [CpuFeature]) {
        for detector in Self::cpu_features_detectors() {
            if detector.is_applicable() {
                detector.detect_features(features);
                break;
            }
        }
    }

    // Cross builds cannot probe the target, so every backend of the target
    // architecture is assumed and runtime detection narrows it down later.
    fn assume_target_features(features: &mut [CpuFeature], target_arch: &str) {
        for feature in features.iter_mut() {
            feature.detected = feature.matches_arch(target_arch);
        }
    }

    fn select(features: &mut [CpuFeature], target_arch: &str) -> &'static str {
        if let Ok(requested) = env::var(BACKEND_ENV) {
            let requested = requested.trim().to_lowercase();
            match requested.as_str() {
                "avx2" | "sse" | "neon" | "fallback" => return backend_flag(&requested),
                other => println!(
                    "cargo:warning={BACKEND_ENV}={other} is not one of avx2, sse, neon, fallback; ignoring"
                ),
            }
        }

        features.sort();

        features
            .iter()
            .filter(|cpu_feature| cpu_feature.matches_arch(target_arch))
            .find(|cpu_feature| cpu_feature.detected)
            .map(|cpu_feature| cpu_feature.cfg_flag)
            .unwrap_or("fallback")
    }

    fn apply(cfg_flag: &str) {
        println!("cargo:rustc-cfg={cfg_flag}");

        println!("cargo::rustc-check-cfg=cfg(avx2)");
        println!("cargo::rustc-check-cfg=cfg(sse)");
        println!("cargo::rustc-check-cfg=cfg(neon)");
        println!("cargo::rustc-check-cfg=cfg(fallback)");
    }
}

fn backend_flag(flag: &str) -> &'static str {
    match flag {
        "avx2" => "avx2",
        "sse" => "sse",
        "neon" => "neon",
        _ => "fallback",
    }
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed={BACKEND_ENV}");

    let mut features = CpuFeature::features();

    let host = env::var("HOST").unwrap_or_default();
    let target = env::var("TARGET").unwrap_or_default();
    let target_arch = env::var("CARGO_CFG_TARGET_ARCH").unwrap_or_default();

    if host == target {
        PlatformDetector::detect_cpu_features(&mut features);
    } else {
        PlatformDetector::assume_target_features(&mut features, &target_arch);
    }

    let cfg_flag = PlatformDetector::select(&mut features, &target_arch);

    PlatformDetector::apply(cfg_flag);
}
