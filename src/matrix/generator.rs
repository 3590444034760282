//! Build matrix generation.
//!
//! The generator is a seam: the packager only relies on the
//! [`MatrixGenerator`] trait. [`DefaultGenerator`] expands a fixed set of
//! axes (compiler × arch × build type × shared) into configurations.

use anyhow::Result;

use crate::core::configuration::{BuildConfiguration, BuildMatrix};
use crate::core::coordinate::PackageCoordinate;
use crate::core::options::{OptionKey, OptionSet};
use crate::core::settings::Settings;

/// How the matrix should be populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationMode {
    /// Every default combination of the configured axes.
    CommonBuilds {
        /// C-only package: no C++ standard library setting.
        pure_c: bool,
    },
    /// A single configuration using the profile defaults (header-only packages).
    Single,
}

impl GenerationMode {
    /// Pick the mode from the header-only and pure-C flags.
    ///
    /// Only an explicit `false` asks for the common builds; an unset flag
    /// yields the single default configuration.
    pub fn select(header_only: Option<bool>, pure_c: bool) -> Self {
        match header_only {
            Some(false) => GenerationMode::CommonBuilds { pure_c },
            Some(true) | None => GenerationMode::Single,
        }
    }
}

/// Produces the full build matrix for a package.
pub trait MatrixGenerator {
    fn generate(&self, reference: &PackageCoordinate, mode: GenerationMode) -> Result<BuildMatrix>;
}

/// The axes a common-builds matrix is expanded over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixAxes {
    pub archs: Vec<String>,
    pub build_types: Vec<String>,
    pub gcc_versions: Vec<String>,
    pub clang_versions: Vec<String>,
    /// Options set on every configuration
    pub options: OptionSet,
}

impl Default for MatrixAxes {
    fn default() -> Self {
        MatrixAxes {
            archs: vec![host_arch().to_string()],
            build_types: vec!["Release".to_string(), "Debug".to_string()],
            gcc_versions: Vec::new(),
            clang_versions: Vec::new(),
            options: OptionSet::new(),
        }
    }
}

/// Conan's name for the host architecture.
pub fn host_arch() -> &'static str {
    match std::env::consts::ARCH {
        "aarch64" => "armv8",
        "arm" => "armv7",
        other => other,
    }
}

/// Conan's name for the host operating system.
pub fn host_os() -> &'static str {
    match std::env::consts::OS {
        "linux" => "Linux",
        "macos" => "Macos",
        "windows" => "Windows",
        "freebsd" => "FreeBSD",
        other => other,
    }
}

/// A compiler entry on the compiler axis.
#[derive(Debug, Clone, PartialEq, Eq)]
struct CompilerSpec {
    family: &'static str,
    version: String,
}

impl CompilerSpec {
    /// The C++ standard library for this compiler on `os`.
    fn libcxx(&self, os: &str) -> &'static str {
        match (self.family, os) {
            ("clang", "Macos") | ("apple-clang", _) => "libc++",
            _ => "libstdc++11",
        }
    }
}

/// Axis-product generator.
#[derive(Debug, Clone)]
pub struct DefaultGenerator {
    axes: MatrixAxes,
    os: String,
}

impl DefaultGenerator {
    pub fn new(axes: MatrixAxes) -> Self {
        DefaultGenerator {
            axes,
            os: host_os().to_string(),
        }
    }

    /// Generate for a specific OS instead of the host.
    pub fn with_os(mut self, os: impl Into<String>) -> Self {
        self.os = os.into();
        self
    }

    fn compilers(&self) -> Vec<Option<CompilerSpec>> {
        let gcc = self.axes.gcc_versions.iter().map(|v| CompilerSpec {
            family: "gcc",
            version: v.clone(),
        });
        let clang = self.axes.clang_versions.iter().map(|v| CompilerSpec {
            family: "clang",
            version: v.clone(),
        });

        let compilers: Vec<_> = gcc.chain(clang).map(Some).collect();
        if compilers.is_empty() {
            // No explicit compilers: let the profile pick one.
            vec![None]
        } else {
            compilers
        }
    }

    fn common_builds(&self, reference: &PackageCoordinate, pure_c: bool) -> Result<BuildMatrix> {
        let shared_key = OptionKey::shared(reference.name())?;
        let mut matrix = BuildMatrix::new();

        for compiler in self.compilers() {
            for arch in &self.axes.archs {
                for build_type in &self.axes.build_types {
                    for shared in [false, true] {
                        let mut settings = Settings::new()
                            .with("os", self.os.as_str())
                            .with("arch", arch.as_str())
                            .with("build_type", build_type.as_str());

                        if let Some(ref compiler) = compiler {
                            settings.insert("compiler", compiler.family);
                            settings.insert("compiler.version", compiler.version.as_str());
                            if !pure_c {
                                settings.insert("compiler.libcxx", compiler.libcxx(&self.os));
                            }
                        }

                        let options = self.axes.options.clone().with(shared_key.clone(), shared);

                        matrix.push(
                            BuildConfiguration::new(reference.clone())
                                .with_settings(settings)
                                .with_options(options),
                        );
                    }
                }
            }
        }

        Ok(matrix)
    }
}

impl MatrixGenerator for DefaultGenerator {
    fn generate(&self, reference: &PackageCoordinate, mode: GenerationMode) -> Result<BuildMatrix> {
        let matrix = match mode {
            GenerationMode::CommonBuilds { pure_c } => self.common_builds(reference, pure_c)?,
            GenerationMode::Single => std::iter::once(
                BuildConfiguration::new(reference.clone()).with_options(self.axes.options.clone()),
            )
            .collect(),
        };

        tracing::debug!(
            "generated {} configuration(s) for {} ({:?})",
            matrix.len(),
            reference,
            mode
        );

        Ok(matrix)
    }
}
