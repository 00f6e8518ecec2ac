use crate::common::path_to_string;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Where a dependency was satisfied from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyStatus {
    /// A file with this name sits next to the binary
    Bundled,
    /// The system lookup or loader can provide it
    Found,
    /// Nowhere to be found
    Missing,
}

impl std::fmt::Display for DependencyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Bundled => "bundled",
            Self::Found => "found",
            Self::Missing => "MISSING",
        })
    }
}

/// A DLL listed by dumpbin, and how it resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dependency {
    /// Name as it appears in the dumpbin output
    pub dllname: String,
    pub status: DependencyStatus,
}

/// Result of checking one of the target binaries
#[derive(Debug, Clone, Serialize)]
pub struct BinaryReport {
    /// File name of the binary
    pub name: String,
    /// Full path that was checked
    pub path: PathBuf,
    /// if the binary exists at all; if not, no dependencies were looked up
    pub found: bool,
    /// In dumpbin order, duplicates included
    pub dependencies: Vec<Dependency>,
}

impl BinaryReport {
    pub fn not_found<P: AsRef<Path>>(name: &str, path: P) -> Self {
        Self {
            name: name.to_owned(),
            path: path.as_ref().to_owned(),
            found: false,
            dependencies: Vec::new(),
        }
    }

    pub fn missing(&self) -> Vec<&str> {
        self.dependencies
            .iter()
            .filter(|d| d.status == DependencyStatus::Missing)
            .map(|d| d.dllname.as_str())
            .collect()
    }
}

/// Outcome of the direct load attempted when dumpbin is not available
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FallbackOutcome {
    pub library: String,
    pub loaded: bool,
    /// Why loading failed, as reported by the system
    pub error: Option<String>,
}

/// Everything found out during a run
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub bin_dir: PathBuf,
    /// dumpbin used for the run; None means the fallback was taken
    pub dumpbin: Option<PathBuf>,
    pub binaries: Vec<BinaryReport>,
    pub fallback: Option<FallbackOutcome>,
}

impl CheckReport {
    pub fn new<P: AsRef<Path>>(bin_dir: P, dumpbin: Option<PathBuf>) -> Self {
        Self {
            bin_dir: bin_dir.as_ref().to_owned(),
            dumpbin,
            binaries: Vec::new(),
            fallback: None,
        }
    }

    /// Total number of MISSING dependencies over all binaries
    pub fn missing_count(&self) -> usize {
        self.binaries.iter().map(|b| b.missing().len()).sum()
    }

    /// if something is known to be broken: an absent target binary, a missing dependency,
    /// or a failed fallback load
    pub fn has_failures(&self) -> bool {
        self.binaries.iter().any(|b| !b.found)
            || self.missing_count() > 0
            || self.fallback.as_ref().map(|f| !f.loaded).unwrap_or(false)
    }
}

/// Print the section for one binary
pub fn write_binary_report<W: Write>(
    out: &mut W,
    report: &BinaryReport,
    bin_dir: &Path,
) -> std::io::Result<()> {
    if !report.found {
        return writeln!(out, "{}: not found in {}", report.name, path_to_string(bin_dir));
    }

    writeln!(
        out,
        "--- {} ({} dependencies) ---",
        report.name,
        report.dependencies.len()
    )?;
    for d in &report.dependencies {
        writeln!(out, "  {}: {}", d.dllname, d.status)?;
    }

    let missing = report.missing();
    if missing.is_empty() {
        writeln!(out, "  All dependencies satisfied.")
    } else {
        writeln!(out, "  ** {} MISSING: {}", missing.len(), missing.join(", "))
    }
}

pub fn write_fallback_outcome<W: Write>(out: &mut W, outcome: &FallbackOutcome) -> std::io::Result<()> {
    match &outcome.error {
        None => writeln!(out, "{} loaded successfully", outcome.library),
        Some(e) => writeln!(out, "{} FAILED to load: {}", outcome.library, e),
    }
}
