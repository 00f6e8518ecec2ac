//! Classification of the dependencies of a binary: bundled, found on the system, or missing

use crate::common::strip_dll_suffix;
use crate::report::{Dependency, DependencyStatus};
use crate::system::Loader;
use std::path::Path;
use tracing::debug;

/// Decide where a DLL needed by a binary in `bin_dir` comes from
///
/// The checks are tried in order, and the first one that succeeds wins:
/// 1. a file with that name next to the binary
/// 2. lookup of the bare name (without `.dll`) on the system search path
/// 3. actually loading the DLL; some DLLs that the lookup misses still load fine
pub fn classify<L: Loader + ?Sized>(dllname: &str, bin_dir: &Path, loader: &L) -> DependencyStatus {
    if bin_dir.join(dllname).exists() {
        return DependencyStatus::Bundled;
    }

    if let Some(p) = loader.find_library(strip_dll_suffix(dllname)) {
        debug!(dllname, found_at = %p.display(), "found by name");
        return DependencyStatus::Found;
    }

    match loader.load_library(Path::new(dllname)) {
        Ok(()) => {
            debug!(dllname, "found by loading");
            DependencyStatus::Found
        }
        Err(e) => {
            debug!(dllname, error = %e, "could not load");
            DependencyStatus::Missing
        }
    }
}

/// Classify every dependency, keeping the order
pub fn classify_all<L: Loader + ?Sized>(
    dllnames: Vec<String>,
    bin_dir: &Path,
    loader: &L,
) -> Vec<Dependency> {
    dllnames
        .into_iter()
        .map(|dllname| {
            let status = classify(&dllname, bin_dir, loader);
            Dependency { dllname, status }
        })
        .collect()
}
