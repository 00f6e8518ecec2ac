//! Locating dumpbin.exe and reading the dependencies it reports

use crate::common::{has_dll_suffix, CheckError};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, warn};

/// Flag that makes dumpbin list the DLLs imported by a PE file
pub const DEPENDENTS_FLAG: &str = "/dependents";

/// Build the glob pattern matching every 64-bit dumpbin under the Visual Studio installations
///
/// Only the trailing part is a pattern: the root is escaped, so that directories such as
/// `Program Files [x86]` are matched literally
pub fn dumpbin_pattern<P: AsRef<Path>>(program_files: P) -> String {
    let root = glob::Pattern::escape(&program_files.as_ref().to_string_lossy());
    let tail: PathBuf = ["Microsoft Visual Studio", "**", "Hostx64", "x64", "dumpbin.exe"]
        .iter()
        .collect();
    Path::new(&root).join(tail).to_string_lossy().into_owned()
}

/// Look for dumpbin.exe at any depth below `<program_files>/Microsoft Visual Studio`
///
/// Returns the first match. Not finding it is a normal outcome, not an error.
pub fn find_dumpbin<P: AsRef<Path>>(program_files: P) -> Option<PathBuf> {
    let pattern = dumpbin_pattern(&program_files);
    let paths = match glob::glob(&pattern) {
        Ok(paths) => paths,
        Err(e) => {
            debug!(%pattern, error = %e, "invalid dumpbin search pattern");
            return None;
        }
    };
    let found = paths.filter_map(Result::ok).find(|p| p.is_file());
    match &found {
        Some(p) => debug!(dumpbin = %p.display(), "located dumpbin"),
        None => debug!(%pattern, "no dumpbin found"),
    }
    found
}

/// Run `dumpbin /dependents <binary>` and return its standard output
///
/// The exit status is not inspected: the output is parsed whatever it says
pub fn run_dumpbin<P: AsRef<Path>, Q: AsRef<Path>>(
    dumpbin: P,
    binary: Q,
) -> Result<String, CheckError> {
    let output = Command::new(dumpbin.as_ref())
        .arg(DEPENDENTS_FLAG)
        .arg(binary.as_ref())
        .output()
        .map_err(|source| CheckError::ToolLaunch {
            tool: dumpbin.as_ref().to_owned(),
            source,
        })?;
    debug!(
        binary = %binary.as_ref().display(),
        status = %output.status,
        "dumpbin finished"
    );
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Extract the DLL names from dumpbin output
///
/// Every line that ends in `.dll` (ignoring case and surrounding whitespace) is a dependency;
/// everything else (banner, section titles, summary) is skipped. Order and duplicates are kept.
pub fn parse_dependents(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|l| has_dll_suffix(l))
        .map(str::to_owned)
        .collect()
}

/// Names of the DLLs the binary depends on, as reported by dumpbin
///
/// If dumpbin can't be launched or reports nothing recognizable the list is empty
pub fn get_dependents<P: AsRef<Path>, Q: AsRef<Path>>(dumpbin: P, binary: Q) -> Vec<String> {
    match run_dumpbin(&dumpbin, &binary) {
        Ok(stdout) => {
            let deps = parse_dependents(&stdout);
            if deps.is_empty() {
                debug!(binary = %binary.as_ref().display(), "no dependencies in dumpbin output");
            }
            deps
        }
        Err(e) => {
            warn!(error = %e, binary = %binary.as_ref().display(), "could not run dumpbin");
            Vec::new()
        }
    }
}
