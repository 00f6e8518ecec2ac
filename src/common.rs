use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name suffix of the libraries we are looking for
pub const DLL_SUFFIX: &str = ".dll";

#[derive(Error, Debug)]
pub enum CheckError {
    #[error("Could not launch {tool}")]
    ToolLaunch {
        tool: PathBuf,
        source: std::io::Error,
    },

    #[error("{source}")]
    LibraryLoad {
        name: String,
        source: std::io::Error,
    },

    #[error("Could not add {dir} to the DLL search directories: {source}")]
    DllDirectory {
        dir: PathBuf,
        source: std::io::Error,
    },

    #[error("Could not update the search path: {0}")]
    SearchPath(String),

    #[error("{0}")]
    Unsupported(String),

    #[error(transparent)]
    IOError(#[from] std::io::Error),
    #[error(transparent)]
    JsonError(#[from] serde_json::Error),
}

/// Check whether the name ends with `.dll`, ignoring case
pub fn has_dll_suffix(name: &str) -> bool {
    name.len() >= DLL_SUFFIX.len()
        && name
            .get(name.len() - DLL_SUFFIX.len()..)
            .map(|s| s.eq_ignore_ascii_case(DLL_SUFFIX))
            .unwrap_or(false)
}

/// Remove one trailing `.dll` (any case) from the name, if present
pub fn strip_dll_suffix(name: &str) -> &str {
    if has_dll_suffix(name) {
        &name[..name.len() - DLL_SUFFIX.len()]
    } else {
        name
    }
}

/// Drop the verbatim prefix (\\?\) that canonicalization adds on Windows
pub fn decanonicalize(s: &str) -> String {
    s.strip_prefix(r"\\?\").unwrap_or(s).to_owned()
}

pub fn path_to_string<P: AsRef<Path>>(p: P) -> String {
    decanonicalize(&p.as_ref().to_string_lossy())
}
