//! Data structures that must be filled with the input and the parameters for the check

use crate::common::CheckError;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Binaries inspected when the user doesn't pick any, in reporting order
pub const DEFAULT_TARGETS: [&str; 2] = ["lldb-dap.exe", "liblldb.dll"];

/// Library that the fallback tries to load when dumpbin is not available
pub const PRIMARY_LIBRARY: &str = "liblldb.dll";

/// Environment variable pointing to the Program Files directory
pub const PROGRAM_FILES_VAR: &str = "ProgramFiles";

/// Used when the ProgramFiles variable is not set
pub const DEFAULT_PROGRAM_FILES: &str = r"C:\Program Files";

/// Complete specification of a check run
#[derive(Clone, Debug)]
pub struct CheckQuery {
    /// Directory containing the binaries to inspect
    pub bin_dir: PathBuf,
    /// File names of the binaries to inspect, in reporting order
    pub targets: Vec<String>,
    /// Library loaded directly if dumpbin can't be found
    pub primary_library: String,
    /// Root of the Visual Studio search
    pub program_files: PathBuf,
    /// Use this dumpbin instead of searching for one
    pub dumpbin: Option<PathBuf>,
}

impl CheckQuery {
    /// autodetects the settings with sensible defaults
    ///
    /// The Visual Studio search root is taken from the environment.
    /// An empty directory means the current one.
    pub fn deduce_from_bin_dir<P: AsRef<Path>>(bin_dir: P) -> Result<Self, CheckError> {
        let bin_dir = match bin_dir.as_ref() {
            d if d.as_os_str().is_empty() => Path::new("."),
            d => d,
        };
        Ok(Self {
            bin_dir: bin_dir.to_owned(),
            targets: DEFAULT_TARGETS.iter().map(|&t| t.to_owned()).collect(),
            primary_library: PRIMARY_LIBRARY.to_owned(),
            program_files: program_files_from(std::env::var_os(PROGRAM_FILES_VAR)),
            dumpbin: None,
        })
    }

    pub fn target_path(&self, target: &str) -> PathBuf {
        self.bin_dir.join(target)
    }

    pub fn primary_library_path(&self) -> PathBuf {
        self.bin_dir.join(&self.primary_library)
    }
}

// an empty variable counts as unset
fn program_files_from(var: Option<OsString>) -> PathBuf {
    match var {
        Some(v) if !v.is_empty() => PathBuf::from(v),
        _ => PathBuf::from(DEFAULT_PROGRAM_FILES),
    }
}
