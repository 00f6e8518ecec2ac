#[cfg(windows)]
extern crate winapi;

use crate::common::{has_dll_suffix, CheckError, DLL_SUFFIX};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Library lookup and loading primitives provided by the operating system
///
/// The checks are written against this trait, so they can run against a fake system
pub trait Loader {
    /// Find a library by bare name (no `.dll` needed) on the system search path
    fn find_library(&self, name: &str) -> Option<PathBuf>;

    /// Load the library with the OS loader; it is released before returning
    fn load_library(&self, name: &Path) -> Result<(), CheckError>;

    /// Register an additional directory for the DLL search of this process
    fn add_dll_directory(&self, dir: &Path) -> Result<(), CheckError>;

    /// Put the directory in front of the PATH of this process
    fn prepend_search_path(&self, dir: &Path) -> Result<(), CheckError>;
}

/// The loader of the running process
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLoader;

impl SystemLoader {
    pub fn new() -> Self {
        Self
    }
}

impl Loader for SystemLoader {
    fn find_library(&self, name: &str) -> Option<PathBuf> {
        let path = std::env::var_os("PATH")?;
        find_library_in(name, std::env::split_paths(&path))
    }

    fn load_library(&self, name: &Path) -> Result<(), CheckError> {
        load_library(name).map(|_| ())
    }

    fn add_dll_directory(&self, dir: &Path) -> Result<(), CheckError> {
        add_dll_directory(dir)
    }

    fn prepend_search_path(&self, dir: &Path) -> Result<(), CheckError> {
        let old = std::env::var_os("PATH").unwrap_or_default();
        let new = prepended_path(dir, &old)?;
        std::env::set_var("PATH", new);
        Ok(())
    }
}

/// Look for a library in the given directories, in order
///
/// In each directory `name` is tried as is first, then with `.dll` appended (unless it already
/// ends with it)
pub fn find_library_in<I, P>(name: &str, dirs: I) -> Option<PathBuf>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    if name.is_empty() {
        return None;
    }
    for d in dirs {
        let candidate = d.as_ref().join(name);
        if candidate.is_file() {
            return Some(candidate);
        }
        if has_dll_suffix(name) {
            continue;
        }
        let candidate = d.as_ref().join(format!("{}{}", name, DLL_SUFFIX));
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

/// Value of PATH with `dir` as first entry, followed by the entries of `old`
pub fn prepended_path(dir: &Path, old: &std::ffi::OsStr) -> Result<OsString, CheckError> {
    let entries = std::iter::once(dir.to_owned()).chain(std::env::split_paths(old));
    std::env::join_paths(entries).map_err(|e| CheckError::SearchPath(e.to_string()))
}

/// Handle to a loaded library; the library is freed on drop
#[cfg(windows)]
pub struct LoadedLibrary(winapi::shared::minwindef::HMODULE);

#[cfg(windows)]
impl Drop for LoadedLibrary {
    fn drop(&mut self) {
        unsafe {
            winapi::um::libloaderapi::FreeLibrary(self.0);
        }
    }
}

#[cfg(windows)]
fn to_wide<S: AsRef<std::ffi::OsStr>>(s: S) -> Vec<u16> {
    use std::os::windows::ffi::OsStrExt;
    s.as_ref().encode_wide().chain(Some(0)).collect()
}

/// Load a DLL from the default search directories, plus the DLL's own
/// directory when a path is given
#[cfg(windows)]
pub fn load_library(name: &Path) -> Result<LoadedLibrary, CheckError> {
    use winapi::um::libloaderapi::{
        LoadLibraryExW, LOAD_LIBRARY_SEARCH_DEFAULT_DIRS, LOAD_LIBRARY_SEARCH_DLL_LOAD_DIR,
    };

    let to_err = |source| CheckError::LibraryLoad {
        name: name.to_string_lossy().into_owned(),
        source,
    };

    let has_separator = name
        .to_string_lossy()
        .chars()
        .any(|c| c == '/' || c == '\\');
    let (target, flags) = if has_separator {
        (
            std::path::absolute(name).map_err(to_err)?,
            LOAD_LIBRARY_SEARCH_DEFAULT_DIRS | LOAD_LIBRARY_SEARCH_DLL_LOAD_DIR,
        )
    } else {
        (name.to_owned(), LOAD_LIBRARY_SEARCH_DEFAULT_DIRS)
    };

    let wide = to_wide(target.as_os_str());
    let handle = unsafe { LoadLibraryExW(wide.as_ptr(), std::ptr::null_mut(), flags) };
    if handle.is_null() {
        Err(to_err(std::io::Error::last_os_error()))
    } else {
        Ok(LoadedLibrary(handle))
    }
}

#[cfg(not(windows))]
pub struct LoadedLibrary;

#[cfg(not(windows))]
pub fn load_library(name: &Path) -> Result<LoadedLibrary, CheckError> {
    Err(CheckError::LibraryLoad {
        name: name.to_string_lossy().into_owned(),
        source: std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "DLLs can only be loaded on Windows",
        ),
    })
}

/// Add a directory to the DLL search directories of the process
///
/// The directory stays registered for the lifetime of the process
#[cfg(windows)]
pub fn add_dll_directory(dir: &Path) -> Result<(), CheckError> {
    let to_err = |source| CheckError::DllDirectory {
        dir: dir.to_owned(),
        source,
    };
    // AddDllDirectory wants an absolute path
    let abs = std::path::absolute(dir).map_err(to_err)?;
    let wide = to_wide(abs.as_os_str());
    let cookie = unsafe { winapi::um::libloaderapi::AddDllDirectory(wide.as_ptr()) };
    if cookie.is_null() {
        Err(to_err(std::io::Error::last_os_error()))
    } else {
        Ok(())
    }
}

#[cfg(not(windows))]
pub fn add_dll_directory(_dir: &Path) -> Result<(), CheckError> {
    Err(CheckError::Unsupported(
        "DLL search directories only exist on Windows".to_owned(),
    ))
}
