use crate::common::CheckError;
use crate::dumpbin::{find_dumpbin, get_dependents};
use crate::query::CheckQuery;
use crate::report::{
    write_binary_report, write_fallback_outcome, BinaryReport, CheckReport, FallbackOutcome,
};
use crate::resolve::classify_all;
use crate::system::Loader;
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Run the whole check, printing the report to `out` as it goes
///
/// Locates dumpbin (unless the query names one) and checks every target; without dumpbin
/// the fallback direct load is attempted instead
pub fn run<L: Loader + ?Sized, W: Write>(
    query: &CheckQuery,
    loader: &L,
    out: &mut W,
) -> Result<CheckReport, CheckError> {
    let dumpbin = query
        .dumpbin
        .clone()
        .or_else(|| find_dumpbin(&query.program_files));

    let mut report = CheckReport::new(&query.bin_dir, dumpbin.clone());

    match dumpbin {
        Some(dumpbin) => {
            for target in &query.targets {
                let binary = check_binary(query, target, &dumpbin, loader);
                write_binary_report(out, &binary, &query.bin_dir)?;
                report.binaries.push(binary);
            }
        }
        None => {
            report.fallback = Some(run_fallback(query, loader, out)?);
        }
    }

    Ok(report)
}

/// List and classify the dependencies of one target
pub fn check_binary<L: Loader + ?Sized>(
    query: &CheckQuery,
    target: &str,
    dumpbin: &Path,
    loader: &L,
) -> BinaryReport {
    let path = query.target_path(target);
    if !path.exists() {
        debug!(binary = %path.display(), "binary not found");
        return BinaryReport::not_found(target, path);
    }

    let dependencies = classify_all(get_dependents(dumpbin, &path), &query.bin_dir, loader);
    BinaryReport {
        name: target.to_owned(),
        path,
        found: true,
        dependencies,
    }
}

/// Without dumpbin, the best we can do is try loading the main library with its directory on the
/// search path, and report what the loader says
pub fn run_fallback<L: Loader + ?Sized, W: Write>(
    query: &CheckQuery,
    loader: &L,
    out: &mut W,
) -> Result<FallbackOutcome, CheckError> {
    writeln!(out, "dumpbin.exe not found - cannot check dependencies")?;
    writeln!(
        out,
        "Trying direct load test of {} instead...",
        query.primary_library
    )?;

    let attempt = loader
        .add_dll_directory(&query.bin_dir)
        .and_then(|_| loader.prepend_search_path(&query.bin_dir))
        .and_then(|_| loader.load_library(&query.primary_library_path()));

    let outcome = FallbackOutcome {
        library: query.primary_library.clone(),
        loaded: attempt.is_ok(),
        error: attempt.err().map(|e| e.to_string()),
    };
    write_fallback_outcome(out, &outcome)?;
    Ok(outcome)
}
