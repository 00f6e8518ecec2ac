extern crate thiserror;

pub mod common;
pub mod dumpbin;
pub mod query;
pub mod report;
pub mod resolve;
pub mod runner;
pub mod system;

pub use common::{decanonicalize, path_to_string, CheckError};
pub use query::CheckQuery;
pub use report::{BinaryReport, CheckReport, Dependency, DependencyStatus, FallbackOutcome};
pub use system::{Loader, SystemLoader};

/// Check the binaries described by the query against the DLLs available on this system,
/// printing the report to `out`
pub fn check<W: std::io::Write>(query: &CheckQuery, out: &mut W) -> Result<CheckReport, CheckError> {
    runner::run(query, &SystemLoader::new(), out)
}
