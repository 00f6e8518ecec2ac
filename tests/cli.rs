use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

fn check_dll_deps() -> Command {
    let mut cmd = Command::cargo_bin("check-dll-deps").unwrap();
    cmd.env_remove("CHECK_DLL_DEPS_LOG");
    cmd
}

fn scenario_transcript() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_data/dumpbin/scenario.txt")
}

#[test]
fn usage_without_arguments() {
    check_dll_deps()
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Usage:").and(predicate::str::contains("<bin-directory>")));
}

#[test]
fn fallback_when_dumpbin_is_nowhere() {
    let bin = tempdir().unwrap();
    let program_files = tempdir().unwrap();
    fs::write(bin.path().join("liblldb.dll"), b"").unwrap();

    let assert = check_dll_deps()
        .arg(bin.path())
        .env("ProgramFiles", program_files.path())
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "dumpbin.exe not found - cannot check dependencies\n\
             Trying direct load test of liblldb.dll instead...\n",
        ));

    // an empty file is not a loadable DLL, and elsewhere nothing loads at all
    assert.stdout(predicate::str::contains("liblldb.dll FAILED to load: "));
}

#[test]
fn fallback_failure_with_fail_on_missing() {
    let bin = tempdir().unwrap();
    let program_files = tempdir().unwrap();

    check_dll_deps()
        .arg(bin.path())
        .arg("--fail-on-missing")
        .arg("--program-files")
        .arg(program_files.path())
        .assert()
        .code(2)
        .stdout(predicate::str::contains("liblldb.dll FAILED to load: "));
}

// `cat /dependents <file>` prints the transcript stored in the target file
#[cfg(unix)]
#[test]
fn reports_missing_dependency() {
    let bin = tempdir().unwrap();
    let program_files = tempdir().unwrap();
    fs::copy(scenario_transcript(), bin.path().join("lldb-dap.exe")).unwrap();
    fs::copy(scenario_transcript(), bin.path().join("liblldb.dll")).unwrap();

    check_dll_deps()
        .arg(bin.path())
        .args(["--dumpbin", "/bin/cat"])
        .env("ProgramFiles", program_files.path())
        .assert()
        .success()
        .stdout(
            predicate::str::contains("--- lldb-dap.exe (3 dependencies) ---\n  liblldb.dll: bundled\n")
                .and(predicate::str::contains("--- liblldb.dll (3 dependencies) ---"))
                .and(predicate::str::contains("  bogus-missing.dll: MISSING\n"))
                // nothing loads outside Windows, so KERNEL32.dll is missing as well
                .and(predicate::str::contains(
                    "  ** 2 MISSING: KERNEL32.dll, bogus-missing.dll\n",
                )),
        );
}

#[cfg(unix)]
#[test]
fn missing_executable_does_not_stop_the_check() {
    let bin = tempdir().unwrap();
    fs::write(bin.path().join("liblldb.dll"), "    liblldb.dll\n").unwrap();
    let expected = format!(
        "lldb-dap.exe: not found in {}\n\
         --- liblldb.dll (1 dependencies) ---\n\
         \x20 liblldb.dll: bundled\n\
         \x20 All dependencies satisfied.\n",
        bin.path().display()
    );

    check_dll_deps()
        .arg(bin.path())
        .args(["--dumpbin", "/bin/cat"])
        .assert()
        .success()
        .stdout(expected.clone());

    // the absent executable still counts as a failure when asked
    check_dll_deps()
        .arg(bin.path())
        .args(["--dumpbin", "/bin/cat", "--fail-on-missing"])
        .assert()
        .code(2)
        .stdout(expected);
}

#[cfg(unix)]
#[test]
fn empty_bin_dir_means_current_dir() {
    let bin = tempdir().unwrap();
    fs::write(bin.path().join("liblldb.dll"), "    liblldb.dll\n").unwrap();

    check_dll_deps()
        .current_dir(bin.path())
        .args(["", "--dumpbin", "/bin/cat"])
        .assert()
        .success()
        .stdout(
            "lldb-dap.exe: not found in .\n\
             --- liblldb.dll (1 dependencies) ---\n\
             \x20 liblldb.dll: bundled\n\
             \x20 All dependencies satisfied.\n",
        )
        .stderr(predicate::str::contains("does not exist").not());
}

#[cfg(unix)]
#[test]
fn missing_dependencies_only_fail_on_request() {
    let bin = tempdir().unwrap();
    fs::copy(scenario_transcript(), bin.path().join("lldb-dap.exe")).unwrap();

    check_dll_deps()
        .arg(bin.path())
        .args(["--dumpbin", "/bin/cat", "-t", "lldb-dap.exe"])
        .assert()
        .success();

    check_dll_deps()
        .arg(bin.path())
        .args(["--dumpbin", "/bin/cat", "-t", "lldb-dap.exe", "--fail-on-missing"])
        .assert()
        .code(2);
}

#[cfg(unix)]
#[test]
fn json_report() {
    let bin = tempdir().unwrap();
    let out = tempdir().unwrap();
    let json_path = out.path().join("report.json");
    fs::copy(scenario_transcript(), bin.path().join("lldb-dap.exe")).unwrap();

    check_dll_deps()
        .arg(bin.path())
        .args(["--dumpbin", "/bin/cat", "--target", "lldb-dap.exe", "-j"])
        .arg(&json_path)
        .assert()
        .success();

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(report["dumpbin"], "/bin/cat");
    assert!(report["fallback"].is_null());
    let binaries = report["binaries"].as_array().unwrap();
    assert_eq!(binaries.len(), 1);
    assert_eq!(binaries[0]["name"], "lldb-dap.exe");
    assert_eq!(binaries[0]["found"], true);
    let deps = binaries[0]["dependencies"].as_array().unwrap();
    assert_eq!(deps[0]["dllname"], "liblldb.dll");
    assert_eq!(deps[0]["status"], "missing");
    assert_eq!(deps[2]["dllname"], "bogus-missing.dll");
    assert_eq!(deps[2]["status"], "missing");
}
