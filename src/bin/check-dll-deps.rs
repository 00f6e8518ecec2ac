extern crate check_dll_deps;

use anyhow::Context;
use check_dll_deps::{check, path_to_string, CheckQuery};
use clap::builder::ValueParser;
use clap::{value_parser, Arg, ArgAction, Command};
use fs_err as fs;
use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;

/// Exit code for --fail-on-missing when something is missing
const EXIT_MISSING: i32 = 2;

/// Environment variable overriding the log filter
const LOG_ENV_VAR: &str = "CHECK_DLL_DEPS_LOG";

fn init_tracing(verbose: bool) -> anyhow::Result<()> {
    let level = if verbose { "debug" } else { "warn" };

    let filter = tracing_subscriber::EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    // stdout is reserved for the report
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}

fn cli() -> Command {
    Command::new("check-dll-deps")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Marco Esposito <marcoesposito1988@gmail.com>")
        .about("Check which DLLs lldb-dap.exe and liblldb.dll are missing")
        .arg(
            Arg::new("BIN_DIR")
                .help("Directory containing lldb-dap.exe and liblldb.dll")
                .index(1)
                .value_parser(ValueParser::os_string()),
        )
        .arg(
            Arg::new("DUMPBIN")
                .long("dumpbin")
                .value_name("DUMPBIN")
                .help("Path to dumpbin.exe (default: searched in the Visual Studio installations)")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("PROGRAM_FILES")
                .long("program-files")
                .value_name("DIR")
                .help("Directory to search Visual Studio in (default: %ProgramFiles%, or C:\\Program Files)")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("TARGET")
                .short('t')
                .long("target")
                .value_name("NAME")
                .help("Binary in BIN_DIR to check; can be repeated (default: lldb-dap.exe and liblldb.dll)")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("OUTPUT_JSON_PATH")
                .short('j')
                .long("output-json-path")
                .value_name("OUTPUT_JSON_PATH")
                .help("Path for output in JSON format")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("FAIL_ON_MISSING")
                .long("fail-on-missing")
                .action(ArgAction::SetTrue)
                .help("Exit with code 2 if a target binary or a dependency is missing, or the library fails to load"),
        )
        .arg(
            Arg::new("VERBOSE")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .help("Verbosity level"),
        )
}

fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();

    let verbose = matches.get_count("VERBOSE") > 0;
    init_tracing(verbose)?;

    let bin_dir = match matches.get_one::<OsString>("BIN_DIR") {
        Some(d) => PathBuf::from(d),
        None => {
            let program = std::env::args()
                .next()
                .unwrap_or_else(|| "check-dll-deps".to_owned());
            eprintln!("Usage: {} <bin-directory>", program);
            std::process::exit(1);
        }
    };

    let mut query = CheckQuery::deduce_from_bin_dir(&bin_dir)?;

    if !query.bin_dir.is_dir() {
        tracing::warn!(bin_dir = %query.bin_dir.display(), "binary directory does not exist");
    }

    // overrides

    if let Some(dumpbin) = matches.get_one::<PathBuf>("DUMPBIN") {
        query.dumpbin = Some(dumpbin.clone());
    }
    if let Some(program_files) = matches.get_one::<PathBuf>("PROGRAM_FILES") {
        query.program_files = program_files.clone();
    } else {
        tracing::debug!(
            "Visual Studio search root not specified, assumed {}",
            path_to_string(&query.program_files)
        );
    }
    if let Some(targets) = matches.get_many::<String>("TARGET") {
        query.targets = targets.cloned().collect();
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let report = check(&query, &mut out)?;
    out.flush()?;

    // JSON representation

    if let Some(json_output_path) = matches.get_one::<PathBuf>("OUTPUT_JSON_PATH") {
        let js = serde_json::to_string_pretty(&report).context("Error serializing")?;
        let json_display = json_output_path.display();

        let mut file = fs::File::create(json_output_path)
            .context(format!("couldn't create {}", json_display))?;
        file.write_all(js.as_bytes())
            .context(format!("couldn't write to {}", json_display))?;

        tracing::debug!("successfully wrote to {}", json_display);
    }

    if matches.get_flag("FAIL_ON_MISSING") && report.has_failures() {
        std::process::exit(EXIT_MISSING);
    }

    Ok(())
}
