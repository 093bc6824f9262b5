use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::process;

use membench::tools::ValgrindTool;
use membench::{utils, BenchmarkManager, BuildManager, DEFAULT_TOOL_TIMEOUT_SECONDS};

fn usage(program: &str) {
    eprintln!("Usage: {program} [project-root] [report-path] [options]");
    eprintln!("  [project-root]: directory holding the fixtures (default: .)");
    eprintln!("  [report-path]:  where to write the report (default: timestamped file under reports/)");
    eprintln!("  --clean:        remove the build directory first");
    eprintln!("  --no-build:     reuse already-built fixture binaries");
    eprintln!("  --static-only:  skip the build and the dynamic tools");
}

#[derive(Debug, Default)]
struct CliOptions {
    project_root: Option<PathBuf>,
    output: Option<PathBuf>,
    clean: bool,
    no_build: bool,
    static_only: bool,
    help: bool,
}

// Positionals are project root then report path; anything further is an
// error, like an unknown flag
fn parse_args(args: &[String]) -> Result<CliOptions, String> {
    let mut options = CliOptions::default();

    for arg in args {
        match arg.as_str() {
            "--clean" => options.clean = true,
            "--no-build" => options.no_build = true,
            "--static-only" => options.static_only = true,
            "--help" | "-h" => options.help = true,
            other if !other.starts_with('-') => {
                if options.project_root.is_none() {
                    options.project_root = Some(PathBuf::from(other));
                } else if options.output.is_none() {
                    options.output = Some(PathBuf::from(other));
                } else {
                    return Err(format!("Unexpected argument: {other}"));
                }
            }
            other => return Err(format!("Unknown option: {other}")),
        }
    }

    Ok(options)
}

fn main() {
    let args: Vec<String> = env::args().collect();

    let options = match parse_args(&args[1..]) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("{message}");
            usage(&args[0]);
            process::exit(2);
        }
    };
    if options.help {
        usage(&args[0]);
        return;
    }

    let project_root = options
        .project_root
        .unwrap_or_else(|| PathBuf::from("."));

    let mut manager = match BenchmarkManager::new(&project_root) {
        Ok(manager) => manager,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(2);
        }
    };

    let mut executables = HashMap::new();
    if options.static_only {
        println!("Static analysis only, skipping build and dynamic tools");
    } else {
        let builder = BuildManager::new(&project_root);
        if options.clean {
            if let Err(e) = builder.clean_build() {
                eprintln!("Error: {e}");
                process::exit(2);
            }
        }
        if !options.no_build {
            if let Err(e) = builder.run_build() {
                eprintln!("Error: {e}");
                process::exit(2);
            }
        }

        if utils::tool_available("valgrind") {
            manager.add_tool(Box::new(ValgrindTool::new(DEFAULT_TOOL_TIMEOUT_SECONDS)));
            executables = builder.executables();
        } else {
            eprintln!("Warning: valgrind is not installed, running static analysis only");
        }
    }

    let summary = manager.run_all(&executables);

    match manager.write_report(&summary, options.output.as_deref()) {
        Ok(path) => println!("Report written to: {}", path.display()),
        Err(e) => eprintln!("Error writing report: {e}"),
    }

    if !summary.all_matched() {
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn positionals_are_project_root_then_report_path() {
        let options = parse_args(&args(&["fixtures", "out/report.txt"])).unwrap();

        assert_eq!(options.project_root, Some(PathBuf::from("fixtures")));
        assert_eq!(options.output, Some(PathBuf::from("out/report.txt")));
    }

    #[test]
    fn defaults_leave_both_paths_unset() {
        let options = parse_args(&args(&["--static-only"])).unwrap();

        assert!(options.project_root.is_none());
        assert!(options.output.is_none());
        assert!(options.static_only);
    }

    #[test]
    fn a_third_positional_is_rejected() {
        let result = parse_args(&args(&["fixtures", "report.txt", "stray"]));

        assert_eq!(result.unwrap_err(), "Unexpected argument: stray");
    }

    #[test]
    fn unknown_flags_are_rejected() {
        let result = parse_args(&args(&["--frobnicate"]));

        assert_eq!(result.unwrap_err(), "Unknown option: --frobnicate");
    }

    #[test]
    fn flags_combine_with_positionals() {
        let options =
            parse_args(&args(&["--clean", "fixtures", "--no-build", "report.txt"])).unwrap();

        assert!(options.clean);
        assert!(options.no_build);
        assert_eq!(options.project_root, Some(PathBuf::from("fixtures")));
        assert_eq!(options.output, Some(PathBuf::from("report.txt")));
    }
}
