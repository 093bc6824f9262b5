use std::io;
use std::path::Path;
use std::process::Command;
use std::time::Duration;

use regex::Regex;

use crate::error::BenchError;
use crate::models::{DefectKind, Finding, Severity, ToolReport};
use crate::tools::{AnalysisTool, ToolTarget};
use crate::utils;
use crate::DEFAULT_TOOL_TIMEOUT_SECONDS;

const TIMEOUT_SENTINEL: &str = "TIMEOUT_ERROR";
const NOT_INSTALLED_SENTINEL: &str = "VALGRIND_NOT_INSTALLED";
const GENERAL_ERROR_PREFIX: &str = "GENERAL_ERROR";

/// Dynamic analysis: runs a fixture executable under valgrind and decodes
/// the leak summary and invalid-access lines from its stderr.
pub struct ValgrindTool {
    timeout: Duration,
    patterns: Vec<(Regex, DefectKind, &'static str)>,
}

impl ValgrindTool {
    pub fn new(timeout_seconds: u64) -> Self {
        // Lost-bytes patterns capture the byte count so 0-byte losses can
        // be skipped; the rest match on presence alone.
        let patterns = vec![
            (
                Regex::new(r"definitely lost: ([0-9,]+) bytes").unwrap(),
                DefectKind::MemoryLeak,
                "Memory Leak (Definitely Lost)",
            ),
            (
                Regex::new(r"indirectly lost: ([0-9,]+) bytes").unwrap(),
                DefectKind::MemoryLeak,
                "Memory Leak (Indirectly Lost)",
            ),
            (
                Regex::new(r"Invalid read of size").unwrap(),
                DefectKind::InvalidRead,
                "Invalid Memory Read",
            ),
            (
                Regex::new(r"Invalid write of size").unwrap(),
                DefectKind::InvalidWrite,
                "Invalid Memory Write",
            ),
            (
                Regex::new(r"Mismatched free").unwrap(),
                DefectKind::MismatchedFree,
                "Mismatched Free/Delete",
            ),
        ];

        ValgrindTool {
            timeout: Duration::from_secs(timeout_seconds),
            patterns,
        }
    }

    fn sentinel_report(&self, kind: DefectKind, severity: Severity, message: &str) -> ToolReport {
        ToolReport::new(
            self.name(),
            vec![Finding {
                kind,
                severity,
                message: message.to_string(),
                line: None,
                snippet: None,
            }],
        )
    }
}

impl Default for ValgrindTool {
    fn default() -> Self {
        ValgrindTool::new(DEFAULT_TOOL_TIMEOUT_SECONDS)
    }
}

impl AnalysisTool for ValgrindTool {
    fn name(&self) -> &str {
        "valgrind"
    }

    fn target(&self) -> ToolTarget {
        ToolTarget::Executable
    }

    fn run_analysis(&self, executable: &Path) -> String {
        println!("[valgrind] analyzing: {}", executable.display());

        let mut command = Command::new("valgrind");
        command
            .args(["--leak-check=full", "--track-origins=yes"])
            .arg(executable);

        // Valgrind writes its report to stderr
        match utils::run_with_timeout(command, self.timeout) {
            Ok(output) => output.stderr,
            Err(BenchError::ToolTimeout(_)) => TIMEOUT_SENTINEL.to_string(),
            Err(BenchError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                NOT_INSTALLED_SENTINEL.to_string()
            }
            Err(e) => format!("{GENERAL_ERROR_PREFIX}: {e}"),
        }
    }

    fn parse_output(&self, raw: &str) -> ToolReport {
        if raw == TIMEOUT_SENTINEL {
            return self.sentinel_report(
                DefectKind::Other("timeout".to_string()),
                Severity::Error,
                "Execution timed out",
            );
        }
        if raw == NOT_INSTALLED_SENTINEL {
            return self.sentinel_report(
                DefectKind::Other("missing tool".to_string()),
                Severity::Critical,
                "Valgrind not installed",
            );
        }
        if raw.starts_with(GENERAL_ERROR_PREFIX) {
            return self.sentinel_report(
                DefectKind::Other("tool error".to_string()),
                Severity::Error,
                raw,
            );
        }

        let mut findings = Vec::new();
        for line in raw.lines() {
            for (pattern, kind, label) in &self.patterns {
                let Some(captures) = pattern.captures(line) else {
                    continue;
                };

                // The leak summary always prints, even for 0 lost bytes
                if let Some(bytes) = captures.get(1) {
                    let lost: u64 = bytes
                        .as_str()
                        .replace(',', "")
                        .parse()
                        .unwrap_or(0);
                    if lost == 0 {
                        continue;
                    }
                }

                findings.push(Finding {
                    kind: kind.clone(),
                    severity: Severity::Error,
                    message: format!("{label}: {}", line.trim()),
                    line: None,
                    snippet: None,
                });
                break;
            }
        }

        ToolReport::new(self.name(), findings)
    }
}
