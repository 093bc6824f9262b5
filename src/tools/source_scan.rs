use std::fs;
use std::path::Path;

use syn::visit::Visit;

use crate::models::{DefectKind, Finding, Severity, ToolReport};
use crate::tools::{AnalysisTool, ToolTarget};
use crate::visitors::DefectVisitor;

const READ_ERROR_PREFIX: &str = "READ_ERROR";

/// Static analysis: parses a fixture source file with syn and walks it with
/// the defect visitor. The "raw output" of this tool is the source text
/// itself, so parsing failures surface as findings like any other tool error.
pub struct SourceScanTool;

impl SourceScanTool {
    pub fn new() -> Self {
        SourceScanTool
    }

    fn error_report(&self, kind: &str, message: String) -> ToolReport {
        ToolReport::new(
            self.name(),
            vec![Finding {
                kind: DefectKind::Other(kind.to_string()),
                severity: Severity::Critical,
                message,
                line: None,
                snippet: None,
            }],
        )
    }
}

impl Default for SourceScanTool {
    fn default() -> Self {
        SourceScanTool::new()
    }
}

impl AnalysisTool for SourceScanTool {
    fn name(&self) -> &str {
        "source-scan"
    }

    fn target(&self) -> ToolTarget {
        ToolTarget::Source
    }

    fn run_analysis(&self, source: &Path) -> String {
        println!("[source-scan] analyzing: {}", source.display());

        match fs::read_to_string(source) {
            Ok(text) => text,
            Err(e) => format!("{READ_ERROR_PREFIX}: {}: {e}", source.display()),
        }
    }

    fn parse_output(&self, raw: &str) -> ToolReport {
        if raw.starts_with(READ_ERROR_PREFIX) {
            return self.error_report("read error", raw.to_string());
        }

        let file = match syn::parse_file(raw) {
            Ok(file) => file,
            Err(e) => {
                return self.error_report("parse error", format!("failed to parse source: {e}"));
            }
        };

        let mut visitor = DefectVisitor::new();
        visitor.visit_file(&file);

        ToolReport::new(self.name(), visitor.findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leak_snippet_yields_one_memory_leak() {
        let tool = SourceScanTool::new();
        let report = tool.parse_output(
            r#"
            fn cause_memory_leak() {
                let data = Box::into_raw(Box::new([0i32; 10]));
                unsafe { (*data)[0] = 42; }
            }

            fn main() {
                cause_memory_leak();
            }
            "#,
        );

        assert!(!report.passed);
        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].kind, DefectKind::MemoryLeak);
    }

    #[test]
    fn overflow_snippet_yields_overflow_and_leak() {
        let tool = SourceScanTool::new();
        let report = tool.parse_output(
            r#"
            use std::ptr;

            fn buffer_overflow_example() {
                let mut buffer = [0u8; 10];
                let payload = b"ThisStringIsTooLongForBuffer\0";
                unsafe {
                    ptr::copy_nonoverlapping(payload.as_ptr(), buffer.as_mut_ptr(), payload.len());
                }
            }

            fn memory_leak_example() {
                let ptr = Box::into_raw(Box::new([0i32; 10]));
                unsafe { (*ptr)[0] = 100; }
            }

            fn main() {
                buffer_overflow_example();
                memory_leak_example();
            }
            "#,
        );

        assert_eq!(report.findings.len(), 2);
        let kinds: Vec<_> = report.findings.iter().map(|f| f.kind.clone()).collect();
        assert!(kinds.contains(&DefectKind::BufferOverflow));
        assert!(kinds.contains(&DefectKind::MemoryLeak));
    }

    #[test]
    fn clean_source_passes() {
        let tool = SourceScanTool::new();
        let report = tool.parse_output("fn main() { println!(\"hello\"); }");

        assert!(report.passed);
    }

    #[test]
    fn unparseable_source_is_a_critical_finding() {
        let tool = SourceScanTool::new();
        let report = tool.parse_output("fn broken( {");

        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].severity, Severity::Critical);
    }

    #[test]
    fn unreadable_files_surface_as_findings_not_panics() {
        let tool = SourceScanTool::new();
        let raw = tool.run_analysis(Path::new("/no/such/fixture.rs"));

        assert!(raw.starts_with(READ_ERROR_PREFIX));
        let report = tool.parse_output(&raw);
        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].severity, Severity::Critical);
    }
}
