pub mod source_scan;
pub mod valgrind;

pub use source_scan::SourceScanTool;
pub use valgrind::ValgrindTool;

use std::path::Path;

use crate::models::ToolReport;

/// What a tool wants to be pointed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolTarget {
    /// Fixture source file, for static analysis.
    Source,
    /// Built fixture executable, for dynamic analysis.
    Executable,
}

/// One detection tool. Every tool runs in two steps: produce raw output,
/// then decode it into a structured report. `run` composes the two.
pub trait AnalysisTool: Send + Sync {
    fn name(&self) -> &str;

    fn target(&self) -> ToolTarget;

    /// Run the underlying tool against `path` and return its raw output.
    /// Failures come back as sentinel strings so `parse_output` can turn
    /// them into findings instead of aborting the benchmark.
    fn run_analysis(&self, path: &Path) -> String;

    /// Decode raw tool output into a structured report.
    fn parse_output(&self, raw: &str) -> ToolReport;

    fn run(&self, path: &Path) -> ToolReport {
        self.parse_output(&self.run_analysis(path))
    }
}
