use std::fmt;

use serde::Deserialize;

// Defect classes the harness knows how to report
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefectKind {
    MemoryLeak,     // heap allocation with no remaining owner
    BufferOverflow, // write past the declared extent of a buffer
    InvalidRead,    // read of memory the program does not own
    InvalidWrite,   // write to memory the program does not own
    MismatchedFree, // allocation and release primitives disagree
    Other(String),  // anything a tool reports that fits no class above
}

impl fmt::Display for DefectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefectKind::MemoryLeak => write!(f, "memory_leak"),
            DefectKind::BufferOverflow => write!(f, "buffer_overflow"),
            DefectKind::InvalidRead => write!(f, "invalid_read"),
            DefectKind::InvalidWrite => write!(f, "invalid_write"),
            DefectKind::MismatchedFree => write!(f, "mismatched_free"),
            DefectKind::Other(desc) => write!(f, "other: {desc}"),
        }
    }
}

// Finding severity; only these three levels count as failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// A single defect reported by one tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub kind: DefectKind,
    pub severity: Severity,
    pub message: String,
    pub line: Option<usize>,    // 1-based source line, when the tool knows it
    pub snippet: Option<String>, // source of the flagged function, when available
}

/// Structured result of running one tool over one target.
#[derive(Debug, Clone)]
pub struct ToolReport {
    pub tool: String,
    pub passed: bool, // true iff the tool reported nothing
    pub findings: Vec<Finding>,
}

impl ToolReport {
    pub fn new(tool: &str, findings: Vec<Finding>) -> Self {
        ToolReport {
            tool: tool.to_string(),
            passed: findings.is_empty(),
            findings,
        }
    }
}

// Ground truth: the defects each fixture is known to carry, maintained by
// hand in expected_results.json
#[derive(Debug, Clone, Deserialize)]
pub struct GroundTruth {
    pub files: Vec<FixtureEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixtureEntry {
    pub filename: String,
    #[serde(default)]
    pub bugs: Vec<ExpectedBug>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExpectedBug {
    #[serde(rename = "type")]
    pub bug_type: String,
    #[serde(default)]
    pub line: Option<usize>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Found-vs-expected comparison for one (fixture, tool) pair.
#[derive(Debug, Clone)]
pub struct Verification {
    pub fixture: String,
    pub tool: String,
    pub expected: usize,
    pub found: usize,
}

impl Verification {
    pub fn matched(&self) -> bool {
        self.expected == self.found
    }
}

/// Full tool output kept for the written report.
#[derive(Debug, Clone)]
pub struct FixtureReport {
    pub fixture: String,
    pub report: ToolReport,
}

/// Everything one benchmark run produced.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub verifications: Vec<Verification>,
    pub reports: Vec<FixtureReport>,
}

impl RunSummary {
    pub fn all_matched(&self) -> bool {
        self.verifications.iter().all(|v| v.matched())
    }
}
