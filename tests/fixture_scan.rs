//! End-to-end checks of the static scanner against the real fixture
//! sources shipped in src/bin.

use std::collections::HashMap;
use std::path::PathBuf;

use membench::models::DefectKind;
use membench::tools::{AnalysisTool, SourceScanTool};
use membench::BenchmarkManager;

fn project_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

#[test]
fn leak_fixture_carries_exactly_one_leak() {
    let tool = SourceScanTool::new();
    let report = tool.run(&project_root().join("src/bin/leak_demo.rs"));

    assert_eq!(report.findings.len(), 1);
    assert_eq!(report.findings[0].kind, DefectKind::MemoryLeak);
    assert_eq!(report.findings[0].line, Some(7));
}

#[test]
fn overflow_fixture_carries_an_overflow_and_a_leak() {
    let tool = SourceScanTool::new();
    let report = tool.run(&project_root().join("src/bin/overflow_demo.rs"));

    assert_eq!(report.findings.len(), 2);

    let overflow = report
        .findings
        .iter()
        .find(|f| f.kind == DefectKind::BufferOverflow)
        .expect("overflow finding");
    assert_eq!(overflow.line, Some(17));
    assert!(overflow.message.contains("29 bytes"));
    assert!(overflow.message.contains("capacity 10"));

    let leak = report
        .findings
        .iter()
        .find(|f| f.kind == DefectKind::MemoryLeak)
        .expect("leak finding");
    assert_eq!(leak.line, Some(25));
}

#[test]
fn static_scan_agrees_with_the_shipped_ground_truth() {
    let manager = BenchmarkManager::new(&project_root()).expect("valid project layout");

    // No executables: only the static scanner runs.
    let summary = manager.run_all(&HashMap::new());

    assert_eq!(summary.verifications.len(), 2);
    assert!(summary.all_matched(), "verifications: {:?}", summary.verifications);
}
