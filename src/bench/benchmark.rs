use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rayon::prelude::*;

use crate::error::BenchError;
use crate::models::{
    ExpectedBug, FixtureReport, GroundTruth, RunSummary, ToolReport, Verification,
};
use crate::tools::{AnalysisTool, SourceScanTool, ToolTarget};
use crate::utils;
use crate::{DEFAULT_CONFIG_FILE, DEFAULT_FIXTURES_DIR, DEFAULT_REPORTS_DIR};

/// One fixture the ground truth names, resolved to a real file.
pub struct FixtureTarget {
    pub filename: String,
    pub stem: String,
    pub path: PathBuf,
    pub expected: Vec<ExpectedBug>,
}

/// High level manager: finds the fixtures the ground truth names, runs the
/// active tools over each of them, and compares what the tools found with
/// the defects the user says are there.
pub struct BenchmarkManager {
    src_path: PathBuf,
    config_path: PathBuf,
    reports_path: PathBuf,
    ground_truth: GroundTruth,
    tools: Vec<Box<dyn AnalysisTool>>,
}

impl BenchmarkManager {
    /// Resolve project paths and load the ground truth. The static scanner
    /// is always active; dynamic tools are added by the caller once their
    /// availability is known.
    pub fn new(project_root: &Path) -> Result<Self, BenchError> {
        let src_path = project_root.join(DEFAULT_FIXTURES_DIR);
        let config_path = project_root.join(DEFAULT_CONFIG_FILE);
        let reports_path = project_root.join(DEFAULT_REPORTS_DIR);

        if !src_path.is_dir() {
            return Err(BenchError::InvalidConfig {
                path: src_path,
                reason: "fixture directory not found".to_string(),
            });
        }
        if !config_path.exists() {
            return Err(BenchError::InvalidConfig {
                path: config_path,
                reason: "missing ground truth file".to_string(),
            });
        }

        let ground_truth = Self::load_ground_truth(&config_path)?;

        Ok(BenchmarkManager {
            src_path,
            config_path,
            reports_path,
            ground_truth,
            tools: vec![Box::new(SourceScanTool::new())],
        })
    }

    fn load_ground_truth(path: &Path) -> Result<GroundTruth, BenchError> {
        let text = fs::read_to_string(path)?;
        let truth: GroundTruth = serde_json::from_str(&text)?;

        if truth.files.is_empty() {
            return Err(BenchError::InvalidConfig {
                path: path.to_path_buf(),
                reason: "'files' list is empty".to_string(),
            });
        }

        Ok(truth)
    }

    pub fn ground_truth(&self) -> &GroundTruth {
        &self.ground_truth
    }

    pub fn add_tool(&mut self, tool: Box<dyn AnalysisTool>) {
        self.tools.push(tool);
    }

    /// Resolve the ground truth entries to files that actually exist.
    /// Entries naming missing files are skipped with a warning.
    pub fn fixtures_to_test(&self) -> Vec<FixtureTarget> {
        let mut targets = Vec::new();

        for entry in &self.ground_truth.files {
            let path = self.src_path.join(&entry.filename);
            if !path.exists() {
                eprintln!(
                    "Warning: file defined in {} but not found: {}",
                    self.config_path.display(),
                    entry.filename
                );
                continue;
            }

            let stem = Path::new(&entry.filename)
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or(&entry.filename)
                .to_string();

            targets.push(FixtureTarget {
                filename: entry.filename.clone(),
                stem,
                path,
                expected: entry.bugs.clone(),
            });
        }

        targets
    }

    /// Run every active tool over every fixture and verify the results.
    /// `executables` maps fixture stems to built binaries; fixtures without
    /// one are skipped by the executable-targeting tools.
    pub fn run_all(&self, executables: &HashMap<String, PathBuf>) -> RunSummary {
        let fixtures = self.fixtures_to_test();
        if fixtures.is_empty() {
            println!("No fixture files found for testing");
            return RunSummary::default();
        }

        println!("\n--- Starting benchmark on {} fixtures ---", fixtures.len());

        let verifications = Mutex::new(Vec::new());
        let reports = Mutex::new(Vec::new());

        fixtures.par_iter().for_each(|fixture| {
            println!("\n[Fixture]: {}", fixture.filename);

            for tool in &self.tools {
                let target = match tool.target() {
                    ToolTarget::Source => fixture.path.clone(),
                    ToolTarget::Executable => match executables.get(&fixture.stem) {
                        Some(path) => path.clone(),
                        None => {
                            eprintln!(
                                "Warning: no built executable for {}, skipping {}",
                                fixture.filename,
                                tool.name()
                            );
                            continue;
                        }
                    },
                };

                let report = tool.run(&target);
                let verification = Verification {
                    fixture: fixture.filename.clone(),
                    tool: tool.name().to_string(),
                    expected: fixture.expected.len(),
                    found: report.findings.len(),
                };

                Self::print_verification(&verification, &report);

                verifications.lock().unwrap().push(verification);
                reports.lock().unwrap().push(FixtureReport {
                    fixture: fixture.filename.clone(),
                    report,
                });
            }
        });

        println!("\n--- Benchmark completed ---");

        RunSummary {
            verifications: verifications.into_inner().unwrap(),
            reports: reports.into_inner().unwrap(),
        }
    }

    // Console mini-report for one (fixture, tool) pair
    fn print_verification(verification: &Verification, report: &ToolReport) {
        println!("[Verification - {}] {}", verification.tool, verification.fixture);

        if verification.matched() {
            println!(
                "  SUCCESS: found {} defects as expected",
                verification.found
            );
        } else {
            println!(
                "  MISMATCH: found {} defects but expected to find {}",
                verification.found, verification.expected
            );
            for finding in &report.findings {
                let line = finding
                    .line
                    .map(|l| l.to_string())
                    .unwrap_or_else(|| "?".to_string());
                println!(
                    "    - line {} [{}] {}: {}",
                    line, finding.severity, finding.kind, finding.message
                );
            }
        }
    }

    /// Write the full run to `output`, or to a timestamped file under
    /// reports/ when no path is given, and return the path written.
    pub fn write_report(
        &self,
        summary: &RunSummary,
        output: Option<&Path>,
    ) -> io::Result<PathBuf> {
        let path = match output {
            Some(path) => path.to_path_buf(),
            None => {
                fs::create_dir_all(&self.reports_path)?;
                self.reports_path.join(format!(
                    "benchmark_{}.txt",
                    chrono::Local::now().format("%Y%m%d_%H%M%S")
                ))
            }
        };
        println!("Writing report to: {}", path.display());

        let file = File::create(&path)?;
        let mut writer = BufWriter::new(file);

        writeln!(writer, "membench report")?;
        writeln!(
            writer,
            "Generated: {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        )?;

        for fixture_report in &summary.reports {
            writeln!(writer, "\n{}", "=".repeat(60))?;
            writeln!(
                writer,
                "Fixture: {}  Tool: {}  Clean: {}",
                fixture_report.fixture, fixture_report.report.tool, fixture_report.report.passed
            )?;

            for finding in &fixture_report.report.findings {
                match finding.line {
                    Some(line) => writeln!(
                        writer,
                        "- line {} [{}] {}: {}",
                        line, finding.severity, finding.kind, finding.message
                    )?,
                    None => writeln!(
                        writer,
                        "- [{}] {}: {}",
                        finding.severity, finding.kind, finding.message
                    )?,
                }

                if let Some(snippet) = &finding.snippet {
                    for line in utils::beautify_snippet(snippet).lines() {
                        writeln!(writer, "    {line}")?;
                    }
                }
            }
        }

        writeln!(writer, "\n{}", "=".repeat(60))?;
        writeln!(writer, "Verification")?;
        for verification in &summary.verifications {
            writeln!(
                writer,
                "{} / {}: expected {}, found {} -> {}",
                verification.fixture,
                verification.tool,
                verification.expected,
                verification.found,
                if verification.matched() {
                    "MATCH"
                } else {
                    "MISMATCH"
                }
            )?;
        }

        Ok(path)
    }
}
