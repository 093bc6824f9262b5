use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use walkdir::WalkDir;

use crate::error::BenchError;

/// Compiles the fixture binaries with cargo and locates the executables the
/// dynamic tools need.
pub struct BuildManager {
    project_root: PathBuf,
    build_path: PathBuf,
}

impl BuildManager {
    pub fn new(project_root: &Path) -> Self {
        BuildManager {
            project_root: project_root.to_path_buf(),
            build_path: project_root.join("target"),
        }
    }

    /// Remove the build directory for a fresh start.
    pub fn clean_build(&self) -> io::Result<()> {
        if self.build_path.exists() {
            println!("Cleaning old build directory: {}", self.build_path.display());
            fs::remove_dir_all(&self.build_path)?;
        }
        Ok(())
    }

    /// Build every binary target in the project.
    pub fn run_build(&self) -> Result<(), BenchError> {
        println!("\n--- Starting build process ---");

        let output = Command::new("cargo")
            .args(["build", "--bins"])
            .current_dir(&self.project_root)
            .output()
            .map_err(|e| {
                if e.kind() == io::ErrorKind::NotFound {
                    BenchError::ToolMissing("cargo".to_string())
                } else {
                    BenchError::Io(e)
                }
            })?;

        if !output.status.success() {
            eprintln!("Build failed!");
            eprintln!("Error details:\n{}", String::from_utf8_lossy(&output.stderr));
            return Err(BenchError::BuildFailed);
        }

        println!("Build completed successfully!");
        Ok(())
    }

    /// Scan the debug binary directory and return the built executables,
    /// keyed by file stem so they pair up with the fixture sources.
    pub fn executables(&self) -> HashMap<String, PathBuf> {
        let mut executables = HashMap::new();
        let debug_path = self.build_path.join("debug");

        if !debug_path.exists() {
            return executables;
        }

        // Only the top level: deps/ and build/ hold intermediate artifacts
        let entries = WalkDir::new(&debug_path)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok());

        for entry in entries {
            let path = entry.path();
            if path.is_file() && is_executable(path) {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    executables.insert(stem.to_string(), path.to_path_buf());
                }
            }
        }

        executables
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    // Dep-info and other metadata files carry extensions; binaries do not
    if path.extension().is_some() {
        return false;
    }
    fs::metadata(path)
        .map(|meta| meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext == "exe")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn executables_skips_metadata_files() {
        use std::os::unix::fs::PermissionsExt;

        let root = tempfile::tempdir().unwrap();
        let debug = root.path().join("target/debug");
        fs::create_dir_all(&debug).unwrap();

        let exe = debug.join("leak_demo");
        fs::write(&exe, b"#!/bin/sh\n").unwrap();
        fs::set_permissions(&exe, fs::Permissions::from_mode(0o755)).unwrap();

        fs::write(debug.join("leak_demo.d"), b"dep info").unwrap();
        fs::write(debug.join("notes.txt"), b"not a binary").unwrap();

        let manager = BuildManager::new(root.path());
        let executables = manager.executables();

        assert_eq!(executables.len(), 1);
        assert_eq!(executables.get("leak_demo"), Some(&exe));
    }

    #[test]
    fn missing_build_directory_yields_no_executables() {
        let root = tempfile::tempdir().unwrap();
        let manager = BuildManager::new(root.path());

        assert!(manager.executables().is_empty());
    }

    #[test]
    fn clean_build_removes_the_target_directory() {
        let root = tempfile::tempdir().unwrap();
        let target = root.path().join("target");
        fs::create_dir_all(target.join("debug")).unwrap();

        let manager = BuildManager::new(root.path());
        manager.clean_build().unwrap();

        assert!(!target.exists());
    }
}
