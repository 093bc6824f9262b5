pub mod bench;
pub mod error;
pub mod models;
pub mod tools;
pub mod utils;
pub mod visitors;

// Re-export main types for convenience
pub use bench::benchmark::BenchmarkManager;
pub use bench::build::BuildManager;
pub use error::BenchError;

// Default configuration constants
pub const DEFAULT_TOOL_TIMEOUT_SECONDS: u64 = 20;
pub const DEFAULT_CONFIG_FILE: &str = "expected_results.json";
pub const DEFAULT_REPORTS_DIR: &str = "reports";
pub const DEFAULT_FIXTURES_DIR: &str = "src/bin";
