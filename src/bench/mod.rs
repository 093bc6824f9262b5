pub mod benchmark;
pub mod build;

pub use benchmark::BenchmarkManager;
pub use build::BuildManager;
