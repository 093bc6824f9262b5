pub mod defect;

pub use defect::DefectVisitor;
