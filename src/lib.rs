pub mod normalize;
pub mod classify;
pub mod config;
pub mod error;
pub mod record;
pub mod timestamp;
pub mod ingest;
pub mod aggregate;
pub mod pipeline;
pub mod render;

pub use aggregate::Report;
pub use config::{DescriptorField, ReportConfig, Variant};
pub use error::ReportError;
pub use pipeline::build_report;
