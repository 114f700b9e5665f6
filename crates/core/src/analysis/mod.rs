pub mod detector;
pub mod merger;
pub mod pipeline;
pub mod scorer;
pub mod topic;

pub use pipeline::RiskPipeline;
