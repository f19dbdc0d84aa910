pub mod aggregate;
pub mod broad;
pub mod detailed;
pub mod error;
pub mod prompts;
pub mod scorer;

pub use aggregate::aggregate;
pub use broad::BroadAnalysis;
pub use error::AnalysisError;
pub use scorer::Scorer;
