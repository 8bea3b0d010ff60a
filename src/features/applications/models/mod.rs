pub mod application;
pub mod match_analysis;

pub use application::*;
pub use match_analysis::MatchAnalysis;
