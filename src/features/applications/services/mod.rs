pub mod application_service;
pub mod matcher;

pub use application_service::*;
pub use matcher::{keyword_match, rank_matches, KeywordMatch};
