pub mod candidate_handler;

pub use candidate_handler::*;
