pub mod resume_handler;

pub use resume_handler::*;
