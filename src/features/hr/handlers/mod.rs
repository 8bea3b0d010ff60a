pub mod hr_handler;

pub use hr_handler::*;
