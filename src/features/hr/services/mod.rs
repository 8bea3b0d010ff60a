pub mod hr_service;

pub use hr_service::*;
