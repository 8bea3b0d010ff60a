pub mod hr_dto;

pub use hr_dto::*;
