pub mod resume_dto;

pub use resume_dto::*;
