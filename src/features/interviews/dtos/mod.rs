pub mod interview_dto;

pub use interview_dto::*;
