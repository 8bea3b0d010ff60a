pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod workers;

pub use handlers::ResumeState;
pub use services::ResumeService;
pub use workers::ResumeParser;
