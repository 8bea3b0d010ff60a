pub mod dtos;
pub mod handlers;
pub mod routes;
pub mod services;

pub use handlers::CandidateState;
pub use services::CandidateService;
