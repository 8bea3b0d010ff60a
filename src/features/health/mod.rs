pub mod dto;
pub mod handler;
pub mod routes;

pub use dto::IntegrationFlags;
pub use handler::HealthState;
