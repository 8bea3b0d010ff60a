pub mod events;
pub mod handlers;
pub mod hub;
pub mod routes;

pub use events::RealtimeEvent;
pub use handlers::RealtimeState;
pub use hub::{Audience, EventHub};
