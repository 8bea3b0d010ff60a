pub mod parser;
pub mod response;

pub use parser::parse_with_fallback;
pub use response::LlmResponse;
