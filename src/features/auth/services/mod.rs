pub mod auth_service;
pub mod oauth_state;
pub mod password;
pub mod token_service;

pub use auth_service::AuthService;
pub use oauth_state::OAuthStateSigner;
pub use token_service::TokenService;
