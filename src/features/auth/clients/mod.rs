pub mod github_oauth_client;

pub use github_oauth_client::{GithubOAuthClient, GithubProfile};
