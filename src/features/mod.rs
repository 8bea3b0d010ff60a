pub mod applications;
pub mod auth;
pub mod candidate;
pub mod health;
pub mod hr;
pub mod interviews;
pub mod jobs;
pub mod realtime;
pub mod resumes;
pub mod users;
