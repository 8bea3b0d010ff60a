pub mod user;

pub use user::{DeletedAccount, NewUser, User, UserRole};
