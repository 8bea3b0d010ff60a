pub mod interview;

pub use interview::*;
