//! Storage module for resume files
//!
//! Files live on the local filesystem under the configured upload
//! directory and are referenced by path from the resume rows.

mod local_storage;

pub use local_storage::LocalStorage;
