//! Modules layer - infrastructure adapters
//!
//! Local file storage and the clients for the hosted AI providers.

pub mod ai;
pub mod storage;
