//! Storage module for uploaded files
//!
//! Provides local-disk storage whose contents are served statically.

mod local_storage;

pub use local_storage::LocalStorage;
