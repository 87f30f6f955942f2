//! Modules layer - Infrastructure components for external integrations
//!
//! Contains adapters for infrastructure such as file storage.

pub mod storage;
