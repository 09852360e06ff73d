//! Infrastructure layer
//!
//! Contains storage-backed implementations of the domain repositories.

pub mod concept;
