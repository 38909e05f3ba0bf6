//! CLI command implementations.

pub mod batch;
pub mod common;
pub mod init;
pub mod render;
