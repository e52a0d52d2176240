//! CLI command implementations.

pub mod build;
pub mod bundle;
pub mod clean;
pub mod init;
pub mod inspect;
