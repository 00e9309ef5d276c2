pub mod config;
pub mod error;
pub mod extension;
pub mod types;
