pub mod commands;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod manifest;
pub mod platform;
pub mod release;
pub mod runtime;
