//! Server module for Trackside
//!
//! Contains the main server initialization and runtime logic.
//!
//! # Module Structure
//!
//! - `config`: Configuration structures for all server components
//! - `loader`: Configuration loading from files and environment
//! - `positions`: Live position view fed by telemetry
//! - `init`: Main server initialization and run loop

pub mod config;
mod init;
mod loader;
pub mod positions;

// Re-export public API
pub use init::run;
pub use loader::load_config;
