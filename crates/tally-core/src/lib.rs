//! # tally-core
//!
//! Ambient plumbing shared by the tally crates.
//!
//! This crate provides:
//! - [`TallyError`] - Errors for configuration and bootstrap
//! - [`logging`] - Tracing setup
//! - [`config`] - YAML configuration loading
//!
//! ## Example
//!
//! ```no_run
//! use tally_core::{TallyConfig, logging};
//!
//! fn main() -> tally_core::Result<()> {
//!     let config = TallyConfig::load(None)?;
//!     let _guard = logging::init_logging(config.log_dir.clone(), false)?;
//!     tracing::info!(max_line_bytes = config.max_line_bytes, "configured");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;

pub use config::{OutputFormat, TallyConfig};
pub use error::{Result, TallyError};
pub use logging::{LogGuard, init_logging};
