//! # tally-stats
//!
//! Session statistics and cost estimation for CLI assistant transcripts.
//!
//! This crate provides:
//! - [`TranscriptParser`] - Fold a JSON Lines transcript into [`Statistics`]
//! - [`StatsAccumulator`] - The fold itself, for callers that decode entries
//! - [`estimate_cost`] - Price finished statistics against the model table
//! - [`SessionReport`] - Statistics plus derived cost, duration, and feedback
//!
//! ## Example
//!
//! ```no_run
//! use tally_stats::{SessionReport, TranscriptParser, estimate_cost};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let stats = TranscriptParser::new().parse_file("session.jsonl")?;
//!     println!("{} prompts, ${:.6}", stats.user_prompts, estimate_cost(&stats));
//!
//!     let report = SessionReport::new(stats);
//!     println!("{}", serde_json::to_string_pretty(&report)?);
//!     Ok(())
//! }
//! ```

pub mod entry;
pub mod error;
pub mod limit;
pub mod models;
pub mod parser;
pub mod pricing;
pub mod tools;

// Re-export main types
pub use entry::{EntryKind, TranscriptEntry, decode_line};
pub use error::{Result, StatsError};
pub use models::{SessionFeedback, SessionReport, Statistics};
pub use parser::{StatsAccumulator, TranscriptParser, parse_transcript};
pub use pricing::{PricingRecord, estimate_cost, resolve_pricing};
