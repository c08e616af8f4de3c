//! Data models for session statistics.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::pricing::{estimate_cost, resolve_pricing};

/// Aggregate statistics for one transcript.
///
/// Built by a single parse and handed to the caller by value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    /// Number of user (or human) entries
    pub user_prompts: u64,

    /// Number of assistant entries
    pub assistant_responses: u64,

    /// Number of tool invocations, nested or standalone
    pub tool_calls: u64,

    /// Number of tool results judged to be errors
    pub errors: u64,

    /// Tool invocations per tool name
    pub tool_counts: HashMap<String, u64>,

    /// Distinct file paths touched by file tools, in no particular order
    pub accessed_files: Vec<String>,

    /// Distinct file paths changed by modifying tools, in no particular order
    pub modified_files: Vec<String>,

    pub input_tokens: u64,
    pub output_tokens: u64,
    pub thinking_tokens: u64,
    pub cache_read_tokens: u64,
    pub cache_write_tokens: u64,

    /// First non-empty model name seen on an assistant entry
    pub model: String,

    /// First non-empty git branch
    pub git_branch: String,

    /// First non-empty CLI tool version
    pub tool_version: String,

    /// First 200 characters of the first non-empty user prompt
    pub summary: String,

    /// First valid timestamp
    pub start_time: Option<DateTime<Utc>>,

    /// Last valid timestamp, in file order
    pub end_time: Option<DateTime<Utc>>,

    /// Content of the most recent limit notice
    pub limit_message: Option<String>,
}

impl Statistics {
    /// Seconds between start and end, or zero if either is missing.
    ///
    /// Negative when timestamps in the file run backwards.
    pub fn duration_secs(&self) -> f64 {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => (end - start).num_milliseconds() as f64 / 1000.0,
            _ => 0.0,
        }
    }

    /// Total tokens (input + output + thinking + cache).
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens
            .saturating_add(self.output_tokens)
            .saturating_add(self.thinking_tokens)
            .saturating_add(self.cache_read_tokens)
            .saturating_add(self.cache_write_tokens)
    }
}

/// Caller-supplied quality feedback for a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionFeedback {
    /// Rating from 1 to 5
    pub rating: Option<u8>,

    /// Free-text notes
    pub notes: Option<String>,

    /// Category tags
    #[serde(default)]
    pub tags: Vec<String>,
}

impl SessionFeedback {
    /// True if no feedback was actually given.
    pub fn is_empty(&self) -> bool {
        self.rating.is_none() && self.notes.is_none() && self.tags.is_empty()
    }
}

/// Statistics plus the values derived from them, ready for persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub stats: Statistics,

    /// Derived session duration in seconds
    pub duration_secs: f64,

    /// Estimated cost in USD
    pub cost_usd: f64,

    /// Pricing table key the cost was computed with
    pub pricing_model: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<SessionFeedback>,
}

impl SessionReport {
    /// Derive duration and cost from finished statistics.
    pub fn new(stats: Statistics) -> Self {
        let pricing_model = resolve_pricing(&stats.model).model.to_string();
        Self {
            duration_secs: stats.duration_secs(),
            cost_usd: estimate_cost(&stats),
            pricing_model,
            stats,
            feedback: None,
        }
    }

    /// Attach feedback. Empty feedback is dropped.
    pub fn with_feedback(mut self, feedback: SessionFeedback) -> Self {
        self.feedback = (!feedback.is_empty()).then_some(feedback);
        self
    }
}
