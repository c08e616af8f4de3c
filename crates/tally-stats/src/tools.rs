//! Tool invocation counting and file path tracking.

use std::collections::{HashMap, HashSet};

use serde_json::value::RawValue;
use serde_json::{Map, Value};

/// Name recorded for tool calls without a usable name.
pub const UNKNOWN_TOOL: &str = "unknown";

/// Tools whose input may name a file.
pub const FILE_TOOLS: &[&str] = &[
    "Read",
    "Write",
    "Edit",
    "MultiEdit",
    "NotebookRead",
    "NotebookEdit",
    "Glob",
    "Grep",
    "LS",
];

/// Subset of [`FILE_TOOLS`] that change the file they name.
pub const MODIFYING_TOOLS: &[&str] = &["Write", "Edit", "MultiEdit", "NotebookEdit"];

/// Input fields checked for a file path, in priority order.
const PATH_FIELDS: &[&str] = &["file_path", "path", "notebook_path"];

/// Running tool usage for one session.
#[derive(Debug, Default)]
pub struct ToolUsage {
    pub calls: u64,
    pub by_name: HashMap<String, u64>,
    pub accessed: HashSet<String>,
    pub modified: HashSet<String>,
}

impl ToolUsage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one call of `name` without inspecting its input.
    pub fn record_call(&mut self, name: &str) {
        let name = if name.is_empty() { UNKNOWN_TOOL } else { name };
        self.calls += 1;
        *self.by_name.entry(name.to_string()).or_insert(0) += 1;
    }

    /// Count one call of `name` and track any file path in its input.
    ///
    /// Paths are only taken from tools in [`FILE_TOOLS`]; tools in
    /// [`MODIFYING_TOOLS`] also mark the path as modified.
    pub fn record(&mut self, name: &str, input: Option<&RawValue>) {
        self.record_call(name);

        if !FILE_TOOLS.contains(&name) {
            return;
        }
        let Some(path) = input.and_then(extract_path) else {
            return;
        };

        if MODIFYING_TOOLS.contains(&name) {
            self.modified.insert(path.clone());
        }
        self.accessed.insert(path);
    }
}

/// First non-empty path field of a tool input object.
fn extract_path(input: &RawValue) -> Option<String> {
    let fields: Map<String, Value> = serde_json::from_str(input.get()).ok()?;
    PATH_FIELDS
        .iter()
        .filter_map(|key| fields.get(*key).and_then(Value::as_str))
        .find(|path| !path.is_empty())
        .map(str::to_string)
}
