//! Integration tests for tally-stats with on-disk transcripts.

use std::io::Write;

use tally_stats::{
    SessionFeedback, SessionReport, StatsError, TranscriptParser, estimate_cost, parse_transcript,
};
use tempfile::{NamedTempFile, tempdir};

/// Create a transcript file with the given content.
fn create_transcript(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::with_suffix(".jsonl").unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn sorted(mut paths: Vec<String>) -> Vec<String> {
    paths.sort();
    paths
}

/// A realistic session: prompt, tool round trips, a limit notice, noise.
const SESSION: &str = r#"{"type":"summary","summary":"Fix parser","leafUuid":"l-1"}
{"type":"user","timestamp":"2025-10-01T09:00:00.000Z","gitBranch":"main","version":"2.0.14","sessionId":"s-1","message":{"role":"user","content":"Why does the parser drop the last line?"}}
{"type":"assistant","timestamp":"2025-10-01T09:00:05.000Z","gitBranch":"main","version":"2.0.14","message":{"model":"claude-sonnet-4-5-20250929","role":"assistant","content":[{"type":"thinking","thinking":"..."},{"type":"tool_use","id":"t1","name":"Read","input":{"file_path":"/repo/src/parser.rs"}}],"usage":{"input_tokens":1200,"output_tokens":80,"cache_read_input_tokens":5000,"cache_creation_input_tokens":1000}}}
{"type":"user","timestamp":"2025-10-01T09:00:06.000Z","message":{"role":"user","content":[{"type":"tool_result","tool_use_id":"t1","content":"fn parse() {}"}]}}
{"type":"tool_result","timestamp":"2025-10-01T09:00:06.500Z","content":"fn parse() {}"}
[stderr] connection reset, retrying
{"type":"assistant","timestamp":"2025-10-01T09:00:12.000Z","gitBranch":"feature/other","message":{"model":"claude-opus-4","content":[{"type":"tool_use","id":"t2","name":"Edit","input":{"file_path":"/repo/src/parser.rs","old_string":"a","new_string":"b"}},{"type":"tool_use","id":"t3","name":"Bash","input":{"command":"cargo test"}}],"usage":{"input_tokens":300,"output_tokens":120}}}
{"type":"tool_result","timestamp":"2025-10-01T09:00:20.000Z","content":"error[E0308]: mismatched types"}
{"type":"tool_result","timestamp":"2025-10-01T09:00:21.000Z","is_error":true,"content":"exit code 101"}
{"type":"tool_use","timestamp":"2025-10-01T09:00:22.000Z","name":"Write"}
{"type":"system","timestamp":"2025-10-01T09:01:00.000Z","subtype":"informational","content":"5-hour limit reached ∙ resets 2pm"}
{"type":"file-history-snapshot","messageId":"m-9","snapshot":{}}
"#;

#[test]
fn test_parse_realistic_session() {
    let file = create_transcript(SESSION);
    let stats = TranscriptParser::new().parse_file(file.path()).unwrap();

    assert_eq!(stats.user_prompts, 2);
    assert_eq!(stats.assistant_responses, 2);
    assert_eq!(stats.tool_calls, 4);
    assert_eq!(stats.tool_counts["Read"], 1);
    assert_eq!(stats.tool_counts["Edit"], 1);
    assert_eq!(stats.tool_counts["Bash"], 1);
    assert_eq!(stats.tool_counts["Write"], 1);
    assert_eq!(stats.errors, 2);

    assert_eq!(stats.input_tokens, 1500);
    assert_eq!(stats.output_tokens, 200);
    assert_eq!(stats.cache_read_tokens, 5000);
    assert_eq!(stats.cache_write_tokens, 1000);

    assert_eq!(stats.model, "claude-sonnet-4-5-20250929");
    assert_eq!(stats.git_branch, "main");
    assert_eq!(stats.tool_version, "2.0.14");
    assert_eq!(stats.summary, "Why does the parser drop the last line?");

    assert_eq!(sorted(stats.accessed_files.clone()), vec!["/repo/src/parser.rs"]);
    assert_eq!(stats.modified_files, vec!["/repo/src/parser.rs"]);

    assert_eq!(
        stats.limit_message.as_deref(),
        Some("5-hour limit reached ∙ resets 2pm")
    );
    assert_eq!(stats.duration_secs(), 60.0);
}

#[test]
fn test_session_cost() {
    let file = create_transcript(SESSION);
    let stats = parse_transcript(file.path()).unwrap();

    // sonnet 4.5: 1500*3 + 200*15 + 5000*0.30 + 1000*3.75 micro-dollars
    assert_eq!(estimate_cost(&stats), 0.01275);
}

#[test]
fn test_token_and_cost_example() {
    let file = create_transcript(concat!(
        r#"{"type":"assistant","message":{"model":"claude-sonnet-4-5","usage":{"input_tokens":100,"output_tokens":50}}}"#,
        "\n",
        r#"{"type":"assistant","message":{"model":"claude-sonnet-4-5","usage":{"input_tokens":200,"output_tokens":75}}}"#,
        "\n",
    ));
    let stats = parse_transcript(file.path()).unwrap();

    assert_eq!(stats.input_tokens, 300);
    assert_eq!(stats.output_tokens, 125);
    assert_eq!(estimate_cost(&stats), 0.002775);
}

#[test]
fn test_reparse_is_deterministic() {
    let file = create_transcript(SESSION);
    let parser = TranscriptParser::new();

    let mut first = parser.parse_file(file.path()).unwrap();
    let mut second = parser.parse_file(file.path()).unwrap();
    first.accessed_files.sort();
    second.accessed_files.sort();
    first.modified_files.sort();
    second.modified_files.sort();

    assert_eq!(first, second);
}

#[test]
fn test_garbage_interleaving_does_not_change_result() {
    let clean: String = SESSION
        .lines()
        .filter(|line| line.starts_with('{'))
        .map(|line| format!("{line}\n"))
        .collect();
    let mut noisy = String::new();
    for line in clean.lines() {
        noisy.push_str("garbage {{{\n");
        noisy.push_str(line);
        noisy.push_str("\n\n");
    }
    noisy.push_str("{\"type\":\"assistant\",\"message\":");

    let clean_file = create_transcript(&clean);
    let noisy_file = create_transcript(&noisy);

    let mut a = parse_transcript(clean_file.path()).unwrap();
    let mut b = parse_transcript(noisy_file.path()).unwrap();
    a.accessed_files.sort();
    b.accessed_files.sort();

    assert_eq!(a, b);
}

#[test]
fn test_empty_file() {
    let file = create_transcript("");
    let stats = parse_transcript(file.path()).unwrap();

    assert_eq!(stats, tally_stats::Statistics::default());
    assert_eq!(stats.duration_secs(), 0.0);
    assert_eq!(estimate_cost(&stats), 0.0);
}

#[test]
fn test_missing_file_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing.jsonl");

    let err = parse_transcript(&path).unwrap_err();
    assert!(matches!(err, StatsError::Open { .. }));
    assert_eq!(err.path(), Some(&path));
}

#[test]
fn test_directory_is_not_a_transcript() {
    let dir = tempdir().unwrap();
    assert!(parse_transcript(dir.path()).is_err());
}

#[test]
fn test_report_round_trips_through_json() {
    let file = create_transcript(SESSION);
    let stats = parse_transcript(file.path()).unwrap();
    let report = SessionReport::new(stats).with_feedback(SessionFeedback {
        rating: Some(5),
        notes: Some("found the bug quickly".to_string()),
        tags: vec!["debugging".to_string()],
    });

    assert_eq!(report.pricing_model, "claude-sonnet-4-5");
    assert_eq!(report.duration_secs, 60.0);

    let json = serde_json::to_string(&report).unwrap();
    let back: SessionReport = serde_json::from_str(&json).unwrap();
    assert_eq!(back.stats, report.stats);
    assert_eq!(back.feedback, report.feedback);
    assert_eq!(back.pricing_model, report.pricing_model);
    assert!((back.cost_usd - report.cost_usd).abs() < 1e-12);
}
