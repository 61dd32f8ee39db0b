//! End-to-end CLI tests for igx.
//!
//! These tests run the actual igx binary and verify:
//! - Command-line interface behavior
//! - Output format and content
//! - Error handling and messages
//!
//! # Test Organization
//!
//! Tests are organized by command:
//! - `test_conversations_*`, `test_show_*` - Conversation listing and display
//! - `test_stats_*`, `test_sentiment_*` - Per-conversation analytics
//! - `test_followers_*`, `test_activity_*` - Connections and activity
//! - `test_export_*`, `test_extract_*`, `test_doctor_*` - Archive handling
//! - `test_cli_*`, `test_config_*` - General CLI tests (flags, help, version)
//!
//! # Logging
//!
//! All tests log their start, the paths involved and their duration.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tempfile::TempDir;

// =============================================================================
// Test Utilities
// =============================================================================

/// Log a test event with timestamp
macro_rules! test_log {
    ($($arg:tt)*) => {
        let timestamp = chrono::Utc::now().format("%H:%M:%S%.3f");
        eprintln!("[TEST {}] {}", timestamp, format!($($arg)*));
    };
}

const INBOX: &str = "your_instagram_activity/messages/inbox";
const FOLLOWERS: &str = "connections/followers_and_following/followers_1.json";
const FOLLOWING: &str = "connections/followers_and_following/following.json";
const LIKES: &str = "your_instagram_activity/likes/liked_posts.json";
const POSTS_VIEWED: &str = "ads_information/ads_and_topics/posts_viewed.json";

/// Files of a complete sample export, relative to its root.
fn sample_files() -> Vec<(String, String)> {
    vec![
        (format!("{INBOX}/alice_123456/message_1.json"), SAMPLE_ALICE.to_string()),
        (format!("{INBOX}/weekend_crew_987/message_1.json"), SAMPLE_GROUP.to_string()),
        (FOLLOWERS.to_string(), SAMPLE_FOLLOWERS.to_string()),
        (FOLLOWING.to_string(), SAMPLE_FOLLOWING.to_string()),
        (LIKES.to_string(), SAMPLE_LIKES.to_string()),
        (POSTS_VIEWED.to_string(), SAMPLE_POSTS_VIEWED.to_string()),
    ]
}

/// Create a test export directory with the given files
fn create_test_archive(files: &[(String, String)]) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let root = temp_dir.path().join("export");
    fs::create_dir_all(&root).expect("Failed to create export root");

    for (name, content) in files {
        let path = root.join(name);
        fs::create_dir_all(path.parent().expect("entry has a parent"))
            .expect("Failed to create entry directory");
        fs::write(&path, content).unwrap_or_else(|e| panic!("Failed to write {name}: {e}"));
    }

    (temp_dir, root)
}

/// Create the sample export as an extracted directory
fn create_sample_archive() -> (TempDir, PathBuf) {
    create_test_archive(&sample_files())
}

/// Write the sample export as a ZIP file inside `dir`
fn create_sample_zip(dir: &Path) -> PathBuf {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in sample_files() {
        writer
            .start_file(name, zip::write::SimpleFileOptions::default())
            .expect("Failed to start zip entry");
        writer
            .write_all(content.as_bytes())
            .expect("Failed to write zip entry");
    }
    let bytes = writer.finish().expect("Failed to finish zip").into_inner();

    let path = dir.join("instagram-export.zip");
    fs::write(&path, bytes).expect("Failed to write zip");
    path
}

/// Get the igx command ready for testing, isolated from the user's config
fn igx_cmd() -> Command {
    let mut cmd = cargo_bin_cmd!("igx");
    cmd.env("XDG_CONFIG_HOME", std::env::temp_dir().join("igx-e2e-no-config"))
        .env("NO_COLOR", "1")
        .env_remove("IGX_OWNER")
        .env_remove("IGX_FORMAT")
        .env_remove("IGX_ARCHIVE")
        .env_remove("IGX_QUIET");
    cmd
}

/// igx with the owner set to the sample export's owner
fn igx_owner_cmd() -> Command {
    let mut cmd = igx_cmd();
    cmd.args(["--owner", "Me"]);
    cmd
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    test_log!("stdout: {}", stdout);
    serde_json::from_str(&stdout).expect("stdout should be valid JSON")
}

// =============================================================================
// Sample Test Data
// =============================================================================

const SAMPLE_ALICE: &str = r#"{
    "participants": [{"name": "Alice"}, {"name": "Me"}],
    "messages": [
        {"sender_name": "Alice", "timestamp_ms": 1720000000000, "content": "Back again, this was a great trip"},
        {"sender_name": "Me", "timestamp_ms": 1700002400000, "content": "Sent an attachment."},
        {"sender_name": "Me", "timestamp_ms": 1700001800000, "content": "Sure, see you at the cafÃ©"},
        {"sender_name": "Alice", "timestamp_ms": 1700000000000, "content": "Hey, are we still on for Friday?"}
    ]
}"#;

const SAMPLE_GROUP: &str = r#"{
    "participants": [{"name": "Alice"}, {"name": "Bob"}, {"name": "Me"}],
    "messages": [
        {"sender_name": "Me", "timestamp_ms": 1700007200000, "content": "Count me in"},
        {"sender_name": "Bob", "timestamp_ms": 1700003600000, "content": "Who is in for Saturday?"}
    ]
}"#;

const SAMPLE_FOLLOWERS: &str = r#"[
    {"title": "", "string_list_data": [{"href": "https://www.instagram.com/alice", "value": "alice", "timestamp": 1690000000}]},
    {"title": "", "string_list_data": [{"href": "https://www.instagram.com/bob", "value": "bob", "timestamp": 1690000100}]}
]"#;

const SAMPLE_FOLLOWING: &str = r#"{"relationships_following": [
    {"title": "", "string_list_data": [{"href": "https://www.instagram.com/alice", "value": "alice", "timestamp": 1690000200}]},
    {"title": "", "string_list_data": [{"href": "https://www.instagram.com/dave", "value": "dave", "timestamp": 1690000300}]}
]}"#;

const SAMPLE_LIKES: &str = r#"{"likes_media_likes": [
    {"title": "bob", "string_list_data": [{"href": "https://www.instagram.com/p/abc/", "value": "like", "timestamp": 1700000100}]}
]}"#;

const SAMPLE_POSTS_VIEWED: &str = r#"{"impressions_history_posts_seen": [
    {"string_map_data": {"Author": {"value": "natgeo"}, "Time": {"timestamp": 1700000700}}},
    {"string_map_data": {"Author": {"value": "natgeo"}, "Time": {"timestamp": 1700000800}}}
]}"#;

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_cli_help() {
    test_log!("Starting test_cli_help");
    let start = Instant::now();

    igx_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("igx"))
        .stdout(predicate::str::contains("Usage"));

    test_log!("test_cli_help completed in {:?}", start.elapsed());
}

#[test]
fn test_cli_version() {
    test_log!("Starting test_cli_version");
    let start = Instant::now();

    igx_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("igx"));

    test_log!("test_cli_version completed in {:?}", start.elapsed());
}

#[test]
fn test_cli_no_args() {
    test_log!("Starting test_cli_no_args");
    let start = Instant::now();

    let output = igx_cmd().output().expect("Failed to run command");
    assert!(!output.status.success());
    assert!(!output.stderr.is_empty());

    test_log!("test_cli_no_args completed in {:?}", start.elapsed());
}

#[test]
fn test_cli_rejects_unknown_format() {
    test_log!("Starting test_cli_rejects_unknown_format");
    let (_temp_dir, root) = create_sample_archive();

    igx_owner_cmd()
        .args(["--format", "xml", "conversations"])
        .arg(&root)
        .assert()
        .failure()
        .stderr(predicate::str::contains("xml"));
}

#[test]
fn test_cli_missing_archive() {
    test_log!("Starting test_cli_missing_archive");
    let temp_dir = TempDir::new().unwrap();

    igx_owner_cmd()
        .arg("conversations")
        .arg(temp_dir.path().join("missing.zip"))
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("missing.zip"));
}

// =============================================================================
// Conversations Tests
// =============================================================================

#[test]
fn test_conversations_text() {
    test_log!("Starting test_conversations_text");
    let start = Instant::now();
    let (_temp_dir, root) = create_sample_archive();
    test_log!("Archive path: {:?}", root);

    igx_owner_cmd()
        .arg("conversations")
        .arg(&root)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 conversations"))
        .stdout(predicate::str::contains("@alice"))
        .stdout(predicate::str::contains("GROUP 2"));

    test_log!("test_conversations_text completed in {:?}", start.elapsed());
}

#[test]
fn test_conversations_json_most_recent_first() {
    test_log!("Starting test_conversations_json_most_recent_first");
    let (_temp_dir, root) = create_sample_archive();

    let output = igx_owner_cmd()
        .args(["--format", "json", "conversations"])
        .arg(&root)
        .output()
        .expect("Failed to run command");
    assert!(output.status.success());

    let json = stdout_json(&output);
    let list = json.as_array().expect("array of conversations");
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["conversation_id"], "alice_123456");
    assert_eq!(list[0]["username"], "alice");
    assert_eq!(list[0]["message_count"], 4);
    assert_eq!(list[1]["is_group_chat"], true);
}

#[test]
fn test_conversations_groups_filter() {
    test_log!("Starting test_conversations_groups_filter");
    let (_temp_dir, root) = create_sample_archive();

    let output = igx_owner_cmd()
        .args(["--format", "json", "conversations", "--groups"])
        .arg(&root)
        .output()
        .expect("Failed to run command");
    assert!(output.status.success());

    let json = stdout_json(&output);
    let list = json.as_array().expect("array of conversations");
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["conversation_id"], "weekend_crew_987");
    assert_eq!(list[0]["name"], "Alice, Bob");
}

#[test]
fn test_conversations_from_zip() {
    test_log!("Starting test_conversations_from_zip");
    let temp_dir = TempDir::new().unwrap();
    let zip_path = create_sample_zip(temp_dir.path());
    test_log!("Zip path: {:?}", zip_path);

    igx_owner_cmd()
        .arg("conversations")
        .arg(&zip_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Alice, Bob"));
}

#[test]
fn test_conversations_requires_owner() {
    test_log!("Starting test_conversations_requires_owner");
    let (_temp_dir, root) = create_sample_archive();

    igx_cmd()
        .arg("conversations")
        .arg(&root)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Owner name unknown"));
}

#[test]
fn test_conversations_infer_owner() {
    test_log!("Starting test_conversations_infer_owner");
    let (_temp_dir, root) = create_sample_archive();

    igx_cmd()
        .args(["--infer-owner", "conversations"])
        .arg(&root)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 conversations"));
}

// =============================================================================
// Show Tests
// =============================================================================

#[test]
fn test_show_hides_system_notices() {
    test_log!("Starting test_show_hides_system_notices");
    let (_temp_dir, root) = create_sample_archive();

    igx_owner_cmd()
        .arg("show")
        .arg(&root)
        .arg("alice_123456")
        .assert()
        .success()
        .stdout(predicate::str::contains("Hey, are we still on for Friday?"))
        .stdout(predicate::str::contains("see you at the café"))
        .stdout(predicate::str::contains("Sent an attachment.").not())
        .stdout(predicate::str::contains("3 of 4 messages shown"));
}

#[test]
fn test_show_all_and_limit() {
    test_log!("Starting test_show_all_and_limit");
    let (_temp_dir, root) = create_sample_archive();

    igx_owner_cmd()
        .arg("show")
        .arg(&root)
        .args(["alice_123456", "--all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Sent an attachment."));

    igx_owner_cmd()
        .arg("show")
        .arg(&root)
        .args(["alice_123456", "-n", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Back again"))
        .stdout(predicate::str::contains("Friday").not())
        .stdout(predicate::str::contains("1 of 4 messages shown"));
}

#[test]
fn test_show_unknown_conversation_suggests() {
    test_log!("Starting test_show_unknown_conversation_suggests");
    let (_temp_dir, root) = create_sample_archive();

    igx_owner_cmd()
        .arg("show")
        .arg(&root)
        .arg("alice_12345")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown conversation"))
        .stderr(predicate::str::contains("Did you mean 'alice_123456'?"));
}

// =============================================================================
// Stats and Sentiment Tests
// =============================================================================

#[test]
fn test_stats_text() {
    test_log!("Starting test_stats_text");
    let (_temp_dir, root) = create_sample_archive();

    igx_owner_cmd()
        .arg("stats")
        .arg(&root)
        .arg("alice_123456")
        .assert()
        .success()
        .stdout(predicate::str::contains("Alice"))
        .stdout(predicate::str::contains("Trend:"))
        .stdout(predicate::str::contains("30 min"));
}

#[test]
fn test_stats_json() {
    test_log!("Starting test_stats_json");
    let (_temp_dir, root) = create_sample_archive();

    let output = igx_owner_cmd()
        .args(["--format", "json", "stats"])
        .arg(&root)
        .arg("alice_123456")
        .output()
        .expect("Failed to run command");
    assert!(output.status.success());

    let json = stdout_json(&output);
    let stats = &json["message_stats"];
    assert_eq!(stats["total_messages"], 4);
    assert_eq!(stats["meaningful_messages"], 3);
    assert_eq!(stats["attachments"], 1);
    assert_eq!(stats["response_time"]["median_response_time"], 30.0);
    assert_eq!(stats["response_time"]["conversation_starters"]["Alice"], 2);
    assert_eq!(json["momentum"]["quiet_periods"].as_array().map(Vec::len), Some(1));
}

#[test]
fn test_stats_csv() {
    test_log!("Starting test_stats_csv");
    let (_temp_dir, root) = create_sample_archive();

    igx_owner_cmd()
        .args(["--format", "csv", "stats"])
        .arg(&root)
        .arg("alice_123456")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("metric,value"))
        .stdout(predicate::str::contains("meaningful_messages,3"));
}

#[test]
fn test_sentiment_text() {
    test_log!("Starting test_sentiment_text");
    let (_temp_dir, root) = create_sample_archive();

    igx_owner_cmd()
        .arg("sentiment")
        .arg(&root)
        .arg("alice_123456")
        .assert()
        .success()
        .stdout(predicate::str::contains("Overall:"))
        .stdout(predicate::str::contains("Positive:"));
}

#[test]
fn test_sentiment_json_counts_meaningful_only() {
    test_log!("Starting test_sentiment_json_counts_meaningful_only");
    let (_temp_dir, root) = create_sample_archive();

    let output = igx_owner_cmd()
        .args(["--format", "json", "sentiment"])
        .arg(&root)
        .arg("alice_123456")
        .output()
        .expect("Failed to run command");
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert_eq!(json["total_messages"], 3);
    assert_eq!(json["message_sentiments"].as_array().map(Vec::len), Some(3));
}

// =============================================================================
// Followers and Activity Tests
// =============================================================================

#[test]
fn test_followers_summary_without_owner() {
    test_log!("Starting test_followers_summary_without_owner");
    let (_temp_dir, root) = create_sample_archive();

    igx_cmd()
        .arg("followers")
        .arg(&root)
        .assert()
        .success()
        .stdout(predicate::str::contains("Mutual:"))
        .stdout(predicate::str::contains("1.00"));
}

#[test]
fn test_followers_mutual_json() {
    test_log!("Starting test_followers_mutual_json");
    let (_temp_dir, root) = create_sample_archive();

    let output = igx_cmd()
        .args(["--format", "json", "followers"])
        .arg(&root)
        .args(["--set", "mutual"])
        .output()
        .expect("Failed to run command");
    assert!(output.status.success());

    let json = stdout_json(&output);
    let list = json.as_array().expect("array of accounts");
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["username"], "alice");
}

#[test]
fn test_followers_missing_following_file() {
    test_log!("Starting test_followers_missing_following_file");
    let files: Vec<_> = sample_files()
        .into_iter()
        .filter(|(name, _)| name != FOLLOWING)
        .collect();
    let (_temp_dir, root) = create_test_archive(&files);

    igx_cmd()
        .arg("followers")
        .arg(&root)
        .assert()
        .failure()
        .stderr(predicate::str::contains("following.json"));
}

#[test]
fn test_activity_csv() {
    test_log!("Starting test_activity_csv");
    let (_temp_dir, root) = create_sample_archive();

    igx_cmd()
        .args(["--format", "csv", "activity"])
        .arg(&root)
        .assert()
        .success()
        .stdout(predicate::str::contains("likes,1"))
        .stdout(predicate::str::contains("comments,0"))
        .stdout(predicate::str::contains("posts_viewed,2"));
}

#[test]
fn test_followers_and_activity_ignore_infer_owner() {
    test_log!("Starting test_followers_and_activity_ignore_infer_owner");
    let files: Vec<_> = sample_files()
        .into_iter()
        .filter(|(name, _)| !name.starts_with(INBOX))
        .collect();
    let (_temp_dir, root) = create_test_archive(&files);

    igx_cmd()
        .args(["--infer-owner", "followers"])
        .arg(&root)
        .assert()
        .success()
        .stdout(predicate::str::contains("Mutual:"));

    igx_cmd()
        .args(["--infer-owner", "--format", "csv", "activity"])
        .arg(&root)
        .assert()
        .success()
        .stdout(predicate::str::contains("likes,1"));
}

// =============================================================================
// Export Tests
// =============================================================================

#[test]
fn test_export_csv_to_file() {
    test_log!("Starting test_export_csv_to_file");
    let (temp_dir, root) = create_sample_archive();
    let out = temp_dir.path().join("alice.csv");

    igx_owner_cmd()
        .arg("export")
        .arg(&root)
        .arg("alice_123456")
        .arg("-o")
        .arg(&out)
        .assert()
        .success()
        .stderr(predicate::str::contains("Exported to"));

    let content = fs::read_to_string(&out).expect("export written");
    test_log!("Export content:\n{}", content);
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines[0], "Date,Time,Sender,Message");
    assert_eq!(lines.len(), 4);
    assert!(lines[1].starts_with("2023-11-14,22:13:20,\"Alice\""));
    assert!(!content.contains("Sent an attachment."));
}

#[test]
fn test_export_json_to_directory() {
    test_log!("Starting test_export_json_to_directory");
    let (temp_dir, root) = create_sample_archive();
    let out_dir = temp_dir.path().join("exports");
    fs::create_dir_all(&out_dir).unwrap();

    igx_owner_cmd()
        .args(["--format", "json", "export"])
        .arg(&root)
        .arg("alice_123456")
        .arg("-o")
        .arg(&out_dir)
        .assert()
        .success();

    let path = out_dir.join("Alice_messages.json");
    let content = fs::read_to_string(&path).expect("export written under default name");
    let json: serde_json::Value = serde_json::from_str(&content).expect("valid JSON export");
    assert_eq!(json["id"], "alice_123456");
    assert_eq!(json["message_count"], 3);
}

#[test]
fn test_export_to_stdout() {
    test_log!("Starting test_export_to_stdout");
    let (_temp_dir, root) = create_sample_archive();

    igx_owner_cmd()
        .arg("export")
        .arg(&root)
        .arg("weekend_crew_987")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"Bob\",\"Who is in for Saturday?\""));
}

// =============================================================================
// Doctor and Extract Tests
// =============================================================================

#[test]
fn test_doctor_healthy_export() {
    test_log!("Starting test_doctor_healthy_export");
    let (_temp_dir, root) = create_sample_archive();

    igx_cmd()
        .arg("doctor")
        .arg(&root)
        .assert()
        .success()
        .stdout(predicate::str::contains("0 errors"));
}

#[test]
fn test_doctor_empty_export_fails() {
    test_log!("Starting test_doctor_empty_export_fails");
    let temp_dir = TempDir::new().unwrap();

    igx_cmd()
        .arg("doctor")
        .arg(temp_dir.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("3 errors"))
        .stderr(predicate::str::contains("check(s) failed"));
}

#[test]
fn test_extract_then_analyze() {
    test_log!("Starting test_extract_then_analyze");
    let start = Instant::now();
    let temp_dir = TempDir::new().unwrap();
    let zip_path = create_sample_zip(temp_dir.path());
    let dest = temp_dir.path().join("unpacked");

    igx_cmd()
        .arg("extract")
        .arg(&zip_path)
        .arg(&dest)
        .assert()
        .success()
        .stdout(predicate::str::contains("Extracted 6 files"));
    assert!(dest.join(FOLLOWERS).is_file());

    igx_owner_cmd()
        .arg("conversations")
        .arg(&dest)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 conversations"));

    // A second extraction into the same place is refused
    igx_cmd()
        .arg("extract")
        .arg(&zip_path)
        .arg(&dest)
        .assert()
        .failure()
        .stderr(predicate::str::contains("not empty"));

    test_log!("test_extract_then_analyze completed in {:?}", start.elapsed());
}

// =============================================================================
// Config and Completions Tests
// =============================================================================

#[test]
fn test_config_init_and_set() {
    test_log!("Starting test_config_init_and_set");
    let config_home = TempDir::new().unwrap();
    let config_file = config_home.path().join("igx").join("config.toml");

    igx_cmd()
        .env("XDG_CONFIG_HOME", config_home.path())
        .args(["config", "--init"])
        .assert()
        .success();
    assert!(config_file.is_file());

    igx_cmd()
        .env("XDG_CONFIG_HOME", config_home.path())
        .args(["config", "--set", "analysis.owner_name=Me"])
        .assert()
        .success();
    let content = fs::read_to_string(&config_file).unwrap();
    assert!(content.contains("owner_name = \"Me\""));

    // The stored owner is picked up by analysis commands
    let (_temp_dir, root) = create_sample_archive();
    igx_cmd()
        .env("XDG_CONFIG_HOME", config_home.path())
        .arg("conversations")
        .arg(&root)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 conversations"));
}

#[test]
fn test_config_set_unknown_key() {
    test_log!("Starting test_config_set_unknown_key");
    let config_home = TempDir::new().unwrap();

    igx_cmd()
        .env("XDG_CONFIG_HOME", config_home.path())
        .args(["config", "--set", "output.formt=json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("output.format"));
}

#[test]
fn test_config_show() {
    test_log!("Starting test_config_show");

    igx_cmd()
        .args(["config", "--show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Current Configuration"))
        .stdout(predicate::str::contains("[output]"));
}

#[test]
fn test_completions_bash() {
    test_log!("Starting test_completions_bash");

    igx_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("igx"));
}
