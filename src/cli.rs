//! CLI definitions for igx.
//!
//! Uses clap for argument parsing with derive macros.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// igx - Instagram data export analytics
#[derive(Parser, Debug)]
#[command(name = "igx")]
#[command(version)]
#[command(about = "Analyze the conversations and connections in an Instagram data export")]
#[command(long_about = r#"
igx reads the JSON export from Instagram's "Download your information" page,
either as the downloaded .zip or as an extracted directory, and reports on
its conversations, connections and activity.

Features:
  - Conversation listing with group detection
  - Response time, momentum and sentiment analysis per conversation
  - Mutual / followers-only / following-only account sets
  - Repair of the export's mis-encoded text (emoji, accents)
  - CSV and JSON export of conversations

Quick start:
  1. Request a JSON export from Instagram's Accounts Center
  2. Run: igx --owner "Your Name" conversations export.zip
  3. Inspect one: igx --owner "Your Name" stats export.zip alice_1234567
"#)]
pub struct Cli {
    /// Your display name as it appears in conversations
    #[arg(long, env = "IGX_OWNER", global = true)]
    pub owner: Option<String>,

    /// Guess the owner name from participant frequency when none is given
    #[arg(long, global = true)]
    pub infer_owner: bool,

    /// Output format
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Be verbose (show debug info)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Be quiet (suppress non-error output)
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List conversations, most recent first
    Conversations(ConversationsArgs),

    /// Print the messages of one conversation
    Show(ShowArgs),

    /// Message statistics, response times and momentum for a conversation
    Stats(ConversationArgs),

    /// Sentiment summary for a conversation
    Sentiment(ConversationArgs),

    /// Follower and following sets
    Followers(FollowersArgs),

    /// Likes, comments, saves, searches and viewed posts
    Activity(ArchiveArgs),

    /// Export one conversation as CSV or JSON
    Export(ExportArgs),

    /// Check an export for missing or damaged files
    Doctor(ArchiveArgs),

    /// Unpack an export ZIP into a directory
    Extract(ExtractArgs),

    /// Show or manage configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug)]
pub struct ArchiveArgs {
    /// Export .zip file or extracted directory
    pub archive: PathBuf,
}

#[derive(Args, Debug)]
pub struct ConversationsArgs {
    /// Export .zip file or extracted directory
    pub archive: PathBuf,

    /// Only group conversations
    #[arg(long, conflicts_with = "individual")]
    pub groups: bool,

    /// Only one-to-one conversations
    #[arg(long)]
    pub individual: bool,

    /// Maximum number of conversations to list
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,
}

#[derive(Args, Debug)]
pub struct ConversationArgs {
    /// Export .zip file or extracted directory
    pub archive: PathBuf,

    /// Conversation id (the inbox directory name)
    pub id: String,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Export .zip file or extracted directory
    pub archive: PathBuf,

    /// Conversation id (the inbox directory name)
    pub id: String,

    /// Include reactions, attachment notices and other system messages
    #[arg(long, short = 'a')]
    pub all: bool,

    /// Show only the last N messages
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,
}

#[derive(Args, Debug)]
pub struct FollowersArgs {
    /// Export .zip file or extracted directory
    pub archive: PathBuf,

    /// Which accounts to list
    #[arg(long, short = 's', default_value = "all")]
    pub set: RelationshipSet,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Export .zip file or extracted directory
    pub archive: PathBuf,

    /// Conversation id (the inbox directory name)
    pub id: String,

    /// Output file path (stdout if not specified)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Export .zip file
    pub zip: PathBuf,

    /// Destination directory (must be empty or absent)
    pub dest: PathBuf,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Show current configuration
    #[arg(long)]
    pub show: bool,

    /// Write a default config file if none exists
    #[arg(long)]
    pub init: bool,

    /// Set a configuration value (key=value)
    #[arg(long)]
    pub set: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    JsonPretty,
    Csv,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RelationshipSet {
    #[default]
    All,
    Mutual,
    FollowersOnly,
    FollowingOnly,
}
