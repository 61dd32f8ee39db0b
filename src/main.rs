//! igx - Instagram data export analytics CLI
//!
//! Main entry point for the igx command-line tool.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{CommandFactory, Parser, ValueEnum};
use clap_complete::generate;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use igx::config::Config;
use igx::doctor::{self, CheckStatus, HealthCheck};
use igx::export::{self, ExportFormat};
use igx::logging::init_cli_logging;
use igx::stats_analytics::{daily_counts, sparkline_from_daily};
use igx::*;

/// An error already rendered for the terminal.
#[derive(Debug)]
struct Reported(String);

impl std::fmt::Display for Reported {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for Reported {}

fn main() {
    let cli = Cli::parse();
    let config = Config::load();

    if !config.output.colors {
        colored::control::set_override(false);
    }
    init_cli_logging(
        cli.quiet || config.output.quiet,
        cli.verbose,
        config.output.colors,
    );

    if let Err(err) = run(&cli, config) {
        eprintln!("{}", render_error(&err));
        std::process::exit(1);
    }
}

fn render_error(err: &anyhow::Error) -> String {
    if let Some(reported) = err.downcast_ref::<Reported>() {
        return reported.0.clone();
    }
    if let Some(igx_err) = err.downcast_ref::<IgxError>() {
        let suggestions: Vec<&str> = igx_err.suggestion().into_iter().collect();
        return format_error(&igx_err.to_string(), "", &suggestions);
    }
    format_error(&format!("{err:#}"), "", &[])
}

/// Settings resolved from CLI flags layered over the config file.
struct RunContext {
    config: Config,
    format: OutputFormat,
    quiet: bool,
}

impl RunContext {
    fn text(&self) -> bool {
        self.format == OutputFormat::Text
    }

    /// Owner identity for commands that count participants.
    fn owner(&self) -> Result<OwnerIdentity> {
        Ok(self.config.owner_identity()?)
    }

    /// Owner identity for commands that never look at participants.
    ///
    /// Never inferred, so exports without an inbox still load.
    const fn anonymous_owner() -> OwnerIdentity {
        OwnerIdentity::Named(String::new())
    }
}

fn resolve_format(cli: &Cli, config: &Config) -> Result<OutputFormat> {
    if let Some(format) = cli.format {
        return Ok(format);
    }
    OutputFormat::from_str(&config.output.format, true).map_err(|_| {
        Reported(format_unknown_value_error(
            "format",
            &config.output.format,
            VALID_OUTPUT_FORMATS,
        ))
        .into()
    })
}

fn run(cli: &Cli, mut config: Config) -> Result<()> {
    if let Some(owner) = cli.owner.as_ref().filter(|o| !o.trim().is_empty()) {
        config.analysis.owner_name = Some(owner.clone());
    }
    if cli.infer_owner {
        config.analysis.infer_owner = true;
    }
    let ctx = RunContext {
        format: resolve_format(cli, &config)?,
        quiet: cli.quiet || config.output.quiet,
        config,
    };

    match &cli.command {
        Commands::Conversations(args) => cmd_conversations(&ctx, args),
        Commands::Show(args) => cmd_show(&ctx, args),
        Commands::Stats(args) => cmd_stats(&ctx, args),
        Commands::Sentiment(args) => cmd_sentiment(&ctx, args),
        Commands::Followers(args) => cmd_followers(&ctx, args),
        Commands::Activity(args) => cmd_activity(&ctx, args),
        Commands::Export(args) => cmd_export(&ctx, args),
        Commands::Doctor(args) => cmd_doctor(&ctx, args),
        Commands::Extract(args) => cmd_extract(&ctx, args),
        Commands::Config(args) => cmd_config(&ctx, args),
        Commands::Completions(args) => {
            cmd_completions(args.clone());
            Ok(())
        }
    }
}

// =============================================================================
// Shared helpers
// =============================================================================

fn spinner(ctx: &RunContext, message: String) -> Option<ProgressBar> {
    if ctx.quiet || !ctx.text() {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(80));
    Some(pb)
}

fn load_dataset(ctx: &RunContext, archive: &Path, owner: OwnerIdentity) -> Result<Arc<Dataset>> {
    let pb = spinner(ctx, format!("Reading {}", archive.display()));
    let reader = open_archive(archive)?;
    let session = AnalysisSession::new(owner);
    let result = session.load(reader.as_ref());
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    Ok(result?)
}

/// Look up a conversation, suggesting the closest id when it is unknown.
fn find_conversation<'a>(dataset: &'a Dataset, id: &str) -> Result<&'a Conversation> {
    match dataset.conversation(id) {
        Ok(conversation) => Ok(conversation),
        Err(IgxError::NotFound { .. }) => {
            let ids: Vec<&str> = dataset
                .conversations()?
                .keys()
                .map(String::as_str)
                .collect();
            let mut suggestions = Vec::new();
            if let Some(closest) = find_closest_match(id, &ids, Some(3)) {
                suggestions.push(format_did_you_mean(closest));
            }
            suggestions.push("Run 'igx conversations <ARCHIVE>' to list conversation ids".into());
            let refs: Vec<&str> = suggestions.iter().map(String::as_str).collect();
            Err(Reported(format_error(
                &format!("Unknown conversation: '{id}'"),
                "",
                &refs,
            ))
            .into())
        }
        Err(e) => Err(e.into()),
    }
}

fn print_json<T: Serialize>(ctx: &RunContext, value: &T) -> Result<()> {
    let json = if ctx.format == OutputFormat::JsonPretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{json}");
    Ok(())
}

fn section(title: &str) {
    println!();
    println!("{}", title.bold().cyan());
    println!("{}", "─".repeat(CONTENT_DIVIDER_WIDTH));
}

fn rfc3339_ms(timestamp_ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(timestamp_ms)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_default()
}

fn date_secs(timestamp: i64) -> String {
    DateTime::<Utc>::from_timestamp(timestamp, 0)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn display_name(dataset: &Dataset, conversation: &Conversation) -> String {
    let others: Vec<&str> = conversation
        .other_participants(dataset.owner_name())
        .collect();
    if others.is_empty() {
        conversation.id.clone()
    } else {
        others.join(", ")
    }
}

// =============================================================================
// conversations
// =============================================================================

fn cmd_conversations(ctx: &RunContext, args: &cli::ConversationsArgs) -> Result<()> {
    let dataset = load_dataset(ctx, &args.archive, ctx.owner()?)?;
    let mut statuses = dataset.participant_statuses()?;

    statuses.retain(|s| {
        (!args.groups || s.is_group_chat) && (!args.individual || !s.is_group_chat)
    });
    statuses.sort_by(|a, b| b.last_message_time.cmp(&a.last_message_time));
    if let Some(limit) = args.limit {
        statuses.truncate(limit);
    }

    match ctx.format {
        OutputFormat::Json | OutputFormat::JsonPretty => print_json(ctx, &statuses)?,
        OutputFormat::Csv => {
            println!(
                "conversation_id,name,username,message_count,last_message,is_group,participant_count"
            );
            for s in &statuses {
                println!(
                    "{},{},{},{},{},{},{}",
                    csv_quote(&s.conversation_id),
                    csv_quote(&s.name),
                    csv_quote(&s.username),
                    s.message_count,
                    rfc3339_ms(s.last_message_time),
                    s.is_group_chat,
                    s.participant_count
                );
            }
        }
        OutputFormat::Text => {
            if statuses.is_empty() {
                println!("{}", "No conversations found.".yellow());
                return Ok(());
            }
            println!(
                "{} conversations\n",
                format_number_usize(statuses.len()).cyan()
            );
            for s in &statuses {
                let badge = if s.is_group_chat {
                    format!(" {}", format!(" GROUP {} ", s.participant_count).on_magenta())
                } else {
                    String::new()
                };
                let handle = if s.username.is_empty() {
                    String::new()
                } else {
                    format!(" @{}", s.username).green().to_string()
                };
                println!("{}{}{}", s.name.bold(), handle, badge);
                println!(
                    "   {} messages · last {} · {}",
                    format_number_usize(s.message_count).cyan(),
                    format_timestamp_ms(s.last_message_time),
                    s.conversation_id.dimmed()
                );
            }
        }
    }
    Ok(())
}

// =============================================================================
// show
// =============================================================================

fn message_line(message: &Message) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(content) = message.trimmed_content() {
        parts.push(content.to_string());
    }
    if !message.photos.is_empty() {
        parts.push(format!("[{} photo(s)]", message.photos.len()));
    }
    if !message.videos.is_empty() {
        parts.push(format!("[{} video(s)]", message.videos.len()));
    }
    if !message.audio_files.is_empty() {
        parts.push(format!("[{} audio]", message.audio_files.len()));
    }
    if let Some(link) = message.share.as_ref().and_then(|s| s.link.as_deref()) {
        parts.push(format!("[{link}]"));
    }
    parts.join(" ")
}

fn cmd_show(ctx: &RunContext, args: &cli::ShowArgs) -> Result<()> {
    let dataset = load_dataset(ctx, &args.archive, ctx.owner()?)?;
    let conversation = find_conversation(&dataset, &args.id)?;

    let mut messages: Vec<&Message> = conversation
        .messages
        .iter()
        .filter(|m| args.all || is_meaningful(m))
        .collect();
    if let Some(limit) = args.limit {
        let skip = messages.len().saturating_sub(limit);
        messages = messages.split_off(skip);
    }

    match ctx.format {
        OutputFormat::Json | OutputFormat::JsonPretty => print_json(ctx, &messages)?,
        OutputFormat::Csv => println!("{}", export::messages_csv(messages.iter().copied())),
        OutputFormat::Text => {
            println!("{}", display_name(&dataset, conversation).bold().cyan());
            println!("{}", "─".repeat(HEADER_DIVIDER_WIDTH));
            for message in &messages {
                let when = DateTime::<Utc>::from_timestamp_millis(message.timestamp_ms)
                    .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default();
                let kind = MessageKind::of(message);
                let sender = if message.sender == dataset.owner_name() {
                    message.sender.blue().bold()
                } else {
                    message.sender.green().bold()
                };
                println!("{} {}", when.dimmed(), sender);
                let body = message_line(message);
                for line in textwrap::wrap(&body, HEADER_DIVIDER_WIDTH - 3) {
                    if kind.is_meaningful() {
                        println!("   {line}");
                    } else {
                        println!("   {}", line.dimmed().italic());
                    }
                }
            }
            println!("{}", "─".repeat(HEADER_DIVIDER_WIDTH));
            println!(
                "{} of {} messages shown",
                messages.len().to_string().cyan(),
                conversation.messages.len()
            );
        }
    }
    Ok(())
}

// =============================================================================
// stats
// =============================================================================

#[derive(Serialize)]
struct StatsReport<'a> {
    conversation_id: &'a str,
    message_stats: MessageStats,
    momentum: ConversationMomentum,
}

fn cmd_stats(ctx: &RunContext, args: &cli::ConversationArgs) -> Result<()> {
    let dataset = load_dataset(ctx, &args.archive, ctx.owner()?)?;
    let conversation = find_conversation(&dataset, &args.id)?;
    let report = StatsReport {
        conversation_id: &conversation.id,
        message_stats: dataset.message_stats(&conversation.id)?,
        momentum: dataset.momentum(&conversation.id)?,
    };

    match ctx.format {
        OutputFormat::Json | OutputFormat::JsonPretty => print_json(ctx, &report)?,
        OutputFormat::Csv => print_stats_csv(&report),
        OutputFormat::Text => print_stats_text(&dataset, conversation, &report),
    }
    Ok(())
}

fn print_stats_csv(report: &StatsReport<'_>) {
    let stats = &report.message_stats;
    let rt = &stats.response_time;
    let momentum = &report.momentum;
    println!("metric,value");
    for (metric, value) in [
        ("total_messages", stats.total_messages.to_string()),
        ("meaningful_messages", stats.meaningful_messages.to_string()),
        ("attachments", stats.attachments.to_string()),
        ("reactions", stats.reactions.to_string()),
        ("likes", stats.likes.to_string()),
        ("media_shares", stats.media_shares.to_string()),
        ("photos", stats.photos.to_string()),
        ("videos", stats.videos.to_string()),
        ("audio_calls", stats.audio_calls.to_string()),
        ("average_response_minutes", format!("{:.2}", rt.average_response_time)),
        ("median_response_minutes", format!("{:.2}", rt.median_response_time)),
        ("overall_trend", momentum.overall_trend.to_string()),
        ("average_gap_hours", format!("{:.2}", momentum.average_gap_hours)),
        ("longest_quiet_days", momentum.longest_quiet_period.to_string()),
    ] {
        println!("{metric},{value}");
    }
}

fn print_stats_text(dataset: &Dataset, conversation: &Conversation, report: &StatsReport<'_>) {
    let stats = &report.message_stats;
    let rt = &stats.response_time;
    let momentum = &report.momentum;

    println!("{}", display_name(dataset, conversation).bold().cyan());

    section("Messages");
    for (label, value) in [
        ("Total:", stats.total_messages),
        ("Meaningful:", stats.meaningful_messages),
        ("Attachments:", stats.attachments),
        ("Photos:", stats.photos),
        ("Videos:", stats.videos),
        ("Reactions:", stats.reactions),
        ("Likes:", stats.likes),
        ("Shares:", stats.media_shares),
        ("Audio calls:", stats.audio_calls),
    ] {
        println!("  {label:<20} {:>10}", format_number_usize(value));
    }

    section("Response Time");
    if rt.total_responses() == 0 {
        println!("  {}", "Not enough back-and-forth to measure.".dimmed());
    } else {
        println!("  {:<20} {:>10}", "Average:", format_duration(rt.average_response_time));
        println!("  {:<20} {:>10}", "Median:", format_duration(rt.median_response_time));
        println!("  {:<20} {:>10}", "Fastest:", format_duration(rt.fastest_response));
        println!("  {:<20} {:>10}", "Slowest:", format_duration(rt.slowest_response));
        println!();
        for (name, p) in &rt.by_participant {
            println!(
                "  {} {} responses, avg {}, {:.0}% quick",
                name.bold(),
                p.total_responses.to_string().cyan(),
                format_duration(p.average_response_time),
                rt.responsiveness.get(name).copied().unwrap_or_default()
            );
        }
    }
    if !rt.conversation_starters.is_empty() {
        let starters: Vec<String> = rt
            .conversation_starters
            .iter()
            .map(|(name, count)| format!("{name} ({count})"))
            .collect();
        println!("  Starters: {}", starters.join(", "));
    }

    section("Momentum");
    let trend = match momentum.overall_trend {
        Trend::Increasing => momentum.overall_trend.to_string().green(),
        Trend::Decreasing => momentum.overall_trend.to_string().red(),
        Trend::Stable => momentum.overall_trend.to_string().yellow(),
    };
    println!("  {:<20} {:>10}", "Trend:", trend);
    println!(
        "  {:<20} {:>10}",
        "Average gap:",
        format!("{:.1}h", momentum.average_gap_hours)
    );
    println!(
        "  {:<20} {:>10}",
        "Longest silence:",
        format!("{}d", momentum.longest_quiet_period)
    );
    let daily = daily_counts(&conversation.messages);
    if !daily.is_empty() {
        println!("  {}", sparkline_from_daily(&daily, CONTENT_DIVIDER_WIDTH - 4).cyan());
    }
    for peak in momentum.peak_periods.iter().take(5) {
        println!("  Peak  {} {} messages", peak.date, peak.message_count);
    }
    for quiet in &momentum.quiet_periods {
        println!(
            "  Quiet {} → {} ({} days)",
            quiet.start_date, quiet.end_date, quiet.duration_days
        );
    }
}

// =============================================================================
// sentiment
// =============================================================================

fn cmd_sentiment(ctx: &RunContext, args: &cli::ConversationArgs) -> Result<()> {
    let dataset = load_dataset(ctx, &args.archive, ctx.owner()?)?;
    let conversation = find_conversation(&dataset, &args.id)?;
    let summary = dataset.sentiment_summary(&conversation.id, &LexiconScorer::new())?;

    match ctx.format {
        OutputFormat::Json | OutputFormat::JsonPretty => print_json(ctx, &summary)?,
        OutputFormat::Csv => {
            println!("date,average_score,message_count");
            for (sentiment, activity) in summary.sentiment_trend.iter().zip(&summary.activity_trend)
            {
                println!(
                    "{},{:.4},{}",
                    sentiment.date, sentiment.score, activity.message_count
                );
            }
        }
        OutputFormat::Text => {
            println!("{}", display_name(&dataset, conversation).bold().cyan());
            section("Sentiment");
            let label = summary.overall_label.to_string();
            let label = match summary.overall_label {
                sentiment::SentimentLabel::Positive => label.green(),
                sentiment::SentimentLabel::Negative => label.red(),
                sentiment::SentimentLabel::Neutral => label.yellow(),
            };
            println!("  {:<20} {:>10}", "Overall:", label);
            println!("  {:<20} {:>10.3}", "Mean score:", summary.overall_score);
            println!("  {:<20} {:>10}", "Positive:", summary.positive_count);
            println!("  {:<20} {:>10}", "Negative:", summary.negative_count);
            println!("  {:<20} {:>10}", "Neutral:", summary.neutral_count);

            for (title, extremal) in [
                ("Most positive", &summary.most_positive_message),
                ("Most negative", &summary.most_negative_message),
            ] {
                if let Some(message) = extremal {
                    println!();
                    println!("  {} ({:+.1})", title.bold(), message.score);
                    for line in textwrap::wrap(&message.content, CONTENT_DIVIDER_WIDTH - 4) {
                        println!("    {line}");
                    }
                }
            }

            if !summary.sentiment_trend.is_empty() {
                section("Recent days");
                let start = summary.sentiment_trend.len().saturating_sub(14);
                for (day, activity) in summary.sentiment_trend[start..]
                    .iter()
                    .zip(&summary.activity_trend[start..])
                {
                    println!(
                        "  {} {:>+7.2} {:>5} msgs",
                        day.date, day.score, activity.message_count
                    );
                }
            }
        }
    }
    Ok(())
}

// =============================================================================
// followers
// =============================================================================

fn cmd_followers(ctx: &RunContext, args: &cli::FollowersArgs) -> Result<()> {
    let dataset = load_dataset(ctx, &args.archive, RunContext::anonymous_owner())?;
    let sets = dataset.relationships()?;

    let selected: Option<&[FollowerData]> = match args.set {
        RelationshipSet::All => None,
        RelationshipSet::Mutual => Some(sets.mutual.as_slice()),
        RelationshipSet::FollowersOnly => Some(sets.followers_only.as_slice()),
        RelationshipSet::FollowingOnly => Some(sets.following_only.as_slice()),
    };

    match (ctx.format, selected) {
        (OutputFormat::Json | OutputFormat::JsonPretty, None) => print_json(ctx, &sets)?,
        (OutputFormat::Json | OutputFormat::JsonPretty, Some(records)) => {
            print_json(ctx, &records)?;
        }
        (OutputFormat::Csv, _) => {
            println!("set,username,timestamp,href");
            let groups: Vec<(&str, &[FollowerData])> = match selected {
                Some(records) => vec![(set_name(args.set), records)],
                None => vec![
                    ("mutual", sets.mutual.as_slice()),
                    ("followers-only", sets.followers_only.as_slice()),
                    ("following-only", sets.following_only.as_slice()),
                ],
            };
            for (name, records) in groups {
                for r in records {
                    println!(
                        "{name},{},{},{}",
                        csv_quote(&r.username),
                        r.timestamp,
                        csv_quote(&r.href)
                    );
                }
            }
        }
        (OutputFormat::Text, None) => {
            println!("{}", "Connections".bold().cyan());
            println!("{}", "─".repeat(40));
            println!("  {:<20} {:>10}", "Followers:", format_number_usize(dataset.followers()?.len()));
            println!("  {:<20} {:>10}", "Following:", format_number_usize(dataset.following()?.len()));
            println!("  {:<20} {:>10}", "Mutual:", format_number_usize(sets.mutual.len()));
            println!("  {:<20} {:>10}", "Followers only:", format_number_usize(sets.followers_only.len()));
            println!("  {:<20} {:>10}", "Following only:", format_number_usize(sets.following_only.len()));
            println!("{}", "─".repeat(40));
            println!("  {:<20} {:>10}", "Follow ratio:", sets.follow_ratio_display());
        }
        (OutputFormat::Text, Some(records)) => {
            println!(
                "{} {} accounts\n",
                format_number_usize(records.len()).cyan(),
                set_name(args.set)
            );
            for r in records {
                println!("  @{} {}", r.username.green(), date_secs(r.timestamp).dimmed());
            }
        }
    }
    Ok(())
}

const fn set_name(set: RelationshipSet) -> &'static str {
    match set {
        RelationshipSet::All => "all",
        RelationshipSet::Mutual => "mutual",
        RelationshipSet::FollowersOnly => "followers-only",
        RelationshipSet::FollowingOnly => "following-only",
    }
}

// =============================================================================
// activity
// =============================================================================

#[derive(Serialize)]
struct ActivityReport<'a> {
    engagement: &'a EngagementData,
    searches: &'a SearchData,
    posts_viewed: &'a [PostView],
}

fn top_authors(posts: &[PostView], limit: usize) -> Vec<(&str, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for post in posts {
        *counts.entry(post.author.as_str()).or_insert(0) += 1;
    }
    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked.truncate(limit);
    ranked
}

fn cmd_activity(ctx: &RunContext, args: &cli::ArchiveArgs) -> Result<()> {
    let dataset = load_dataset(ctx, &args.archive, RunContext::anonymous_owner())?;
    let engagement = dataset.engagement();
    let searches = dataset.search_data();
    let posts_viewed = dataset.posts_viewed();

    let counts = [
        ("likes", engagement.likes.len()),
        ("comments", engagement.comments.len()),
        ("story_likes", engagement.story_likes.len()),
        ("saved", engagement.saved.len()),
        ("profile_searches", searches.profile_searches.len()),
        ("word_searches", searches.word_searches.len()),
        ("posts_viewed", posts_viewed.len()),
    ];

    match ctx.format {
        OutputFormat::Json | OutputFormat::JsonPretty => print_json(
            ctx,
            &ActivityReport {
                engagement,
                searches,
                posts_viewed,
            },
        )?,
        OutputFormat::Csv => {
            println!("category,count");
            for (category, count) in counts {
                println!("{category},{count}");
            }
        }
        OutputFormat::Text => {
            println!("{}", "Activity".bold().cyan());
            println!("{}", "─".repeat(40));
            for (category, count) in counts {
                let label = format!("{}:", category.replace('_', " "));
                println!("  {label:<20} {:>10}", format_number_usize(count));
            }

            let mut recent: Vec<(&str, i64)> = searches
                .profile_searches
                .iter()
                .map(|s| (s.value.as_str(), s.search_time))
                .chain(
                    searches
                        .word_searches
                        .iter()
                        .map(|s| (s.value.as_str(), s.search_time)),
                )
                .collect();
            if !recent.is_empty() {
                recent.sort_by(|a, b| b.1.cmp(&a.1));
                section("Recent searches");
                for (value, time) in recent.iter().take(10) {
                    println!("  {} {}", date_secs(*time).dimmed(), value);
                }
            }

            let authors = top_authors(posts_viewed, 10);
            if !authors.is_empty() {
                section("Most viewed authors");
                for (author, count) in authors {
                    println!("  {:<30} {:>6}", author, count);
                }
            }
        }
    }
    Ok(())
}

// =============================================================================
// export
// =============================================================================

fn cmd_export(ctx: &RunContext, args: &cli::ExportArgs) -> Result<()> {
    let dataset = load_dataset(ctx, &args.archive, ctx.owner()?)?;
    let conversation = find_conversation(&dataset, &args.id)?;

    let format = match ctx.format {
        OutputFormat::Json | OutputFormat::JsonPretty => ExportFormat::Json,
        OutputFormat::Csv | OutputFormat::Text => ExportFormat::Csv,
    };
    let content = export::export_conversation(conversation, format)?;

    match &args.output {
        Some(path) => {
            let path = if path.is_dir() {
                path.join(export::export_file_name(
                    &display_name(&dataset, conversation),
                    format,
                ))
            } else {
                path.clone()
            };
            std::fs::write(&path, content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            if !ctx.quiet {
                eprintln!("{} Exported to {}", "✓".green(), path.display());
            }
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{content}")?;
        }
    }
    Ok(())
}

// =============================================================================
// doctor
// =============================================================================

fn print_check(check: &HealthCheck) {
    let icon = match check.status {
        CheckStatus::Pass => "✓".green(),
        CheckStatus::Warning => "⚠".yellow(),
        CheckStatus::Error => "✗".red(),
    };
    println!("  {} {} {}", icon, check.name, check.message.dimmed());
    if let Some(suggestion) = &check.suggestion {
        println!("      {} {}", "Hint:".cyan(), suggestion);
    }
}

fn cmd_doctor(ctx: &RunContext, args: &cli::ArchiveArgs) -> Result<()> {
    let reader = open_archive(&args.archive)?;
    let checks = doctor::validate_archive(reader.as_ref())?;
    let errors = checks
        .iter()
        .filter(|c| c.status == CheckStatus::Error)
        .count();
    let warnings = checks
        .iter()
        .filter(|c| c.status == CheckStatus::Warning)
        .count();

    if ctx.format == OutputFormat::Csv {
        println!("status,name,message");
        for check in &checks {
            let status = match check.status {
                CheckStatus::Pass => "pass",
                CheckStatus::Warning => "warning",
                CheckStatus::Error => "error",
            };
            println!("{status},{},{}", csv_quote(&check.name), csv_quote(&check.message));
        }
    } else if ctx.text() {
        println!("{}", format!("Checking {}", reader.describe()).bold().cyan());
        println!("{}", "─".repeat(CONTENT_DIVIDER_WIDTH));
        for check in &checks {
            print_check(check);
        }
        println!("{}", "─".repeat(CONTENT_DIVIDER_WIDTH));
        println!(
            "  {} passed, {} warnings, {} errors",
            (checks.len() - errors - warnings).to_string().green(),
            warnings.to_string().yellow(),
            errors.to_string().red()
        );
    } else {
        print_json(ctx, &checks)?;
    }

    if errors > 0 {
        anyhow::bail!("{errors} check(s) failed");
    }
    Ok(())
}

// =============================================================================
// extract
// =============================================================================

fn cmd_extract(ctx: &RunContext, args: &cli::ExtractArgs) -> Result<()> {
    let pb = spinner(ctx, format!("Extracting {}", args.zip.display()));
    let result = extract_archive(&args.zip, &args.dest);
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    let extracted = result?;
    debug!(files = extracted.files(), skipped = extracted.skipped(), "Extraction finished");

    if ctx.text() {
        if !ctx.quiet {
            println!(
                "{} Extracted {} files to {}",
                "✓".green(),
                format_number_usize(extracted.files()).cyan(),
                extracted.root().display()
            );
            if extracted.skipped() > 0 {
                println!(
                    "  {} {} entries with unsafe paths were skipped",
                    "⚠".yellow(),
                    extracted.skipped()
                );
            }
        }
    } else {
        #[derive(Serialize)]
        struct Extracted<'a> {
            root: &'a Path,
            files: usize,
            skipped: usize,
        }
        print_json(
            ctx,
            &Extracted {
                root: extracted.root(),
                files: extracted.files(),
                skipped: extracted.skipped(),
            },
        )?;
    }
    Ok(())
}

// =============================================================================
// config
// =============================================================================

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    value.parse::<bool>().map_err(|_| {
        IgxError::InvalidArgument {
            reason: format!("{key} expects true or false, got '{value}'"),
        }
        .into()
    })
}

fn set_config_value(config: &mut Config, assignment: &str) -> Result<()> {
    let Some((key, value)) = assignment.split_once('=') else {
        return Err(IgxError::InvalidArgument {
            reason: format!("expected key=value, got '{assignment}'"),
        }
        .into());
    };
    let (key, value) = (key.trim(), value.trim());

    match key {
        "paths.archive" => config.paths.archive = Some(value.into()),
        "analysis.owner_name" => config.analysis.owner_name = Some(value.to_string()),
        "analysis.infer_owner" => config.analysis.infer_owner = parse_bool(key, value)?,
        "output.format" => {
            if OutputFormat::from_str(value, true).is_err() {
                return Err(Reported(format_unknown_value_error(
                    "format",
                    value,
                    VALID_OUTPUT_FORMATS,
                ))
                .into());
            }
            config.output.format = value.to_string();
        }
        "output.colors" => config.output.colors = parse_bool(key, value)?,
        "output.quiet" => config.output.quiet = parse_bool(key, value)?,
        _ => {
            return Err(Reported(format_unknown_value_error(
                "config key",
                key,
                VALID_CONFIG_KEYS,
            ))
            .into());
        }
    }
    Ok(())
}

fn cmd_config(ctx: &RunContext, args: &cli::ConfigArgs) -> Result<()> {
    let path = Config::user_config_path();

    if args.init {
        match &path {
            Some(p) if p.exists() => {
                println!("Config already exists at {}", p.display());
            }
            _ => {
                let saved = Config::default().save()?;
                println!("{} Wrote {}", "✓".green(), saved.display());
            }
        }
    }

    if let Some(assignment) = &args.set {
        let mut file_config = match &path {
            Some(p) if p.exists() => Config::load_from_file(p)?,
            _ => Config::default(),
        };
        set_config_value(&mut file_config, assignment)?;
        let saved = file_config.save()?;
        println!("{} Updated {}", "✓".green(), saved.display());
    }

    if args.show || (!args.init && args.set.is_none()) {
        println!("{}", "Current Configuration".bold().cyan());
        match &path {
            Some(p) => println!("  File: {}", p.display().to_string().dimmed()),
            None => println!("  File: {}", "unavailable".dimmed()),
        }
        println!();
        let rendered = toml::to_string_pretty(&ctx.config).context("Failed to render config")?;
        print!("{rendered}");
    }
    Ok(())
}

fn cmd_completions(args: cli::CompletionsArgs) {
    let mut cmd = Cli::command();
    generate(args.shell, &mut cmd, "igx", &mut io::stdout());
}
