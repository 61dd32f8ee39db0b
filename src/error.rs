//! Error types for igx.
//!
//! [`IgxError`] separates the failures a caller can act on (a missing export
//! file, an unknown conversation id, an owner that was never configured)
//! from plain I/O and decoding failures. The second half of the module holds
//! the terminal formatting used by the CLI, including "did you mean"
//! suggestions for mistyped ids, config keys and formats.

use colored::Colorize;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IgxError {
    // =========================================================================
    // Archive Errors
    // =========================================================================
    /// Nothing exists at the path given as the export.
    #[error("Archive not found at '{path}'")]
    ArchiveNotFound { path: PathBuf },

    /// The export holds none of the data igx knows how to read.
    #[error("Invalid archive structure: {reason}")]
    InvalidArchive { reason: String },

    /// A required export file (inbox, followers, following) is absent.
    #[error("Missing required file in archive: {file}")]
    MissingArchiveFile { file: String },

    /// An export file is not valid JSON or not in the expected layout.
    #[error("Failed to parse '{file}': {reason}")]
    ParseError { file: String, reason: String },

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    // =========================================================================
    // Lookup Errors
    // =========================================================================
    #[error("{item_type} '{id}' not found")]
    NotFound { item_type: &'static str, id: String },

    /// An accessor was called before any archive was loaded.
    #[error("No archive loaded. Load an Instagram export first.")]
    NoDataLoaded,

    /// The export owner was neither configured nor inferable.
    #[error("Owner name unknown: {reason}")]
    OwnerUnknown { reason: String },

    // =========================================================================
    // IO Errors
    // =========================================================================
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to {operation} '{path}': {source}")]
    PathError {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // =========================================================================
    // Configuration and Arguments
    // =========================================================================
    #[error("Invalid configuration in '{path}': {reason}")]
    ConfigError { path: PathBuf, reason: String },

    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// Any other failure, with a description of what was being attempted.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

pub type Result<T> = std::result::Result<T, IgxError>;

impl IgxError {
    pub fn archive_not_found(path: impl Into<PathBuf>) -> Self {
        Self::ArchiveNotFound { path: path.into() }
    }

    pub fn invalid_archive(reason: impl Into<String>) -> Self {
        Self::InvalidArchive {
            reason: reason.into(),
        }
    }

    pub fn missing_file(file: impl Into<String>) -> Self {
        Self::MissingArchiveFile { file: file.into() }
    }

    pub fn parse_error(file: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ParseError {
            file: file.into(),
            reason: reason.into(),
        }
    }

    pub fn not_found(item_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            item_type,
            id: id.into(),
        }
    }

    pub fn path_error(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::PathError {
            operation,
            path: path.into(),
            source,
        }
    }

    pub fn with_context<E>(context: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::WithContext {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// The requested data is absent, as opposed to present but broken.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ArchiveNotFound { .. } | Self::MissingArchiveFile { .. } | Self::NotFound { .. }
        )
    }

    /// A one-line hint shown under the error in the CLI.
    #[must_use]
    pub const fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::ArchiveNotFound { .. } => Some(
                "Pass the path to the downloaded .zip file or to the directory it was extracted into.",
            ),
            Self::MissingArchiveFile { .. } | Self::InvalidArchive { .. } => Some(
                "Request a JSON-format export from Instagram (Accounts Center > Download your information).",
            ),
            Self::ParseError { .. } => Some("Run 'igx doctor <ARCHIVE>' to see which files are damaged."),
            Self::OwnerUnknown { .. } => {
                Some("Pass --owner \"Your Display Name\" or set IGX_OWNER, or use --infer-owner.")
            }
            Self::NoDataLoaded => Some("Load an archive before querying analytics."),
            Self::Zip(_) => Some("Check that the file is a complete, uncorrupted ZIP download."),
            Self::ConfigError { .. } => Some("Run 'igx config --show' to inspect the active settings."),
            _ => None,
        }
    }
}

// =============================================================================
// CLI Error Formatting
// =============================================================================

/// Render an error title with an optional explanation and hints.
///
/// A single suggestion is shown as a hint line; several are listed.
#[must_use]
pub fn format_error(title: &str, explanation: &str, suggestions: &[&str]) -> String {
    let mut lines = vec![format!("{} {}", "✗".red().bold(), title.bold())];

    if !explanation.is_empty() {
        lines.push(String::new());
        lines.push(format!("   {explanation}"));
    }

    match suggestions {
        [] => {}
        [only] => {
            lines.push(String::new());
            lines.push(format!("   {} {only}", "Hint:".cyan()));
        }
        many => {
            lines.push(String::new());
            lines.push(format!("   {}:", "Try".cyan()));
            lines.extend(many.iter().map(|s| format!("     {} {s}", "•".dimmed())));
        }
    }

    lines.join("\n")
}

/// Edit distance with insertions, deletions and substitutions of chars.
#[must_use]
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();

    for (i, ca) in a.chars().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = (above + 1)
                .min(row[j] + 1)
                .min(diagonal + usize::from(ca != *cb));
            diagonal = above;
        }
    }

    row[b.len()]
}

/// Closest candidate within `max_distance` edits (default 2), ignoring case.
///
/// An exact match is not a suggestion and yields `None`. Ties go to the
/// candidate listed first.
#[must_use]
pub fn find_closest_match<'a>(
    input: &str,
    candidates: &[&'a str],
    max_distance: Option<usize>,
) -> Option<&'a str> {
    let limit = max_distance.unwrap_or(2);
    let input = input.to_lowercase();

    let mut best: Option<(&'a str, usize)> = None;
    for &candidate in candidates {
        let distance = levenshtein_distance(&input, &candidate.to_lowercase());
        if distance == 0 || distance > limit {
            continue;
        }
        if best.is_none_or(|(_, d)| distance < d) {
            best = Some((candidate, distance));
        }
    }
    best.map(|(candidate, _)| candidate)
}

#[must_use]
pub fn format_did_you_mean(suggestion: &str) -> String {
    format!("Did you mean '{}'?", suggestion.green())
}

/// Error text for a value outside a fixed set, e.g. `--format xml`.
#[must_use]
pub fn format_unknown_value_error(kind: &str, input: &str, valid_options: &[&str]) -> String {
    let mut suggestions: Vec<String> = find_closest_match(input, valid_options, None)
        .map(format_did_you_mean)
        .into_iter()
        .collect();
    if valid_options.len() <= 8 {
        suggestions.push(format!("Valid {kind}s: {}", valid_options.join(", ")));
    }

    let refs: Vec<&str> = suggestions.iter().map(String::as_str).collect();
    format_error(&format!("Unknown {kind}: '{input}'"), "", &refs)
}

/// Output formats accepted in `output.format` and `--format`.
pub const VALID_OUTPUT_FORMATS: &[&str] = &["text", "json", "json-pretty", "csv"];

/// Keys accepted by `igx config --set`.
pub const VALID_CONFIG_KEYS: &[&str] = &[
    "paths.archive",
    "analysis.owner_name",
    "analysis.infer_owner",
    "output.format",
    "output.colors",
    "output.quiet",
];
