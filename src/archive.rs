//! Uniform access to the files of an Instagram export.
//!
//! An export arrives either as the downloaded ZIP or as a directory it was
//! unpacked into. Both are exposed through [`ArchiveReader`] so the parser
//! never needs to know which one it is reading.

use crate::error::{IgxError, Result};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fs;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;
use zip::ZipArchive;

/// Directory holding one subdirectory per conversation.
pub const INBOX_PREFIX: &str = "your_instagram_activity/messages/inbox/";

/// Known file locations inside the export.
pub mod paths {
    pub const FOLLOWERS: &str = "connections/followers_and_following/followers_1.json";
    pub const FOLLOWING: &str = "connections/followers_and_following/following.json";
    pub const LIKES: &str = "your_instagram_activity/likes/liked_posts.json";
    pub const COMMENTS: &str = "your_instagram_activity/comments/post_comments_1.json";
    pub const STORY_LIKES: &str = "your_instagram_activity/story_interactions/story_likes.json";
    pub const SAVED: &str = "your_instagram_activity/saved/saved_posts.json";
    pub const PROFILE_SEARCHES: &str = "logged_information/recent_searches/profile_searches.json";
    pub const WORD_SEARCHES: &str =
        "logged_information/recent_searches/word_or_phrase_searches.json";
    pub const POSTS_VIEWED: &str = "ads_information/ads_and_topics/posts_viewed.json";
}

/// Read access to the entries of an export.
///
/// Entry paths are relative to the export root and always use `/`.
pub trait ArchiveReader: Send + Sync {
    /// All file entries whose path starts with `prefix`, sorted.
    ///
    /// # Errors
    /// Returns an error if the underlying storage cannot be enumerated.
    fn list_entries(&self, prefix: &str) -> Result<Vec<String>>;

    /// Read one entry as UTF-8 text.
    ///
    /// # Errors
    /// Returns [`IgxError::MissingArchiveFile`] when the entry does not exist.
    fn read_to_string(&self, path: &str) -> Result<String>;

    /// Whether a file entry exists at `path`.
    fn contains(&self, path: &str) -> bool;

    /// Human-readable description of the source, for logs and reports.
    fn describe(&self) -> String;
}

fn normalize_entry_name(name: &str) -> String {
    name.replace('\\', "/").trim_start_matches("./").to_string()
}

// =============================================================================
// Filesystem realization
// =============================================================================

/// An export that has already been unpacked to a directory.
#[derive(Debug, Clone)]
pub struct DirectoryArchive {
    root: PathBuf,
}

impl DirectoryArchive {
    /// # Errors
    /// Returns [`IgxError::ArchiveNotFound`] if `root` is not a directory.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(IgxError::archive_not_found(root));
        }
        Ok(Self { root })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        path.split('/')
            .filter(|segment| !segment.is_empty())
            .fold(self.root.clone(), |acc, segment| acc.join(segment))
    }
}

impl ArchiveReader for DirectoryArchive {
    fn list_entries(&self, prefix: &str) -> Result<Vec<String>> {
        // Walk only the deepest directory named by the prefix
        let dir_part = prefix.rsplit_once('/').map_or("", |(dir, _)| dir);
        let start = self.resolve(dir_part);
        if !start.is_dir() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for entry in WalkDir::new(&start).follow_links(false) {
            let entry = entry.map_err(|e| {
                IgxError::with_context(format!("Failed to walk {}", start.display()), e)
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let name = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            if name.starts_with(prefix) {
                entries.push(name);
            }
        }

        entries.sort();
        Ok(entries)
    }

    fn read_to_string(&self, path: &str) -> Result<String> {
        let full = self.resolve(path);
        if !full.is_file() {
            return Err(IgxError::missing_file(path));
        }
        fs::read_to_string(&full).map_err(|e| {
            if e.kind() == std::io::ErrorKind::InvalidData {
                IgxError::parse_error(path, "file is not valid UTF-8")
            } else {
                IgxError::path_error("read", full, e)
            }
        })
    }

    fn contains(&self, path: &str) -> bool {
        self.resolve(path).is_file()
    }

    fn describe(&self) -> String {
        format!("directory {}", self.root.display())
    }
}

// =============================================================================
// In-memory ZIP realization
// =============================================================================

/// An export held in memory as ZIP bytes.
///
/// Entries are decompressed on demand. The index maps normalized entry names
/// to their position in the central directory.
pub struct ZipArchiveReader {
    archive: Mutex<ZipArchive<Cursor<Vec<u8>>>>,
    index: BTreeMap<String, usize>,
    label: String,
}

impl ZipArchiveReader {
    /// Build a reader over ZIP bytes already in memory.
    ///
    /// # Errors
    /// Returns [`IgxError::Zip`] if the bytes are not a readable ZIP archive.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Self::with_label(bytes, "in-memory zip".to_string())
    }

    /// Read a ZIP file fully into memory.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not a ZIP archive.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(IgxError::archive_not_found(path));
        }
        let bytes = fs::read(path).map_err(|e| IgxError::path_error("read", path, e))?;
        Self::with_label(bytes, format!("zip {}", path.display()))
    }

    fn with_label(bytes: Vec<u8>, label: String) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;

        let mut index = BTreeMap::new();
        for i in 0..archive.len() {
            let file = archive.by_index_raw(i)?;
            if file.is_dir() {
                continue;
            }
            index.insert(normalize_entry_name(file.name()), i);
        }

        debug!(entries = index.len(), source = %label, "Indexed zip archive");
        Ok(Self {
            archive: Mutex::new(archive),
            index,
            label,
        })
    }

    /// Number of file entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

impl ArchiveReader for ZipArchiveReader {
    fn list_entries(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .index
            .range(prefix.to_string()..)
            .take_while(|(name, _)| name.starts_with(prefix))
            .map(|(name, _)| name.clone())
            .collect())
    }

    fn read_to_string(&self, path: &str) -> Result<String> {
        let &idx = self
            .index
            .get(path)
            .ok_or_else(|| IgxError::missing_file(path))?;

        let mut archive = self.archive.lock();
        let mut file = archive.by_index(idx)?;
        let mut content = String::with_capacity(usize::try_from(file.size()).unwrap_or(0));
        file.read_to_string(&mut content).map_err(|e| {
            if e.kind() == std::io::ErrorKind::InvalidData {
                IgxError::parse_error(path, "entry is not valid UTF-8")
            } else {
                IgxError::with_context(format!("Failed to decompress {path}"), e)
            }
        })?;
        Ok(content)
    }

    fn contains(&self, path: &str) -> bool {
        self.index.contains_key(path)
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}

impl std::fmt::Debug for ZipArchiveReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZipArchiveReader")
            .field("label", &self.label)
            .field("entries", &self.index.len())
            .finish_non_exhaustive()
    }
}

/// Open an export from a directory or a `.zip` file.
///
/// # Errors
/// Returns [`IgxError::ArchiveNotFound`] when nothing exists at `path`, or an
/// archive error when a file at `path` is not a ZIP.
pub fn open_archive(path: impl AsRef<Path>) -> Result<Box<dyn ArchiveReader>> {
    let path = path.as_ref();
    if path.is_dir() {
        info!("Reading unpacked export from {}", path.display());
        return Ok(Box::new(DirectoryArchive::new(path)?));
    }
    if path.is_file() {
        info!("Reading zip export from {}", path.display());
        return Ok(Box::new(ZipArchiveReader::open(path)?));
    }
    Err(IgxError::archive_not_found(path))
}

// =============================================================================
// Extraction
// =============================================================================

/// A ZIP export unpacked to disk.
///
/// The directory is owned by the caller and stays on disk until
/// [`ExtractedArchive::release`] is called.
#[derive(Debug)]
pub struct ExtractedArchive {
    root: PathBuf,
    files: usize,
    skipped: usize,
}

impl ExtractedArchive {
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of files written.
    #[must_use]
    pub const fn files(&self) -> usize {
        self.files
    }

    /// Entries skipped because their path would escape the destination.
    #[must_use]
    pub const fn skipped(&self) -> usize {
        self.skipped
    }

    /// A reader over the unpacked files.
    ///
    /// # Errors
    /// Returns an error if the directory has been removed in the meantime.
    pub fn reader(&self) -> Result<DirectoryArchive> {
        DirectoryArchive::new(&self.root)
    }

    /// Delete the unpacked directory.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be removed.
    pub fn release(self) -> Result<()> {
        debug!("Removing extracted export at {}", self.root.display());
        fs::remove_dir_all(&self.root).map_err(|e| IgxError::path_error("remove", &self.root, e))
    }
}

/// Unpack a ZIP export into `dest`.
///
/// `dest` must not exist or must be an empty directory. If extraction fails
/// partway, everything written so far is removed again.
///
/// # Errors
/// Returns an error if the ZIP cannot be read or a file cannot be written.
pub fn extract_archive(zip_path: impl AsRef<Path>, dest: impl AsRef<Path>) -> Result<ExtractedArchive> {
    let zip_path = zip_path.as_ref();
    let dest = dest.as_ref();

    if !zip_path.is_file() {
        return Err(IgxError::archive_not_found(zip_path));
    }
    if dest.exists() {
        let non_empty = fs::read_dir(dest)
            .map_err(|e| IgxError::path_error("read", dest, e))?
            .next()
            .is_some();
        if non_empty {
            return Err(IgxError::InvalidArgument {
                reason: format!("destination '{}' is not empty", dest.display()),
            });
        }
    }

    let file = fs::File::open(zip_path).map_err(|e| IgxError::path_error("open", zip_path, e))?;
    let mut archive = ZipArchive::new(std::io::BufReader::new(file))?;

    fs::create_dir_all(dest).map_err(|e| IgxError::path_error("create", dest, e))?;

    match unpack_entries(&mut archive, dest) {
        Ok((files, skipped)) => {
            info!(files, skipped, "Extracted export to {}", dest.display());
            Ok(ExtractedArchive {
                root: dest.to_path_buf(),
                files,
                skipped,
            })
        }
        Err(e) => {
            if let Err(cleanup) = fs::remove_dir_all(dest) {
                warn!("Could not remove partial extraction at {}: {cleanup}", dest.display());
            }
            Err(e)
        }
    }
}

fn unpack_entries<R: Read + std::io::Seek>(
    archive: &mut ZipArchive<R>,
    dest: &Path,
) -> Result<(usize, usize)> {
    let mut files = 0;
    let mut skipped = 0;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let Some(relative) = entry.enclosed_name() else {
            warn!("Skipping unsafe zip entry: {}", entry.name());
            skipped += 1;
            continue;
        };
        let out_path = dest.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path).map_err(|e| IgxError::path_error("create", &out_path, e))?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent).map_err(|e| IgxError::path_error("create", parent, e))?;
        }
        let mut out =
            fs::File::create(&out_path).map_err(|e| IgxError::path_error("create", &out_path, e))?;
        std::io::copy(&mut entry, &mut out)
            .map_err(|e| IgxError::path_error("write", &out_path, e))?;
        files += 1;
    }

    Ok((files, skipped))
}
