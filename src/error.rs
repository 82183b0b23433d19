//! Error types for registry acquisition and file operations
//!
//! The diff and reconciliation engine never fails; errors only come from
//! the edges: reading files, parsing default preference files, locating or
//! installing Firefox. All public functions return [`Result<T, Error>`].

use std::path::PathBuf;

/// Errors that can occur while acquiring registries or reading inputs
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Lexer error while tokenizing a default preference file
    #[error("Lexer error at line {line}, column {column}: {message}")]
    Lexer {
        line: usize,
        column: usize,
        message: String,
    },

    /// Parser error while parsing a default preference file
    #[error("Parser error at line {line}, column {column}: {message}")]
    Parser {
        line: usize,
        column: usize,
        message: String,
    },

    /// I/O error during file operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid glob pattern in query
    #[error("Invalid glob pattern '{pattern}': {message}")]
    InvalidGlobPattern { pattern: String, message: String },

    /// Firefox installation not found
    #[error("Firefox installation not found. Searched: {searched_paths}")]
    FirefoxNotFound { searched_paths: String },

    /// A preference file expected in the installation is missing
    #[error("Preference file not found: {file}")]
    PrefFileNotFound { file: String },

    /// omni.ja exceeds the configured size limit
    #[error("omni.ja is too large: {actual} bytes (limit {limit} bytes)")]
    OmniJaTooLarge { actual: usize, limit: usize },

    /// Extracting files from omni.ja failed
    #[error("Failed to extract omni.ja: {0}")]
    ExtractionFailed(String),

    /// A default preference file failed to parse
    #[error("Failed to parse {file}: {source}")]
    InvalidPrefFile {
        file: String,
        #[source]
        source: Box<Error>,
    },

    /// The installation exposed no default preferences at all
    #[error("No default preferences found in {0}")]
    NoPreferences(PathBuf),

    /// Profile lookup failed
    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    /// profiles.ini or compatibility.ini could not be parsed
    #[error("Failed to parse {file}: {message}")]
    IniParse { file: PathBuf, message: String },

    /// Host OS/architecture has no Firefox release archives
    #[error("Unsupported architecture/OS: {0}")]
    UnsupportedPlatform(String),

    /// No release archive exists for the requested version
    #[error("Can't find Firefox version {version} at {url}")]
    VersionNotFound { version: String, url: String },

    /// Archive download failed
    #[error("Failed to download {url}: {message}")]
    Download { url: String, message: String },

    /// Archive extraction failed
    #[error("Failed to extract archive {archive}: {message}")]
    ArchiveExtraction { archive: PathBuf, message: String },

    /// Configuration file could not be parsed
    #[error("Invalid configuration in {file}: {message}")]
    Config { file: PathBuf, message: String },
}

/// Result type alias for convenience
///
/// # Example
///
/// ```rust
/// use ffdiff::{parse_user_prefs_file, Result};
///
/// fn count_prefs(path: &std::path::Path) -> Result<usize> {
///     Ok(parse_user_prefs_file(path)?.len())
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;
