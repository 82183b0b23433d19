//! omni.ja archive reader
//!
//! Firefox ships its default preference files inside `omni.ja` ZIP
//! archives: `greprefs.js` and `defaults/pref/*.js` in the GRE archive,
//! `defaults/preferences/*.js` in the `browser/` one. This module reads
//! those files into memory, with size limits against oversized archives
//! and entries.
//!
//! Some builds produce archives the `zip` crate rejects (extra bytes before
//! the central directory); for those the reader falls back to the system
//! `unzip` command and a temporary directory.

use crate::error::{Error, Result};
use glob::{MatchOptions, Pattern};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;
use zip::read::ZipArchive;

/// Default maximum omni.ja file size (100MB)
pub const DEFAULT_MAX_OMNI_SIZE: usize = 100 * 1024 * 1024;

/// Largest single entry read from an archive (10MB uncompressed)
pub const MAX_ENTRY_SIZE: u64 = 10 * 1024 * 1024;

/// Archive entries that populate the default branch
pub const PREF_FILE_PATTERNS: &[&str] = &[
    "greprefs.js",
    "defaults/pref/*.js",
    "defaults/preferences/*.js",
];

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Configuration for reading omni.ja
///
/// # Example
///
/// ```rust
/// use ffdiff::ExtractConfig;
///
/// let config = ExtractConfig {
///     max_omni_size: 50 * 1024 * 1024,
///     target_files: vec!["greprefs.js".to_string()],
///     ..Default::default()
/// };
/// assert!(config.unzip_fallback);
/// ```
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Maximum omni.ja file size in bytes
    pub max_omni_size: usize,
    /// Glob patterns of the entries to read; `*` does not cross `/`
    pub target_files: Vec<String>,
    /// Retry with the `unzip` command when the archive cannot be parsed
    pub unzip_fallback: bool,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            max_omni_size: DEFAULT_MAX_OMNI_SIZE,
            target_files: PREF_FILE_PATTERNS.iter().map(|p| p.to_string()).collect(),
            unzip_fallback: true,
        }
    }
}

/// A preference file read from an archive
#[derive(Debug, Clone, PartialEq)]
pub struct PrefSource {
    /// Entry name inside the archive
    pub name: String,
    pub content: String,
}

/// Reader for the preference files of one omni.ja archive
pub struct OmniExtractor {
    omni_path: PathBuf,
    patterns: Vec<Pattern>,
    config: ExtractConfig,
}

impl OmniExtractor {
    /// Create a reader with the default configuration
    pub fn new(omni_path: PathBuf) -> Result<Self> {
        Self::with_config(omni_path, ExtractConfig::default())
    }

    /// Create a reader with a custom configuration
    ///
    /// Fails if the archive is missing, larger than the configured limit,
    /// or if a target pattern is not a valid glob.
    pub fn with_config(omni_path: PathBuf, config: ExtractConfig) -> Result<Self> {
        if !omni_path.is_file() {
            return Err(Error::PrefFileNotFound {
                file: omni_path.display().to_string(),
            });
        }

        let file_size = fs::metadata(&omni_path)?.len() as usize;
        if file_size > config.max_omni_size {
            return Err(Error::OmniJaTooLarge {
                actual: file_size,
                limit: config.max_omni_size,
            });
        }

        let patterns = compile_patterns(&config.target_files)?;
        Ok(Self {
            omni_path,
            patterns,
            config,
        })
    }

    /// Read every matching preference file
    ///
    /// `greprefs.js` comes first, the other files follow sorted by name,
    /// which is the order their statements are applied in.
    pub fn read_prefs(&self) -> Result<Vec<PrefSource>> {
        let mut sources = match self.read_with_zip_parser() {
            Ok(sources) => sources,
            Err(e) if self.config.unzip_fallback => {
                tracing::warn!(
                    archive = %self.omni_path.display(),
                    error = %e,
                    "zip parser failed, falling back to unzip"
                );
                self.read_with_unzip_command()?
            }
            Err(e) => return Err(e),
        };

        sources.sort_by(|a, b| {
            let key = |s: &PrefSource| (!s.name.ends_with("greprefs.js"), s.name.clone());
            key(a).cmp(&key(b))
        });
        tracing::debug!(
            archive = %self.omni_path.display(),
            files = sources.len(),
            "read preference files from omni.ja"
        );
        Ok(sources)
    }

    /// Whether an archive entry is one of the target files
    fn should_read(&self, name: &str) -> bool {
        if name.contains("..") || name.starts_with('/') || name.starts_with('\\') {
            return false;
        }
        self.patterns
            .iter()
            .any(|pattern| pattern.matches_with(name, MATCH_OPTIONS))
    }

    fn read_with_zip_parser(&self) -> Result<Vec<PrefSource>> {
        let file = fs::File::open(&self.omni_path)?;
        let mut archive =
            ZipArchive::new(file).map_err(|e| Error::ExtractionFailed(e.to_string()))?;

        let mut sources = Vec::new();
        for i in 0..archive.len() {
            let mut entry = archive
                .by_index(i)
                .map_err(|e| Error::ExtractionFailed(e.to_string()))?;
            let name = entry.name().to_string();
            if entry.is_dir() || !self.should_read(&name) {
                continue;
            }
            if entry.size() > MAX_ENTRY_SIZE {
                tracing::warn!(entry = %name, size = entry.size(), "skipping oversized entry");
                continue;
            }

            let mut bytes = Vec::with_capacity(entry.size() as usize);
            entry
                .by_ref()
                .take(MAX_ENTRY_SIZE)
                .read_to_end(&mut bytes)?;
            sources.push(PrefSource {
                content: String::from_utf8_lossy(&bytes).into_owned(),
                name,
            });
        }
        Ok(sources)
    }

    fn read_with_unzip_command(&self) -> Result<Vec<PrefSource>> {
        let out_dir = TempDir::new()?;

        let output = Command::new("unzip")
            .arg("-q")
            .arg("-o")
            .arg(&self.omni_path)
            .arg("-d")
            .arg(out_dir.path())
            .output()
            .map_err(|e| Error::ExtractionFailed(format!("unzip command failed: {}", e)))?;

        // unzip exits non-zero on warnings such as extra leading bytes while
        // still extracting everything
        if !output.status.success() {
            tracing::warn!(
                status = %output.status,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "unzip reported warnings"
            );
        }

        let sources = self.collect_extracted(out_dir.path())?;
        if sources.is_empty() {
            return Err(Error::ExtractionFailed(
                "No preference files were extracted from omni.ja".to_string(),
            ));
        }
        Ok(sources)
    }

    /// Read the target files below an extraction directory
    fn collect_extracted(&self, root: &Path) -> Result<Vec<PrefSource>> {
        let mut sources = Vec::new();
        for entry in walkdir::WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let name = entry
                .path()
                .strip_prefix(root)
                .map_err(|e| Error::ExtractionFailed(format!("Failed to get relative path: {}", e)))?
                .to_string_lossy()
                .replace('\\', "/");
            if !self.should_read(&name) {
                continue;
            }
            if entry.metadata().map(|m| m.len()).unwrap_or(0) > MAX_ENTRY_SIZE {
                continue;
            }
            let bytes = fs::read(entry.path())?;
            sources.push(PrefSource {
                name,
                content: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }
        Ok(sources)
    }
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|p| {
            Pattern::new(p).map_err(|e| Error::InvalidGlobPattern {
                pattern: p.clone(),
                message: e.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::FileOptions;

    fn write_archive(dir: &Path, entries: &[(&str, &str)]) -> PathBuf {
        let path = dir.join("omni.ja");
        let file = fs::File::create(&path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        for (name, content) in entries {
            zip.start_file(*name, FileOptions::default()).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
        path
    }

    #[test]
    fn test_extract_config_default() {
        let config = ExtractConfig::default();
        assert_eq!(config.max_omni_size, DEFAULT_MAX_OMNI_SIZE);
        assert_eq!(config.target_files.len(), PREF_FILE_PATTERNS.len());
        assert!(config.unzip_fallback);
    }

    #[test]
    fn test_should_read_patterns() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_archive(dir.path(), &[]);
        let extractor = OmniExtractor::new(path).unwrap();

        assert!(extractor.should_read("greprefs.js"));
        assert!(extractor.should_read("defaults/pref/browser.js"));
        assert!(extractor.should_read("defaults/preferences/firefox.js"));
        assert!(!extractor.should_read("defaults/pref/readme.txt"));
        assert!(!extractor.should_read("defaults/pref/nested/deep.js"));
        assert!(!extractor.should_read("modules/greprefs.js.map"));
        assert!(!extractor.should_read("../defaults/pref/evil.js"));
    }

    #[test]
    fn test_read_prefs_order_and_filter() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_archive(
            dir.path(),
            &[
                ("defaults/pref/zz.js", "pref(\"z\", 1);"),
                ("chrome/ignored.js", "pref(\"ignored\", 1);"),
                ("greprefs.js", "pref(\"g\", 1);"),
                ("defaults/pref/aa.js", "pref(\"a\", 1);"),
            ],
        );

        let sources = OmniExtractor::new(path).unwrap().read_prefs().unwrap();
        let names: Vec<&str> = sources.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["greprefs.js", "defaults/pref/aa.js", "defaults/pref/zz.js"]);
        assert_eq!(sources[0].content, "pref(\"g\", 1);");
    }

    #[test]
    fn test_missing_archive() {
        let result = OmniExtractor::new(PathBuf::from("/nonexistent/omni.ja"));
        assert!(matches!(result, Err(Error::PrefFileNotFound { .. })));
    }

    #[test]
    fn test_archive_too_large() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_archive(dir.path(), &[("greprefs.js", "pref(\"g\", 1);")]);
        let config = ExtractConfig {
            max_omni_size: 10,
            ..Default::default()
        };
        assert!(matches!(
            OmniExtractor::with_config(path, config),
            Err(Error::OmniJaTooLarge { limit: 10, .. })
        ));
    }

    #[test]
    fn test_invalid_pattern() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_archive(dir.path(), &[]);
        let config = ExtractConfig {
            target_files: vec!["[unclosed".to_string()],
            ..Default::default()
        };
        assert!(matches!(
            OmniExtractor::with_config(path, config),
            Err(Error::InvalidGlobPattern { .. })
        ));
    }

    #[test]
    fn test_not_a_zip_without_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("omni.ja");
        fs::write(&path, b"not a zip archive").unwrap();
        let config = ExtractConfig {
            unzip_fallback: false,
            ..Default::default()
        };
        let extractor = OmniExtractor::with_config(path, config).unwrap();
        assert!(matches!(extractor.read_prefs(), Err(Error::ExtractionFailed(_))));
    }
}
