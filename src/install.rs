//! Release archive installer
//!
//! Installs Firefox releases from archive.mozilla.org below
//! `<base>/firefox/<os>/`:
//!
//! ```text
//! firefox-140.0.tar.xz      cached archive
//! 140.0/firefox/            extracted installation
//! ```
//!
//! An archive already on disk is reused. Old releases only exist as
//! `.tar.bz2`, so a 404 on the `.tar.xz` URL is retried once with that
//! suffix. A failed extraction deletes the archive and downloads it again
//! once.

use crate::error::{Error, Result};
use crate::firefox::Installer;
use crate::settings::{platform_tag, Settings};
use crate::version::major_version;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

const ARCHIVE_SUFFIXES: &[&str] = &["tar.xz", "tar.bz2"];

/// [`Installer`] over the Mozilla release archive
pub struct ArchiveInstaller {
    install_dir: PathBuf,
    platform: String,
    base_url: String,
    clean_archives: bool,
    client: Client,
}

impl ArchiveInstaller {
    /// Installer for the host platform
    pub fn new(settings: &Settings) -> Result<Self> {
        let platform = platform_tag(std::env::consts::OS, std::env::consts::ARCH)?;
        let client = Client::builder()
            .user_agent(concat!("ff-diff/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Download {
                url: settings.archive_base_url.clone(),
                message: e.to_string(),
            })?;
        Ok(Self::with_client(settings, platform, client))
    }

    pub fn with_client(settings: &Settings, platform: impl Into<String>, client: Client) -> Self {
        Self {
            install_dir: settings.install_dir(),
            platform: platform.into(),
            base_url: settings.archive_base_url.clone(),
            clean_archives: false,
            client,
        }
    }

    /// Delete each archive once it has been extracted
    pub fn clean_archives(mut self, clean: bool) -> Self {
        self.clean_archives = clean;
        self
    }

    /// Extracted installation of a version
    pub fn installation_path(&self, version: &str) -> PathBuf {
        self.install_dir.join(version).join("firefox")
    }

    /// Download URL of a release archive
    pub fn archive_url(&self, version: &str, suffix: &str) -> String {
        format!(
            "{}/{version}/{}/en-US/firefox-{version}.{suffix}",
            self.base_url, self.platform
        )
    }

    /// Cached archive of a version, whatever its compression
    fn cached_archive(&self, version: &str) -> Option<PathBuf> {
        let prefix = format!("firefox-{version}.tar");
        fs::read_dir(&self.install_dir)
            .ok()?
            .filter_map(|entry| entry.ok())
            .find(|entry| {
                entry.file_name().to_string_lossy().starts_with(&prefix)
                    && entry.path().is_file()
            })
            .map(|entry| entry.path())
    }

    fn archive(&self, version: &str) -> Result<PathBuf> {
        if let Some(archive) = self.cached_archive(version) {
            tracing::info!(archive = %archive.display(), "archive already exists, skipping download");
            return Ok(archive);
        }
        tracing::info!(version, "downloading Firefox");
        self.download(version)
    }

    fn download(&self, version: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.install_dir)?;

        for suffix in ARCHIVE_SUFFIXES {
            let url = self.archive_url(version, suffix);
            let mut response = self.client.get(&url).send().map_err(|e| Error::Download {
                url: url.clone(),
                message: e.to_string(),
            })?;

            if response.status() == StatusCode::NOT_FOUND {
                tracing::warn!(%url, "archive not found");
                continue;
            }
            if !response.status().is_success() {
                return Err(Error::Download {
                    url,
                    message: format!("status code {}", response.status()),
                });
            }

            // Written next to the cache, renamed once complete
            let mut part = tempfile::NamedTempFile::new_in(&self.install_dir)?;
            response.copy_to(&mut part).map_err(|e| Error::Download {
                url: url.clone(),
                message: e.to_string(),
            })?;
            let dest = self.install_dir.join(format!("firefox-{version}.{suffix}"));
            part.persist(&dest).map_err(|e| Error::Io(e.error))?;
            tracing::debug!(archive = %dest.display(), "download complete");
            return Ok(dest);
        }

        Err(Error::VersionNotFound {
            version: version.to_string(),
            url: self.archive_url(version, ARCHIVE_SUFFIXES[0]),
        })
    }

    fn install_with_retry(&self, version: &str, retry: bool) -> Result<PathBuf> {
        let archive = self.archive(version)?;
        let dest = self.install_dir.join(version);
        let installation = self.installation_path(version);

        if !installation.join("firefox").exists() {
            fs::create_dir_all(&dest)?;
            if let Err(e) = extract(&archive, &dest) {
                if retry {
                    return Err(e);
                }
                tracing::warn!(error = %e, "extraction failed, downloading the archive again");
                fs::remove_file(&archive)?;
                return self.install_with_retry(version, true);
            }
        }

        if self.clean_archives {
            tracing::info!(version, "removing archive");
            fs::remove_file(&archive)?;
        }
        Ok(installation)
    }
}

impl Installer for ArchiveInstaller {
    fn install(&self, version: &str) -> Result<PathBuf> {
        self.install_with_retry(version, false)
    }
}

/// Extract a tarball with the system `tar`, which picks the decompressor
fn extract(archive: &Path, dest: &Path) -> Result<()> {
    let output = Command::new("tar")
        .arg("-xf")
        .arg(archive)
        .arg("-C")
        .arg(dest)
        .output()
        .map_err(|e| Error::ArchiveExtraction {
            archive: archive.to_path_buf(),
            message: format!("tar command failed: {}", e),
        })?;

    if !output.status.success() {
        return Err(Error::ArchiveExtraction {
            archive: archive.to_path_buf(),
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(())
}

/// What `clean` keeps
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanOptions {
    /// Major versions whose archives and installs are kept
    pub keep: Vec<u32>,
    pub keep_archives: bool,
    pub keep_sources: bool,
}

/// Remove cached installations and archives
///
/// Installations are the directories of `install_dir`, archives its
/// `firefox-*` files; both are matched to `keep` by their major version.
/// Returns the names of the removed entries.
pub fn clean_install_dir(install_dir: &Path, options: &CleanOptions) -> Result<Vec<String>> {
    if !install_dir.is_dir() {
        return Ok(Vec::new());
    }

    let kept = |version: &str| major_version(version).is_some_and(|v| options.keep.contains(&v));

    let mut entries: Vec<_> = fs::read_dir(install_dir)?.collect::<std::io::Result<_>>()?;
    entries.sort_by_key(|entry| entry.file_name());

    let mut removed = Vec::new();
    for entry in entries {
        let name = entry.file_name().to_string_lossy().into_owned();
        let path = entry.path();

        if path.is_dir() {
            if !options.keep_sources && !kept(&name) {
                tracing::info!(folder = %name, "removing installation");
                fs::remove_dir_all(&path)?;
                removed.push(name);
            }
        } else if let Some(version) = name.strip_prefix("firefox-") {
            if !options.keep_archives && !kept(version) {
                tracing::info!(archive = %name, "removing archive");
                fs::remove_file(&path)?;
                removed.push(name);
            }
        }
    }
    Ok(removed)
}
