//! Registry acquisition
//!
//! The engine only sees [`Registry`] snapshots. Getting one means two
//! collaborators: an [`Installer`] that makes a build available on disk,
//! and a [`PrefsReader`] that reads the default branch and the version of
//! an installation. [`acquire_registries`] drives both for the two sides of
//! a diff in parallel.

use crate::error::{Error, Result};
use crate::firefox_locator::{get_firefox_version, omni_archives};
use crate::omni_extractor::{ExtractConfig, OmniExtractor, PrefSource};
use crate::parser::parse_default_prefs;
use crate::types::Registry;
use crate::version::VersionPair;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

/// Makes a Firefox build available locally
pub trait Installer {
    /// Install `version` if needed and return its install directory
    fn install(&self, version: &str) -> Result<PathBuf>;
}

/// Reads the default branch of an installation
pub trait PrefsReader {
    /// Every preference with a default value that the reader can see
    ///
    /// Implementations reading preference files miss the defaults compiled
    /// into the binary (the static pref list), so a key absent from the
    /// result may still be a real preference.
    fn read_default_prefs(&self, install_dir: &Path) -> Result<Registry>;
    /// Version string of the installation (e.g. `"140.0"`)
    fn read_version(&self, install_dir: &Path) -> Result<String>;
}

/// [`PrefsReader`] over the preference files of an installation
///
/// Statements are applied in load order: the omni.ja archives (GRE first,
/// then `browser/`), then unpacked `greprefs.js` and `defaults/pref/*.js`
/// files next to them. Later statements for a key win.
///
/// Defaults compiled into the binary are not in those files and are not
/// reported.
#[derive(Debug, Clone, Default)]
pub struct OmniPrefsReader {
    pub config: ExtractConfig,
}

impl OmniPrefsReader {
    pub fn new(config: ExtractConfig) -> Self {
        Self { config }
    }

    /// All preference sources of an installation, in load order
    fn sources(&self, install_dir: &Path) -> Result<Vec<PrefSource>> {
        let mut sources = Vec::new();
        for archive in omni_archives(install_dir) {
            sources.extend(OmniExtractor::with_config(archive, self.config.clone())?.read_prefs()?);
        }

        let greprefs = install_dir.join("greprefs.js");
        if greprefs.is_file() {
            sources.push(read_source(install_dir, &greprefs)?);
        }

        let pref_dir = install_dir.join("defaults").join("pref");
        if pref_dir.is_dir() {
            let mut files: Vec<PathBuf> = fs::read_dir(&pref_dir)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "js"))
                .collect();
            files.sort();
            for file in files {
                sources.push(read_source(install_dir, &file)?);
            }
        }

        Ok(sources)
    }
}

fn read_source(install_dir: &Path, path: &Path) -> Result<PrefSource> {
    let name = path
        .strip_prefix(install_dir)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned();
    let bytes = fs::read(path)?;
    Ok(PrefSource {
        name,
        content: String::from_utf8_lossy(&bytes).into_owned(),
    })
}

impl PrefsReader for OmniPrefsReader {
    fn read_default_prefs(&self, install_dir: &Path) -> Result<Registry> {
        let mut entries = Vec::new();
        for source in self.sources(install_dir)? {
            let parsed = parse_default_prefs(&source.content).map_err(|e| Error::InvalidPrefFile {
                file: source.name.clone(),
                source: Box::new(e),
            })?;
            tracing::debug!(file = %source.name, count = parsed.len(), "parsed default prefs");
            entries.extend(parsed);
        }

        let registry: Registry = entries.into_iter().collect();
        if registry.is_empty() {
            return Err(Error::NoPreferences(install_dir.to_path_buf()));
        }
        Ok(registry)
    }

    fn read_version(&self, install_dir: &Path) -> Result<String> {
        get_firefox_version(install_dir)
    }
}

/// Install one version and read its default branch
pub fn acquire_registry<I, R>(installer: &I, reader: &R, version: &str) -> Result<Registry>
where
    I: Installer + ?Sized,
    R: PrefsReader + ?Sized,
{
    let install_dir = installer.install(version)?;
    let registry = reader.read_default_prefs(&install_dir)?;
    tracing::info!(version, prefs = registry.len(), "read default preferences");
    Ok(registry)
}

/// Acquire the registries of both versions of a diff in parallel
///
/// Fails if either side fails; no partial result is returned. When both
/// versions are the same the build is installed and read only once.
pub fn acquire_registries<I, R>(
    installer: &I,
    reader: &R,
    versions: &VersionPair,
) -> Result<(Registry, Registry)>
where
    I: Installer + Sync + ?Sized,
    R: PrefsReader + Sync + ?Sized,
{
    if versions.old == versions.new {
        let registry = acquire_registry(installer, reader, &versions.old)?;
        return Ok((registry.clone(), registry));
    }

    thread::scope(|scope| {
        let old = scope.spawn(|| acquire_registry(installer, reader, &versions.old));
        let new = scope.spawn(|| acquire_registry(installer, reader, &versions.new));

        let old = old.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic));
        let new = new.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic));
        Ok((old?, new?))
    })
}
