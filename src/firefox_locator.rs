//! Firefox installation locator
//!
//! Finds the system Firefox installation, validates install directories
//! given on the command line or derived from a profile, and reads the
//! version of an installation from its `application.ini`.

use crate::error::{Error, Result};
use crate::types::FirefoxInstallation;
use configparser::ini::Ini;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Platform-specific Firefox installation search paths
#[cfg(target_os = "linux")]
const FIREFOX_SEARCH_PATHS: &[&str] = &[
    "/usr/lib/firefox",
    "/usr/lib64/firefox",
    "/opt/firefox",
    "/usr/local/firefox",
    "/opt/firefox-beta",
    "/opt/firefox-esr",
];

#[cfg(target_os = "macos")]
const FIREFOX_SEARCH_PATHS: &[&str] = &[
    "/Applications/Firefox.app/Contents/Resources",
    "/Applications/Firefox Beta.app/Contents/Resources",
];

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
const FIREFOX_SEARCH_PATHS: &[&str] = &[];

/// Launchers that may be symlinks into the real installation
#[cfg(target_os = "linux")]
const LAUNCHER_PATHS: &[&str] = &[
    "/usr/bin/firefox",
    "/nix/var/nix/profiles/default/bin/firefox",
    "/run/current-system/sw/bin/firefox",
];

#[cfg(not(target_os = "linux"))]
const LAUNCHER_PATHS: &[&str] = &[];

/// omni.ja locations relative to an install directory, GRE archive first
const OMNI_JA_PATHS: &[&str] = &["omni.ja", "browser/omni.ja"];

/// Find the first valid Firefox installation on the system
///
/// # Example
///
/// ```rust,no_run
/// use ffdiff::find_firefox_installation;
///
/// match find_firefox_installation() {
///     Ok(install) => println!("Found Firefox {} at {:?}", install.version, install.path),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn find_firefox_installation() -> Result<FirefoxInstallation> {
    let search_paths = get_all_search_paths();

    for path in &search_paths {
        if let Ok(install) = validate_installation(path) {
            tracing::debug!(path = %path.display(), version = %install.version, "found Firefox");
            return Ok(install);
        }
    }

    Err(Error::FirefoxNotFound {
        searched_paths: search_paths
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", "),
    })
}

/// Check that a directory holds a Firefox installation
///
/// A valid installation has an `omni.ja` (at the root or under `browser/`)
/// or an unpacked `greprefs.js`. The version is `"unknown"` when no ini
/// file provides one.
pub fn validate_installation(path: &Path) -> Result<FirefoxInstallation> {
    if !path.is_dir() {
        return Err(Error::FirefoxNotFound {
            searched_paths: path.display().to_string(),
        });
    }

    let has_omni_ja = !omni_archives(path).is_empty();
    let has_greprefs = path.join("greprefs.js").is_file();

    if !has_omni_ja && !has_greprefs {
        return Err(Error::FirefoxNotFound {
            searched_paths: format!("{} (no omni.ja or greprefs.js found)", path.display()),
        });
    }

    let version = get_firefox_version(path).unwrap_or_else(|_| "unknown".to_string());

    Ok(FirefoxInstallation {
        version,
        path: path.to_path_buf(),
        has_greprefs,
        has_omni_ja,
    })
}

/// The omni.ja archives of an installation, GRE archive first
pub fn omni_archives(install_path: &Path) -> Vec<PathBuf> {
    OMNI_JA_PATHS
        .iter()
        .map(|relative| install_path.join(relative))
        .filter(|p| p.is_file())
        .collect()
}

/// Get the Firefox version of an installation directory
///
/// Reads `Version` from the `[App]` section of `application.ini`, falling
/// back to `Milestone` in the `[Build]` section of `platform.ini`.
pub fn get_firefox_version(install_path: &Path) -> Result<String> {
    let candidates = [
        ("application.ini", "App", "Version"),
        ("platform.ini", "Build", "Milestone"),
    ];

    for (file, section, key) in candidates {
        let ini_path = install_path.join(file);
        if !ini_path.is_file() {
            continue;
        }
        if let Some(version) = read_ini_value(&ini_path, section, key)? {
            return Ok(version);
        }
    }

    Err(Error::FirefoxNotFound {
        searched_paths: format!("{} (no version info found)", install_path.display()),
    })
}

/// Read one value of an ini file; empty values count as missing
pub(crate) fn read_ini_value(ini_path: &Path, section: &str, key: &str) -> Result<Option<String>> {
    let content = fs::read_to_string(ini_path)?;
    let mut ini = Ini::new();
    ini.read(content).map_err(|message| Error::IniParse {
        file: ini_path.to_path_buf(),
        message,
    })?;

    Ok(ini
        .get(section, key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty()))
}

/// Install directory behind a launcher, following symlinks
fn resolve_launcher(launcher: &Path) -> Option<PathBuf> {
    let target = fs::canonicalize(launcher).ok()?;
    target.parent().map(Path::to_path_buf)
}

/// All directories worth checking for an installation
fn get_all_search_paths() -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = FIREFOX_SEARCH_PATHS.iter().map(PathBuf::from).collect();

    for launcher in LAUNCHER_PATHS {
        if let Some(dir) = resolve_launcher(Path::new(launcher)) {
            paths.push(dir);
        }
    }

    if let Ok(output) = Command::new("which").arg("firefox").output() {
        if output.status.success() {
            let launcher = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if let Some(dir) = resolve_launcher(Path::new(&launcher)) {
                paths.push(dir);
            }
        }
    }

    paths.dedup();
    paths
}
