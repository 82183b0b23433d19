//! Firefox profile lookup
//!
//! Resolves the profiles directory, lists the profiles of `profiles.ini`,
//! picks the release profile for `--force-default-profile`, and maps a
//! profile to the installation that last ran it through the profile's
//! `compatibility.ini`.

use crate::error::{Error, Result};
use crate::firefox_locator::read_ini_value;
use configparser::ini::Ini;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Profiles directory below the home directory
pub const MOZILLA_PROFILES_DIR: &str = ".mozilla/firefox";

/// A profile listed in profiles.ini
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FirefoxProfile {
    pub name: String,
    /// Absolute profile path
    pub path: PathBuf,
    pub is_default: bool,
}

/// Get the profiles directory path
///
/// Priority: the given path, then the `MOZ_PROFILES_DIR` environment
/// variable, then `~/.mozilla/firefox`.
pub fn get_profiles_directory(manual_path: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = manual_path {
        return validate_profiles_dir(path);
    }

    if let Ok(env_path) = std::env::var("MOZ_PROFILES_DIR") {
        return validate_profiles_dir(Path::new(&env_path));
    }

    let home = dirs::home_dir()
        .ok_or_else(|| Error::ProfileNotFound("home directory not found".to_string()))?;
    validate_profiles_dir(&home.join(MOZILLA_PROFILES_DIR))
}

fn validate_profiles_dir(path: &Path) -> Result<PathBuf> {
    if !path.exists() {
        return Err(Error::ProfileNotFound(format!(
            "profiles directory does not exist: {}",
            path.display()
        )));
    }
    if !path.is_dir() {
        return Err(Error::ProfileNotFound(format!(
            "profiles directory path is not a directory: {}",
            path.display()
        )));
    }
    Ok(path.to_path_buf())
}

/// Parse profiles.ini content, resolving relative paths against
/// `profiles_dir`
///
/// Profiles come back in the order of their `[ProfileN]` sections.
pub fn parse_profiles_ini(content: &str, profiles_dir: &Path) -> std::result::Result<Vec<FirefoxProfile>, String> {
    let mut ini = Ini::new();
    ini.read(content.to_string())?;

    // configparser lowercases section names and does not keep their order
    let mut sections: Vec<(u32, String)> = ini
        .sections()
        .into_iter()
        .filter_map(|section| {
            let index = section.strip_prefix("profile")?.parse().ok()?;
            Some((index, section))
        })
        .collect();
    sections.sort();

    let mut profiles = Vec::new();
    for (_, section) in sections {
        let name = ini.get(&section, "Name").unwrap_or_default();
        let path = ini.get(&section, "Path").unwrap_or_default();
        if name.is_empty() || path.is_empty() {
            continue;
        }

        let is_relative = ini.get(&section, "IsRelative").map_or(true, |v| v.trim() == "1");
        let is_default = ini.get(&section, "Default").is_some_and(|v| v.trim() == "1");
        let path = if is_relative {
            profiles_dir.join(path)
        } else {
            PathBuf::from(path)
        };

        profiles.push(FirefoxProfile {
            name,
            path,
            is_default,
        });
    }
    Ok(profiles)
}

/// List the profiles of a profiles directory
pub fn list_profiles(profiles_dir: &Path) -> Result<Vec<FirefoxProfile>> {
    let ini_path = profiles_dir.join("profiles.ini");
    if !ini_path.is_file() {
        return Err(Error::ProfileNotFound(format!(
            "profiles.ini not found at {}",
            ini_path.display()
        )));
    }

    let content = std::fs::read_to_string(&ini_path)?;
    parse_profiles_ini(&content, profiles_dir).map_err(|message| Error::IniParse {
        file: ini_path,
        message,
    })
}

/// Path of the first profile whose name contains `release`
///
/// This is the profile a default Firefox install creates
/// (`default-release`).
pub fn find_release_profile(profiles_dir: &Path) -> Result<PathBuf> {
    list_profiles(profiles_dir)?
        .into_iter()
        .find(|profile| profile.name.contains("release"))
        .map(|profile| profile.path)
        .filter(|path| path.is_dir())
        .ok_or_else(|| {
            Error::ProfileNotFound(format!(
                "no release profile in {}",
                profiles_dir.join("profiles.ini").display()
            ))
        })
}

/// Installation directory that last ran a profile
///
/// Read from `LastPlatformDir` in the profile's `compatibility.ini`.
pub fn install_dir_from_profile(profile_path: &Path) -> Result<PathBuf> {
    let ini_path = profile_path.join("compatibility.ini");
    if !ini_path.is_file() {
        return Err(Error::ProfileNotFound(format!(
            "compatibility.ini not found in {}",
            profile_path.display()
        )));
    }

    read_ini_value(&ini_path, "Compatibility", "LastPlatformDir")?
        .map(PathBuf::from)
        .ok_or_else(|| {
            Error::ProfileNotFound(format!(
                "no LastPlatformDir in {}",
                ini_path.display()
            ))
        })
}
