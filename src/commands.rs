use crate::cli::{DiffOptions, OutputOptions, SourceOptions, UserJsOptions};
use anyhow::{bail, Context, Result};
use ffdiff::format::{self, Format};
use ffdiff::{
    acquire_registries, check_defaults, clean_install_dir, diff_registries, find_firefox_installation,
    find_release_profile, find_unused, get_profiles_directory, install_dir_from_profile,
    is_version_newer, parse_user_prefs_file, query_preferences, reconcile, validate_installation,
    AnnotatedPref, ArchiveInstaller, CleanOptions, Installer, OmniPrefsReader, PrefsReader,
    Registry, Settings, VersionPair,
};
use std::fs;
use std::path::{Path, PathBuf};

/// Diff the default preferences of two releases
pub fn diff(settings: &Settings, options: &DiffOptions) -> Result<()> {
    let versions = VersionPair::new(&options.old_version, &options.new_version);
    if is_version_newer(&versions.old, &versions.new) {
        tracing::warn!(
            "{} is newer than {}, the diff will be reversed",
            versions.old,
            versions.new
        );
    }

    let installer = ArchiveInstaller::new(settings)?.clean_archives(options.clean_archives);
    tracing::info!(
        "Installing Firefox {} and {} in {}",
        versions.old,
        versions.new,
        settings.install_dir().display()
    );
    let (old, new) = acquire_registries(&installer, &OmniPrefsReader::default(), &versions)
        .context("Failed to read the default preferences")?;

    if options.clean_sources {
        for version in versions.distinct() {
            tracing::info!("Removing sources for Firefox {}", version);
            let dir = settings.install_dir().join(version);
            fs::remove_dir_all(&dir)
                .with_context(|| format!("Failed to remove {}", dir.display()))?;
        }
    }

    let mut prefs_diff = diff_registries(&old, &new);
    if options.hide_common_changed_values {
        prefs_diff.hide_changed_keys(&settings.hide_changed_keys);
    }

    if !options.output.do_not_print_in_console {
        println!("{}", format::diff_lines(&prefs_diff, &versions.new, Format::Text).join("\n"));
    }
    if options.output.save_output_in_file {
        let content = format!(
            "{}{}\n",
            format::diff_title(&versions.old, &versions.new),
            format::diff_lines(&prefs_diff, &versions.new, Format::Markdown).join("\n")
        );
        save(
            &settings.diffs_dir(),
            &format!("{}-{}.md", versions.old, versions.new),
            &content,
        )?;
    }

    if let Some(user_js) = &options.compare_userjs {
        let annotations = read_user_js(user_js)?;
        tracing::info!("Comparing prefs with the ones from your user.js");
        let report = reconcile(&prefs_diff, &new, &annotations, &versions);
        if !report.unused.is_empty() {
            tracing::debug!(count = report.unused.len(), "user.js has unused prefs");
        }
        println!("\n{}", format::claims_lines(&report.claims, &versions.new).join("\n"));
    }

    Ok(())
}

/// List the prefs of a user.js that the selected build does not know
pub fn unused_prefs(settings: &Settings, options: &UserJsOptions) -> Result<()> {
    let annotations = read_user_js(&options.path)?;
    let (registry, _) = read_registry(settings, &options.source, false)?;

    let unused = find_unused(&registry, &annotations);
    println!(
        "{}",
        format::unused_lines(&unused, &options.path.display().to_string()).join("\n")
    );
    Ok(())
}

/// Check the default values declared in a user.js
pub fn default_prefs_userjs(
    settings: &Settings,
    options: &UserJsOptions,
    output: &OutputOptions,
) -> Result<()> {
    let annotations = read_user_js(&options.path)?;
    let (registry, version) = read_registry(settings, &options.source, true)?;

    let report = check_defaults(&registry, &annotations, &version);
    if !output.do_not_print_in_console {
        println!("\n{}", format::defaults_lines(&report, Format::Text).join("\n"));
    }
    if output.save_output_in_file {
        let content = format!(
            "{}{}\n",
            format::defaults_title(&version),
            format::defaults_lines(&report, Format::Markdown).join("\n")
        );
        save(
            &settings.defaults_userjs_dir(),
            &format!("default-userjs-{version}.md"),
            &content,
        )?;
    }
    Ok(())
}

/// List the default preferences of the selected build
pub fn default_prefs(
    settings: &Settings,
    source: &SourceOptions,
    query: &[String],
    output: &OutputOptions,
) -> Result<()> {
    let (registry, version) = read_registry(settings, source, true)?;

    let patterns: Vec<&str> = query.iter().map(String::as_str).collect();
    let entries = query_preferences(&registry.sorted_entries(), &patterns)
        .context("Failed to apply query")?;

    if !output.do_not_print_in_console {
        println!("{}", format::default_prefs_lines(&entries)?.join("\n"));
    }
    if output.save_output_in_file {
        save(
            &settings.defaults_dir(),
            &format!("{version}-user.js"),
            &format::default_prefs_user_js(&entries)?,
        )?;
    }
    Ok(())
}

/// Remove cached archives and installations
pub fn clean(settings: &Settings, options: &CleanOptions) -> Result<()> {
    if !options.keep.is_empty() {
        let kept: Vec<String> = options.keep.iter().map(u32::to_string).collect();
        tracing::info!("Versions kept: {}", kept.join(", "));
    }

    let install_dir = settings.install_dir();
    let removed = clean_install_dir(&install_dir, options)
        .with_context(|| format!("Failed to clean {}", install_dir.display()))?;

    if removed.is_empty() {
        println!("No archives/sources has been removed");
    } else {
        println!("Cleanup complete.");
    }
    Ok(())
}

fn read_user_js(path: &Path) -> Result<Vec<AnnotatedPref>> {
    parse_user_prefs_file(path).with_context(|| {
        format!(
            "Failed to read user.js at {}. Make sure the file exists and is readable.",
            path.display()
        )
    })
}

/// Default preferences and version of the build selected by `source`
fn read_registry(
    settings: &Settings,
    source: &SourceOptions,
    with_version: bool,
) -> Result<(Registry, String)> {
    let install_dir = resolve_installation(settings, source)?;
    let reader = OmniPrefsReader::default();

    tracing::info!("Getting prefs...");
    let registry = reader.read_default_prefs(&install_dir).with_context(|| {
        format!(
            "Failed to read default preferences from {}",
            install_dir.display()
        )
    })?;

    let version = if with_version {
        tracing::info!("Getting firefox version...");
        reader
            .read_version(&install_dir)
            .with_context(|| format!("Failed to read the version of {}", install_dir.display()))?
    } else {
        String::new()
    };
    Ok((registry, version))
}

/// Installation directory selected by the source options
fn resolve_installation(settings: &Settings, source: &SourceOptions) -> Result<PathBuf> {
    if let Some(version) = &source.firefox_version {
        let installer = ArchiveInstaller::new(settings)?;
        return installer
            .install(version)
            .with_context(|| format!("Failed to install Firefox {version}"));
    }

    if let Some(path) = &source.firefox_path {
        // A path to the binary selects the directory holding it
        let dir = if path.is_file() {
            path.parent().map(Path::to_path_buf).unwrap_or_default()
        } else {
            path.clone()
        };
        return Ok(validate_installation(&dir)
            .with_context(|| format!("No Firefox installation at {}", path.display()))?
            .path);
    }

    let profile = match &source.profile_path {
        Some(profile) => Some(profile.clone()),
        None if source.force_default_profile => {
            let profiles_dir = get_profiles_directory(None)
                .context("Failed to find the Firefox profiles directory")?;
            Some(
                find_release_profile(&profiles_dir)
                    .context("Failed to find the default release profile")?,
            )
        }
        None => None,
    };

    match profile {
        Some(profile) => {
            let dir = install_dir_from_profile(&profile).with_context(|| {
                format!(
                    "Failed to find the installation of profile {}",
                    profile.display()
                )
            })?;
            tracing::debug!(profile = %profile.display(), install = %dir.display(), "resolved installation");
            Ok(dir)
        }
        None => Ok(find_firefox_installation()
            .context("Failed to find a Firefox installation. Use --firefox-path or --firefox-version.")?
            .path),
    }
}

/// Write a report below `dir`, creating it if needed
fn save(dir: &Path, file_name: &str, content: &str) -> Result<PathBuf> {
    if dir.exists() && !dir.is_dir() {
        bail!("there's already something here `{}`", dir.display());
    }
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    let path = dir.join(file_name);
    tracing::info!("Writing output to {}", path.display());
    fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}
