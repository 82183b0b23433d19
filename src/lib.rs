//! # ffdiff - Firefox default preference differ
//!
//! This library compares the default preferences of two Firefox builds and
//! audits the annotations of a `user.js` file against them. It reads the
//! default branch out of an installation's `omni.ja` archives, diffs two
//! such snapshots, and reconciles `user.js` trailing-comment markers
//! (`[FF<N>+]`, `[FF<N>-]`, `[DEFAULT: v FF<N>+]`, `[CUSTOM PREF]`,
//! `[HIDDEN PREF]`) with the result.
//!
//! ## Features
//!
//! - Parse Firefox default preference files (`pref`, `sticky_pref`,
//!   `lock_pref`) with full JavaScript escape sequence support
//! - Read the default branch of an installation from its omni.ja archives
//! - Diff two registries into added, removed and changed keys
//! - Parse annotated user.js files and detect wrong version claims, wrong
//!   declared defaults and unused keys
//! - Install Firefox releases from the Mozilla archive
//! - Render reports as console text or Markdown
//!
//! ## Quick Start
//!
//! ### Diffing two registries
//!
//! ```rust
//! use ffdiff::{diff_registries, PrefValue, Registry};
//!
//! let old: Registry = [("x", PrefValue::int(1)), ("z", PrefValue::Bool(true))]
//!     .into_iter()
//!     .collect();
//! let new: Registry = [("z", PrefValue::Bool(true)), ("w", PrefValue::int(5))]
//!     .into_iter()
//!     .collect();
//!
//! let diff = diff_registries(&old, &new);
//! assert_eq!(diff.added.len(), 1);
//! assert_eq!(diff.removed[0].key, "x");
//! assert!(diff.changed.is_empty());
//! ```
//!
//! ### Auditing a user.js
//!
//! ```rust
//! use ffdiff::{check_defaults, parse_user_prefs, PrefValue, Registry};
//!
//! let user_js = r#"
//!     user_pref("browser.startup.page", 3); // [DEFAULT: 0]
//!     user_pref("network.trr.mode", 5);
//! "#;
//! let registry: Registry = [
//!     ("browser.startup.page", PrefValue::int(1)),
//!     ("network.trr.mode", PrefValue::int(5)),
//! ]
//! .into_iter()
//! .collect();
//!
//! let report = check_defaults(&registry, &parse_user_prefs(user_js), "140.0");
//! assert_eq!(report.wrong_defaults[0].actual, PrefValue::int(1));
//! assert_eq!(report.implicit_defaults[0].key, "network.trr.mode");
//! ```
//!
//! ### Reading an installation
//!
//! ```rust,no_run
//! use ffdiff::{find_firefox_installation, OmniPrefsReader, PrefsReader};
//!
//! let install = find_firefox_installation()?;
//! let registry = OmniPrefsReader::default().read_default_prefs(&install.path)?;
//! println!("Firefox {} has {} default prefs", install.version, registry.len());
//! # Ok::<(), ffdiff::Error>(())
//! ```
//!
//! ## Error Handling
//!
//! The engine (diff and reconciliation) never fails. Reading files and
//! installations returns [`Result<T, Error>`]:
//!
//! ```rust
//! use ffdiff::{parse_default_prefs, Error};
//!
//! match parse_default_prefs("pref(invalid syntax") {
//!     Ok(_) => println!("Parsed successfully"),
//!     Err(Error::Parser { line, column, message }) => {
//!         eprintln!("Parse error at {}:{}: {}", line, column, message);
//!     }
//!     Err(e) => eprintln!("Other error: {}", e),
//! }
//! ```

// Re-export all public types at crate root
pub use types::{
    AnnotatedPref, ChangedPref, DefaultAnnotation, FirefoxInstallation, PrefEntry, PrefValue,
    PrefValueExt, Registry,
};

// Re-export error types
pub use error::{Error, Result};

// Engine
pub use annotations::{parse_user_prefs, parse_user_prefs_file, parse_value};
pub use collation::locale_cmp;
pub use diff::{diff_registries, PrefsDiff, COMMON_CHANGED_VALUE_KEYS};
pub use reconcile::{
    check_defaults, check_diff_claims, find_unused, reconcile, DefaultsReport, DiffClaims,
    ReconciliationReport, WrongDefault,
};
pub use version::{
    is_unit_difference_one, is_version_newer, major_version, starts_with_number_dot_number,
    VersionPair,
};

// Default preference files
pub use parser::{parse_default_prefs, parse_prefs_js, PrefKind, PrefStatement};
pub use query::query_preferences;

// Registry acquisition
pub use firefox::{acquire_registries, acquire_registry, Installer, OmniPrefsReader, PrefsReader};
pub use firefox_locator::{find_firefox_installation, get_firefox_version, validate_installation};
pub use install::{clean_install_dir, ArchiveInstaller, CleanOptions};
pub use omni_extractor::{ExtractConfig, OmniExtractor, PrefSource, DEFAULT_MAX_OMNI_SIZE};
pub use profile::{
    find_release_profile, get_profiles_directory, install_dir_from_profile, list_profiles,
    FirefoxProfile,
};
pub use settings::Settings;

pub mod format;

// Everything else is private - use re-exports above for public API
mod annotations;
mod collation;
mod diff;
mod error;
mod firefox;
mod firefox_locator;
mod install;
mod lexer;
mod omni_extractor;
mod parser;
mod profile;
mod query;
mod reconcile;
mod scanner;
mod settings;
mod types;
mod version;
