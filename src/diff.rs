//! Registry diff engine
//!
//! Compares the default preferences of two builds and partitions the keys
//! into added, removed and changed. The result is sorted by key so the
//! output of two runs over the same registries is identical.
//!
//! # Example
//!
//! ```rust
//! use ffdiff::{diff_registries, PrefValue, Registry};
//!
//! let before: Registry = [("x", PrefValue::int(1)), ("y", PrefValue::string("old"))]
//!     .into_iter()
//!     .collect();
//! let after: Registry = [("y", PrefValue::string("new")), ("w", PrefValue::int(5))]
//!     .into_iter()
//!     .collect();
//!
//! let diff = diff_registries(&before, &after);
//! assert_eq!(diff.added[0].key, "w");
//! assert_eq!(diff.removed[0].key, "x");
//! assert_eq!(diff.changed[0].new_value, PrefValue::string("new"));
//! ```

use crate::collation::locale_cmp;
use crate::types::{ChangedPref, PrefEntry, Registry};
use serde::Serialize;
use std::collections::HashSet;

/// Keys whose default value churns between almost every release
///
/// `diff --hide-common-changed-values` drops them from the changed list.
pub const COMMON_CHANGED_VALUE_KEYS: &[&str] = &[
    "browser.newtabpage.activity-stream.discoverystream.spocs-endpoint",
    "extensions.webcompat.perform_injections",
    "gecko.handlerService.defaultHandlersVersion",
    "services.settings.server",
];

/// Result of comparing two registries
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PrefsDiff {
    /// Keys only in the newer registry, with their new value
    pub added: Vec<PrefEntry>,
    /// Keys only in the older registry, with their old value
    pub removed: Vec<PrefEntry>,
    /// Keys in both registries whose value differs
    pub changed: Vec<ChangedPref>,
}

impl PrefsDiff {
    /// Whether the two registries were identical
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }

    /// Drop the given keys from the changed list
    pub fn hide_changed_keys<S: AsRef<str>>(&mut self, keys: &[S]) {
        let hidden: HashSet<&str> = keys.iter().map(|k| k.as_ref()).collect();
        self.changed.retain(|pref| !hidden.contains(pref.key.as_str()));
    }
}

/// Compare two registries
///
/// Values are compared strictly: a number and a string with the same text
/// are different values. Each registry is walked once, with hash lookups
/// into the other one.
pub fn diff_registries(before: &Registry, after: &Registry) -> PrefsDiff {
    let mut added = Vec::new();
    let mut removed = Vec::new();
    let mut changed = Vec::new();

    for (key, value) in before.iter() {
        match after.get(key) {
            None => removed.push(PrefEntry::new(key, value.clone())),
            Some(new_value) if new_value != value => changed.push(ChangedPref {
                key: key.to_string(),
                value: value.clone(),
                new_value: new_value.clone(),
            }),
            Some(_) => {}
        }
    }

    for (key, value) in after.iter() {
        if !before.contains_key(key) {
            added.push(PrefEntry::new(key, value.clone()));
        }
    }

    added.sort_by(|a, b| locale_cmp(&a.key, &b.key));
    removed.sort_by(|a, b| locale_cmp(&a.key, &b.key));
    changed.sort_by(|a, b| locale_cmp(&a.key, &b.key));

    PrefsDiff {
        added,
        removed,
        changed,
    }
}
