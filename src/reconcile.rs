//! Reconciliation of user.js annotations against the default branch
//!
//! Three independent checks compare what a user.js claims with what the
//! browser actually ships:
//!
//! - [`check_diff_claims`]: `[FF<N>+]` / `[FF<N>-]` markers and versioned
//!   defaults against the diff of two consecutive releases
//! - [`check_defaults`]: `[DEFAULT: v]` markers against a registry
//! - [`find_unused`]: keys the registry does not know about
//!
//! [`reconcile`] runs all three for the `diff --compare-userjs` flow. None of
//! the checks fail; every lookup goes through a hash map built once per call.

use crate::collation::locale_cmp;
use crate::diff::PrefsDiff;
use crate::types::{AnnotatedPref, ChangedPref, PrefEntry, PrefValue, Registry};
use crate::version::{major_version, VersionPair};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Version markers and versioned defaults checked against a diff
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DiffClaims {
    /// Annotations claiming `[FF<new>+]` for a key the diff did not add
    pub wrong_added_claims: Vec<AnnotatedPref>,
    /// Annotations claiming `[FF<new>-]` for a key the diff did not remove
    pub wrong_removed_claims: Vec<AnnotatedPref>,
    /// Changed prefs whose old value is annotated as the default up to `new`
    pub changed_that_are_annotated: Vec<ChangedPref>,
    /// Removed prefs still used by the user.js without a removal marker
    pub removed_that_are_annotated: Vec<PrefEntry>,
}

impl DiffClaims {
    pub fn is_empty(&self) -> bool {
        self.wrong_added_claims.is_empty()
            && self.wrong_removed_claims.is_empty()
            && self.changed_that_are_annotated.is_empty()
            && self.removed_that_are_annotated.is_empty()
    }
}

/// A `[DEFAULT: v]` marker that disagrees with the registry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WrongDefault {
    pub key: String,
    /// Value written in the annotation
    pub declared: PrefValue,
    /// Value found in the registry
    pub actual: PrefValue,
}

/// Result of [`check_defaults`]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DefaultsReport {
    /// Annotated defaults that do not match the registry
    pub wrong_defaults: Vec<WrongDefault>,
    /// Prefs set to their default value without saying so
    pub implicit_defaults: Vec<PrefEntry>,
}

impl DefaultsReport {
    pub fn is_empty(&self) -> bool {
        self.wrong_defaults.is_empty() && self.implicit_defaults.is_empty()
    }
}

/// Everything [`reconcile`] found
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReconciliationReport {
    #[serde(flatten)]
    pub claims: DiffClaims,
    #[serde(flatten)]
    pub defaults: DefaultsReport,
    pub unused: Vec<String>,
}

/// Group annotations by key, keeping document order within a key
fn by_key(annotations: &[AnnotatedPref]) -> HashMap<&str, Vec<&AnnotatedPref>> {
    let mut map: HashMap<&str, Vec<&AnnotatedPref>> = HashMap::new();
    for pref in annotations {
        map.entry(pref.key.as_str()).or_default().push(pref);
    }
    map
}

/// Check version markers and versioned defaults against a diff
///
/// The added/removed claims are only meaningful when the two versions are
/// consecutive releases; otherwise both lists stay empty.
///
/// ```rust
/// use ffdiff::{check_diff_claims, parse_user_prefs, PrefsDiff, VersionPair};
///
/// let annotations = parse_user_prefs(r#"user_pref("a.b", 1); // [FF140+]"#);
/// let claims = check_diff_claims(
///     &PrefsDiff::default(),
///     &annotations,
///     &VersionPair::new("139.0", "140.0"),
/// );
/// assert_eq!(claims.wrong_added_claims[0].key, "a.b");
/// ```
pub fn check_diff_claims(
    diff: &PrefsDiff,
    annotations: &[AnnotatedPref],
    versions: &VersionPair,
) -> DiffClaims {
    let new_major = versions.new_major();
    let annotated = by_key(annotations);

    let mut wrong_added_claims = Vec::new();
    let mut wrong_removed_claims = Vec::new();

    if versions.one_release_apart() && new_major.is_some() {
        let added: HashSet<&str> = diff.added.iter().map(|e| e.key.as_str()).collect();
        let removed: HashSet<&str> = diff.removed.iter().map(|e| e.key.as_str()).collect();

        wrong_added_claims = annotations
            .iter()
            .filter(|p| p.version_added == new_major && !added.contains(p.key.as_str()))
            .cloned()
            .collect();
        wrong_removed_claims = annotations
            .iter()
            .filter(|p| p.version_removed == new_major && !removed.contains(p.key.as_str()))
            .cloned()
            .collect();
    }

    let changed_that_are_annotated = diff
        .changed
        .iter()
        .filter(|changed| {
            annotated.get(changed.key.as_str()).is_some_and(|prefs| {
                prefs.iter().any(|p| {
                    p.default.as_ref().is_some_and(|d| {
                        new_major.is_some() && d.version == new_major && d.value == changed.value
                    })
                })
            })
        })
        .cloned()
        .collect();

    let removed_that_are_annotated = diff
        .removed
        .iter()
        .filter(|removed| {
            annotated
                .get(removed.key.as_str())
                .is_some_and(|prefs| prefs.iter().any(|p| p.version_removed.is_none()))
        })
        .cloned()
        .collect();

    DiffClaims {
        wrong_added_claims,
        wrong_removed_claims,
        changed_that_are_annotated,
        removed_that_are_annotated,
    }
}

/// Check `[DEFAULT: v]` markers against the registry of `version`
///
/// A default annotated for a later version (`[DEFAULT: v FF<N>+]` with `N`
/// above the major of `version`) is not reported. Keys the registry does
/// not contain are skipped; [`find_unused`] reports those. Both lists are
/// sorted by key.
pub fn check_defaults(
    registry: &Registry,
    annotations: &[AnnotatedPref],
    version: &str,
) -> DefaultsReport {
    let major = major_version(version);
    let mut sorted: Vec<&AnnotatedPref> = annotations.iter().collect();
    sorted.sort_by(|a, b| locale_cmp(&a.key, &b.key));

    let mut report = DefaultsReport::default();
    for pref in sorted {
        let Some(actual) = registry.get(&pref.key) else {
            continue;
        };

        match &pref.default {
            None => {
                if pref.value == *actual {
                    report
                        .implicit_defaults
                        .push(PrefEntry::new(pref.key.as_str(), actual.clone()));
                }
            }
            Some(default) => {
                let applies = match default.version {
                    None => true,
                    Some(since) => major.is_some_and(|major| since <= major),
                };
                if applies && default.value != *actual {
                    report.wrong_defaults.push(WrongDefault {
                        key: pref.key.clone(),
                        declared: default.value.clone(),
                        actual: actual.clone(),
                    });
                }
            }
        }
    }
    report
}

/// Keys of the user.js that the registry does not know about
///
/// Keys marked as removed, custom or hidden are expected to be missing and
/// are left out. The result is sorted and free of duplicates.
///
/// ```rust
/// use ffdiff::{find_unused, parse_user_prefs, PrefValue, Registry};
///
/// let registry: Registry = [("a.b", PrefValue::int(1))].into_iter().collect();
/// let annotations = parse_user_prefs(
///     r#"user_pref("a.b", 1);
///        user_pref("gone", 1); // [FF120-]
///        user_pref("typo", 1);"#,
/// );
/// assert_eq!(find_unused(&registry, &annotations), vec!["typo"]);
/// ```
pub fn find_unused(registry: &Registry, annotations: &[AnnotatedPref]) -> Vec<String> {
    let mut unused: Vec<String> = annotations
        .iter()
        .filter(|p| {
            !registry.contains_key(&p.key) && p.version_removed.is_none() && !p.custom && !p.hidden
        })
        .map(|p| p.key.clone())
        .collect();
    unused.sort_by(|a, b| locale_cmp(a, b));
    unused.dedup();
    unused
}

/// Run every check for a diff between `versions.old` and `versions.new`
///
/// `registry` is the registry of the newer version.
pub fn reconcile(
    diff: &PrefsDiff,
    registry: &Registry,
    annotations: &[AnnotatedPref],
    versions: &VersionPair,
) -> ReconciliationReport {
    ReconciliationReport {
        claims: check_diff_claims(diff, annotations, versions),
        defaults: check_defaults(registry, annotations, &versions.new),
        unused: find_unused(registry, annotations),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::parse_user_prefs;
    use crate::diff::diff_registries;
    use crate::types::DefaultAnnotation;
    use pretty_assertions::assert_eq;

    fn registry(entries: &[(&str, PrefValue)]) -> Registry {
        entries.iter().cloned().collect()
    }

    fn keys(prefs: &[AnnotatedPref]) -> Vec<&str> {
        prefs.iter().map(|p| p.key.as_str()).collect()
    }

    #[test]
    fn test_unused_exclusions() {
        let registry = registry(&[("a.b", PrefValue::int(1))]);
        let mut removed = AnnotatedPref::new("c.d", 1);
        removed.version_removed = Some(120);
        let mut custom = AnnotatedPref::new("e.f", 1);
        custom.custom = true;
        let mut hidden = AnnotatedPref::new("g.h", 1);
        hidden.hidden = true;
        let annotations = vec![
            AnnotatedPref::new("a.b", 1),
            removed,
            custom,
            hidden,
            AnnotatedPref::new("i.j", 1),
        ];

        assert_eq!(find_unused(&registry, &annotations), vec!["i.j".to_string()]);
    }

    #[test]
    fn test_unused_sorted_and_deduplicated() {
        let annotations = parse_user_prefs(
            r#"
            user_pref("zeta", 1);
            user_pref("Alpha", 1);
            user_pref("zeta", 2);
            user_pref("beta", 1);
            "#,
        );
        assert_eq!(
            find_unused(&Registry::default(), &annotations),
            vec!["Alpha", "beta", "zeta"]
        );
    }

    #[test]
    fn test_wrong_claims_gated_by_unit_difference() {
        let annotations = parse_user_prefs(
            r#"
            user_pref("not.added", 1); // [FF141+]
            user_pref("not.removed", 1); // [FF141-]
            "#,
        );
        let diff = PrefsDiff::default();

        let far = check_diff_claims(&diff, &annotations, &VersionPair::new("139.0", "141.0"));
        assert!(far.wrong_added_claims.is_empty());
        assert!(far.wrong_removed_claims.is_empty());

        let near = check_diff_claims(&diff, &annotations, &VersionPair::new("140.0", "141.0"));
        assert_eq!(keys(&near.wrong_added_claims), vec!["not.added"]);
        assert_eq!(keys(&near.wrong_removed_claims), vec!["not.removed"]);
    }

    #[test]
    fn test_correct_claims_not_reported() {
        let before = registry(&[("old.pref", PrefValue::int(1))]);
        let after = registry(&[("new.pref", PrefValue::int(1))]);
        let diff = diff_registries(&before, &after);
        let annotations = parse_user_prefs(
            r#"
            user_pref("new.pref", 1); // [FF140+]
            user_pref("old.pref", 1); // [FF140-]
            user_pref("stale.pref", 1); // [FF140-]
            "#,
        );

        let claims = check_diff_claims(&diff, &annotations, &VersionPair::new("139.0", "140.0"));
        assert!(claims.wrong_added_claims.is_empty());
        assert_eq!(keys(&claims.wrong_removed_claims), vec!["stale.pref"]);
        assert!(claims.removed_that_are_annotated.is_empty());
    }

    #[test]
    fn test_changed_that_are_annotated() {
        let before = registry(&[
            ("flip", PrefValue::Bool(false)),
            ("other", PrefValue::int(1)),
        ]);
        let after = registry(&[("flip", PrefValue::Bool(true)), ("other", PrefValue::int(2))]);
        let diff = diff_registries(&before, &after);
        let annotations = parse_user_prefs(
            r#"
            user_pref("flip", true); // [DEFAULT: false FF140+]
            user_pref("other", 2); // [DEFAULT: 1 FF139+]
            "#,
        );

        let claims = check_diff_claims(&diff, &annotations, &VersionPair::new("139.0", "140.0"));
        assert_eq!(claims.changed_that_are_annotated.len(), 1);
        assert_eq!(claims.changed_that_are_annotated[0].key, "flip");
    }

    #[test]
    fn test_removed_that_are_annotated() {
        let before = registry(&[("gone.a", PrefValue::int(1)), ("gone.b", PrefValue::int(1))]);
        let diff = diff_registries(&before, &Registry::default());
        let annotations = parse_user_prefs(
            r#"
            user_pref("gone.a", 1);
            user_pref("gone.b", 1); // [FF140-]
            "#,
        );

        let claims = check_diff_claims(&diff, &annotations, &VersionPair::new("120.0", "140.0"));
        assert_eq!(claims.removed_that_are_annotated, vec![PrefEntry::new("gone.a", 1)]);
    }

    #[test]
    fn test_check_defaults() {
        let registry = registry(&[
            ("wrong", PrefValue::int(2)),
            ("right", PrefValue::int(1)),
            ("future", PrefValue::int(5)),
            ("implicit", PrefValue::Bool(true)),
            ("falsy", PrefValue::string("x")),
        ]);
        let annotations = parse_user_prefs(
            r#"
            user_pref("wrong", 0); // [DEFAULT: 1]
            user_pref("right", 0); // [DEFAULT: 1]
            user_pref("future", 0); // [DEFAULT: 1 FF141+]
            user_pref("implicit", true);
            user_pref("falsy", "y"); // [DEFAULT: ""]
            user_pref("missing", 1); // [DEFAULT: 2]
            "#,
        );

        let report = check_defaults(&registry, &annotations, "140.0");
        assert_eq!(
            report.wrong_defaults,
            vec![
                WrongDefault {
                    key: "falsy".to_string(),
                    declared: PrefValue::string(""),
                    actual: PrefValue::string("x"),
                },
                WrongDefault {
                    key: "wrong".to_string(),
                    declared: PrefValue::int(1),
                    actual: PrefValue::int(2),
                },
            ]
        );
        assert_eq!(report.implicit_defaults, vec![PrefEntry::new("implicit", true)]);
    }

    #[test]
    fn test_check_defaults_version_gate_inclusive() {
        let registry = registry(&[("k", PrefValue::int(5))]);
        let mut pref = AnnotatedPref::new("k", 0);
        pref.default = Some(DefaultAnnotation {
            value: PrefValue::int(1),
            version: Some(140),
        });

        assert_eq!(check_defaults(&registry, &[pref.clone()], "140.0").wrong_defaults.len(), 1);
        assert!(check_defaults(&registry, &[pref], "139.0").is_empty());
    }

    #[test]
    fn test_defaults_mutually_exclusive() {
        let registry = registry(&[("k", PrefValue::int(1))]);
        let annotations = parse_user_prefs(r#"user_pref("k", 1); // [DEFAULT: 2]"#);
        let report = check_defaults(&registry, &annotations, "140.0");
        assert_eq!(report.wrong_defaults.len(), 1);
        assert!(report.implicit_defaults.is_empty());
    }

    #[test]
    fn test_reconcile_composes_checks() {
        let before = registry(&[("x", PrefValue::int(1)), ("y", PrefValue::string("old"))]);
        let after = registry(&[("y", PrefValue::string("new")), ("w", PrefValue::int(5))]);
        let diff = diff_registries(&before, &after);
        let annotations = parse_user_prefs(
            r#"
            user_pref("x", 1);
            user_pref("y", "mine"); // [DEFAULT: "old" FF140+]
            user_pref("w", 5);
            "#,
        );

        let report = reconcile(&diff, &after, &annotations, &VersionPair::new("139.0", "140.0"));
        assert_eq!(report.claims.removed_that_are_annotated, vec![PrefEntry::new("x", 1)]);
        assert_eq!(report.claims.changed_that_are_annotated[0].key, "y");
        assert_eq!(report.defaults.wrong_defaults[0].key, "y");
        assert_eq!(report.defaults.implicit_defaults, vec![PrefEntry::new("w", 5)]);
        assert_eq!(report.unused, vec!["x"]);
    }
}
