//! Text and Markdown rendering of the reports
//!
//! Text goes to the console, Markdown to the files saved with
//! `--save-output-in-file`. Every function returns the lines of the report;
//! callers join them with `\n`.

use crate::diff::PrefsDiff;
use crate::reconcile::{DefaultsReport, DiffClaims};
use crate::types::{PrefEntry, PrefValue};
use std::borrow::Cow;

const ADDED_SYMBOL: &str = "✅";
const REMOVED_SYMBOL: &str = "❌";
const CHANGED_SYMBOL: &str = "🔁";

/// Output flavour of a report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Text,
    Markdown,
}

impl Format {
    /// Prefix written before the item symbol
    fn item_start(self) -> &'static str {
        match self {
            Format::Text => " ",
            Format::Markdown => "",
        }
    }

    /// Symbol of an item; Markdown renders every item as a list entry
    fn item_symbol(self, symbol: &'static str) -> &'static str {
        match self {
            Format::Text => symbol,
            Format::Markdown => "-",
        }
    }

    /// Quote around keys and values
    fn tick(self) -> &'static str {
        match self {
            Format::Text => "",
            Format::Markdown => "`",
        }
    }
}

/// Render a value, showing an empty string as a single space so it stays
/// visible in Markdown code spans
pub fn format_value(value: &PrefValue) -> Cow<'_, str> {
    match value {
        PrefValue::String(s) if s.is_empty() => Cow::Borrowed(" "),
        PrefValue::String(s) => Cow::Borrowed(s),
        other => Cow::Owned(other.to_string()),
    }
}

fn section(
    format: Format,
    label: &str,
    version: &str,
    items: Vec<String>,
    lines: &mut Vec<String>,
) {
    match format {
        Format::Text => lines.push(format!("{label} in {version}:")),
        Format::Markdown => lines.push(format!(
            "<details open><summary>\n\n## {label} in {version}\n\n</summary>\n"
        )),
    }

    let mut content = if items.is_empty() {
        "(none)".to_string()
    } else {
        items.join("\n")
    };
    if format == Format::Markdown {
        content.push_str("\n\n</details>");
    }
    lines.push(content);
}

/// The added, removed and changed sections of a diff
///
/// ```rust
/// use ffdiff::format::{diff_lines, Format};
/// use ffdiff::{diff_registries, PrefValue, Registry};
///
/// let before = Registry::default();
/// let after: Registry = [("a.b", PrefValue::int(1))].into_iter().collect();
/// let lines = diff_lines(&diff_registries(&before, &after), "140.0", Format::Text);
/// assert_eq!(lines[0], "✅ New keys in 140.0:");
/// assert_eq!(lines[1], " + a.b: 1");
/// ```
pub fn diff_lines(diff: &PrefsDiff, new_version: &str, format: Format) -> Vec<String> {
    let start = format.item_start();
    let t = format.tick();
    let mut lines = Vec::new();

    let added = diff
        .added
        .iter()
        .map(|e| {
            let symbol = format.item_symbol("+");
            format!("{start}{symbol} {t}{}{t}: {t}{}{t}", e.key, format_value(&e.value))
        })
        .collect();
    section(format, &format!("{ADDED_SYMBOL} New keys"), new_version, added, &mut lines);
    lines.push(String::new());

    let removed = diff
        .removed
        .iter()
        .map(|e| format!("{start}{} {t}{}{t}", format.item_symbol("-"), e.key))
        .collect();
    section(format, &format!("{REMOVED_SYMBOL} Removed keys"), new_version, removed, &mut lines);
    lines.push(String::new());

    let changed = diff
        .changed
        .iter()
        .map(|c| {
            format!(
                "{start}{} {t}{}{t}: {t}{}{t} -> {t}{}{t}",
                format.item_symbol("~"),
                c.key,
                format_value(&c.value),
                format_value(&c.new_value)
            )
        })
        .collect();
    section(format, &format!("{CHANGED_SYMBOL} Changed values"), new_version, changed, &mut lines);

    lines
}

/// Title of the Markdown file saved by `diff`
pub fn diff_title(old_version: &str, new_version: &str) -> String {
    format!("# Diffs Firefox {old_version}-{new_version}\n\n")
}

/// The user.js comparison printed after a diff
pub fn claims_lines(claims: &DiffClaims, new_version: &str) -> Vec<String> {
    if claims.is_empty() {
        return vec!["No prefs from your user.js settings were changed or removed.".to_string()];
    }

    let mut lines = Vec::new();
    let wrong = [
        ("added", &claims.wrong_added_claims),
        ("removed", &claims.wrong_removed_claims),
    ];
    for (kind, prefs) in wrong {
        if prefs.is_empty() {
            continue;
        }
        let items: Vec<String> = prefs.iter().map(|p| format!("~ {}", p.key)).collect();
        lines.push(format!(
            "{REMOVED_SYMBOL} Some prefs are marked as {kind} on version {new_version} but that's incorrect:\n{}\n",
            items.join("\n")
        ));
    }

    if claims.changed_that_are_annotated.is_empty() {
        lines.push("No prefs from your user.js settings were changed.".to_string());
    } else {
        let items: Vec<String> = claims
            .changed_that_are_annotated
            .iter()
            .map(|c| {
                format!(
                    "~ {}: {} -> {}",
                    c.key,
                    format_value(&c.value),
                    format_value(&c.new_value)
                )
            })
            .collect();
        lines.push(format!(
            "{CHANGED_SYMBOL} The following user.js prefs were changed:\n{}",
            items.join("\n")
        ));
    }

    if claims.removed_that_are_annotated.is_empty() {
        lines.push("No prefs from your user.js settings were removed.".to_string());
    } else {
        let items: Vec<String> = claims
            .removed_that_are_annotated
            .iter()
            .map(|e| format!("- {}", e.key))
            .collect();
        lines.push(format!(
            "{REMOVED_SYMBOL} The following prefs were removed:\n{}",
            items.join("\n")
        ));
    }

    lines
}

/// Wrong and implicit defaults of a user.js
pub fn defaults_lines(report: &DefaultsReport, format: Format) -> Vec<String> {
    let t = format.tick();
    let title_suffix = if format == Format::Markdown { "\n" } else { "" };
    let mut lines = Vec::new();

    if report.wrong_defaults.is_empty() {
        lines.push("No wrong default prefs".to_string());
    } else {
        lines.push(format!("Wrong default for:{title_suffix}"));
        lines.extend(report.wrong_defaults.iter().map(|w| {
            format!(
                "- {t}{}{t}: {t}{}{t} should be {t}{}{t}",
                w.key,
                format_value(&w.declared),
                format_value(&w.actual)
            )
        }));
    }

    if !report.is_empty() {
        lines.push(String::new());
    }

    if report.implicit_defaults.is_empty() {
        lines.push("All prefs have a clear explicit default".to_string());
    } else {
        lines.push(format!("Explicit default not set for:{title_suffix}"));
        lines.extend(
            report
                .implicit_defaults
                .iter()
                .map(|e| format!("- {t}{}{t}", e.key)),
        );
    }

    lines
}

/// Title of the Markdown file saved by `default-prefs-userjs`
pub fn defaults_title(version: &str) -> String {
    format!("# Default in your user.js and in Firefox {version}\n\n")
}

/// Keys of a user.js unknown to the registry
pub fn unused_lines(unused: &[String], source: &str) -> Vec<String> {
    if unused.is_empty() {
        return vec![format!("No unused prefs in {source}")];
    }

    let plural = if unused.len() == 1 { "" } else { "s" };
    let mut lines = vec![format!("Unused pref{plural}:")];
    lines.extend(unused.iter().map(|key| format!("- {key}")));
    lines
}

/// Default preference listing, one `- key: <json>` line per entry
pub fn default_prefs_lines(entries: &[PrefEntry]) -> serde_json::Result<Vec<String>> {
    entries
        .iter()
        .map(|e| Ok(format!("- {}: {}", e.key, serde_json::to_string(&e.value)?)))
        .collect()
}

/// Default preferences as a user.js document
pub fn default_prefs_user_js(entries: &[PrefEntry]) -> serde_json::Result<String> {
    let lines = entries
        .iter()
        .map(|e| {
            Ok(format!(
                "user_pref({}, {});",
                serde_json::to_string(&e.key)?,
                serde_json::to_string(&e.value)?
            ))
        })
        .collect::<serde_json::Result<Vec<String>>>()?;
    Ok(lines.join("\n"))
}
