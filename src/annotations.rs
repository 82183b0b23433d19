//! Parser for annotated user.js files
//!
//! A user.js file assigns preferences with `user_pref(key, value);` and may
//! document each assignment with markers in a trailing comment:
//!
//! ```text
//! user_pref("browser.startup.page", 3); // [DEFAULT: 1]
//! user_pref("network.trr.mode", 5); // [FF120+] [DEFAULT: 0 FF122+]
//! user_pref("browser.old.pref", false); // [FF100-]
//! user_pref("my.own.pref", true); // [CUSTOM PREF]
//! user_pref("ui.hidden.pref", 1); // [HIDDEN PREF]
//! ```
//!
//! Parsing happens in two phases: a scanner splits the text into
//! statements, then each comment is matched against independent marker
//! patterns. Markers may appear in any order; unknown text is ignored.
//!
//! # Example
//!
//! ```rust
//! use ffdiff::{parse_user_prefs, DefaultAnnotation, PrefValue};
//!
//! let prefs = parse_user_prefs(r#"user_pref("k", 1); // [DEFAULT: "hello" FF138+]"#);
//! assert_eq!(prefs[0].value, PrefValue::int(1));
//! assert_eq!(
//!     prefs[0].default,
//!     Some(DefaultAnnotation { value: PrefValue::string("hello"), version: Some(138) })
//! );
//! ```

use crate::error::Result;
use crate::scanner::Scanner;
use crate::types::{AnnotatedPref, DefaultAnnotation, PrefValue};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

const CUSTOM_MARKER: &str = "[CUSTOM PREF]";
const HIDDEN_MARKER: &str = "[HIDDEN PREF]";

static VERSION_ADDED: OnceLock<Regex> = OnceLock::new();
static VERSION_REMOVED: OnceLock<Regex> = OnceLock::new();
static DEFAULT_VALUE: OnceLock<Regex> = OnceLock::new();

fn version_added_re() -> &'static Regex {
    VERSION_ADDED.get_or_init(|| Regex::new(r"\[FF(\d+)\+\]").expect("valid regex"))
}

fn version_removed_re() -> &'static Regex {
    VERSION_REMOVED.get_or_init(|| Regex::new(r"\[FF(\d+)-\]").expect("valid regex"))
}

fn default_value_re() -> &'static Regex {
    DEFAULT_VALUE.get_or_init(|| {
        Regex::new(r"\[DEFAULT:\s*([^\[\]]+?)(\s+FF(\d+)\+)?\]").expect("valid regex")
    })
}

/// Parse every `user_pref` statement of a user.js document
///
/// Never fails: text that is not a statement is skipped, and a document
/// without statements yields an empty list. Duplicate keys are kept in
/// document order.
pub fn parse_user_prefs(content: &str) -> Vec<AnnotatedPref> {
    Scanner::new(content)
        .map(|statement| {
            let comment = statement.comment;
            AnnotatedPref {
                key: statement.key.to_string(),
                value: parse_value(statement.raw_value),
                version_added: marker_version(comment, version_added_re()),
                version_removed: marker_version(comment, version_removed_re()),
                custom: comment.contains(CUSTOM_MARKER),
                hidden: comment.contains(HIDDEN_MARKER),
                default: parse_default(comment),
            }
        })
        .collect()
}

/// Read and parse a user.js file
pub fn parse_user_prefs_file(path: &Path) -> Result<Vec<AnnotatedPref>> {
    let content = std::fs::read_to_string(path)?;
    let prefs = parse_user_prefs(&content);
    tracing::debug!(path = %path.display(), count = prefs.len(), "parsed user.js");
    Ok(prefs)
}

/// Convert the raw text of a value into a [`PrefValue`]
///
/// `true`/`false` become booleans, text wrapped in matching quotes becomes
/// a string (one layer of quotes removed, escapes left as written), anything
/// else is read as a number. Text that is not a number yields `NaN`.
pub fn parse_value(raw: &str) -> PrefValue {
    let trimmed = raw.trim();

    match trimmed {
        "true" => return PrefValue::Bool(true),
        "false" => return PrefValue::Bool(false),
        _ => {}
    }

    let bytes = trimmed.as_bytes();
    if bytes.len() >= 2 {
        let first = bytes[0];
        if (first == b'"' || first == b'\'') && bytes[bytes.len() - 1] == first {
            return PrefValue::String(trimmed[1..trimmed.len() - 1].to_string());
        }
    }

    PrefValue::Number(parse_number(trimmed))
}

/// Numeric literal parsing following JavaScript `Number()` for the forms
/// found in user.js files
fn parse_number(text: &str) -> f64 {
    if text.is_empty() {
        return f64::NAN;
    }

    match text {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    let radix = match text.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        return u64::from_str_radix(&text[2..], radix)
            .map(|n| n as f64)
            .unwrap_or(f64::NAN);
    }

    // f64::from_str also takes "inf" and "nan", which are not numbers here
    if !text
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'))
    {
        return f64::NAN;
    }

    text.parse::<f64>().unwrap_or(f64::NAN)
}

fn marker_version(comment: &str, re: &Regex) -> Option<u32> {
    re.captures(comment)?.get(1)?.as_str().parse().ok()
}

/// Extract `[DEFAULT: value]` or `[DEFAULT: value FF<N>+]`
///
/// A value that is neither a boolean, a quoted string nor a number is
/// dropped along with the whole default.
fn parse_default(comment: &str) -> Option<DefaultAnnotation> {
    let captures = default_value_re().captures(comment)?;
    let value = parse_value(captures.get(1)?.as_str());
    if value.is_nan() {
        return None;
    }

    let version = captures.get(3).and_then(|v| v.as_str().parse().ok());
    Some(DefaultAnnotation { value, version })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_boolean_with_custom_and_hidden() {
        let result = parse_user_prefs(r#"user_pref("k.v", true); // [CUSTOM PREF] [HIDDEN PREF]"#);
        assert_eq!(
            result,
            vec![AnnotatedPref {
                key: "k.v".to_string(),
                value: PrefValue::Bool(true),
                version_added: None,
                version_removed: None,
                custom: true,
                hidden: true,
                default: None,
            }]
        );
    }

    #[test]
    fn test_parse_default_with_version() {
        let result = parse_user_prefs(r#"user_pref("k", 1); // [DEFAULT: "hello" FF138+]"#);
        assert_eq!(result[0].value, PrefValue::int(1));
        assert_eq!(
            result[0].default,
            Some(DefaultAnnotation {
                value: PrefValue::string("hello"),
                version: Some(138),
            })
        );
    }

    #[test]
    fn test_parse_key_with_mixed_quotes() {
        let result = parse_user_prefs(r#"user_pref("mixed.key', 1); // [FF140+]"#);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].key, "mixed.key");
        assert_eq!(result[0].version_added, Some(140));
    }

    #[test]
    fn test_parse_default_without_version() {
        let result = parse_user_prefs(r#"user_pref("k", 1); // [DEFAULT: false]"#);
        assert_eq!(
            result[0].default,
            Some(DefaultAnnotation {
                value: PrefValue::Bool(false),
                version: None,
            })
        );
    }

    #[test]
    fn test_parse_default_numeric() {
        let result = parse_user_prefs(r#"user_pref("k", 0); // [DEFAULT: -1 FF130+]"#);
        let default = result[0].default.as_ref().unwrap();
        assert_eq!(default.value, PrefValue::int(-1));
        assert_eq!(default.version, Some(130));
    }

    #[test]
    fn test_parse_default_unquoted_text_dropped() {
        let result = parse_user_prefs(r#"user_pref("k", "x"); // [DEFAULT: abc]"#);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].default, None);
    }

    #[test]
    fn test_parse_default_empty_string() {
        let result = parse_user_prefs(r#"user_pref("k", "x"); // [DEFAULT: ""]"#);
        assert_eq!(result[0].default.as_ref().unwrap().value, PrefValue::string(""));
    }

    #[test]
    fn test_parse_version_markers() {
        let result = parse_user_prefs(r#"user_pref("test.pref", false); // [FF91+] [FF100-]"#);
        assert_eq!(result[0].version_added, Some(91));
        assert_eq!(result[0].version_removed, Some(100));
        assert!(!result[0].custom);
        assert!(!result[0].hidden);
    }

    #[test]
    fn test_parse_markers_any_order() {
        let result = parse_user_prefs(
            r#"user_pref("p", 2); // [DEFAULT: 1 FF125+] [HIDDEN PREF] [FF120+]"#,
        );
        assert_eq!(result[0].version_added, Some(120));
        assert!(result[0].hidden);
        assert_eq!(result[0].default.as_ref().unwrap().version, Some(125));
    }

    #[test]
    fn test_parse_no_markers() {
        let result = parse_user_prefs(r#"user_pref("security.OCSP.require", true);"#);
        assert_eq!(
            result,
            vec![AnnotatedPref::new("security.OCSP.require", true)]
        );
    }

    #[test]
    fn test_parse_string_values() {
        let result = parse_user_prefs(
            r#"
            user_pref("app.normandy.api_url", "");
            user_pref('breakpad.reportURL', '');
            user_pref("intl.accept_languages", "en-US, en");
            "#,
        );
        assert_eq!(result.len(), 3);
        assert_eq!(result[0].value, PrefValue::string(""));
        assert_eq!(result[1].value, PrefValue::string(""));
        assert_eq!(result[2].value, PrefValue::string("en-US, en"));
    }

    #[test]
    fn test_parse_multiple_in_order() {
        let result = parse_user_prefs(
            r#"
            user_pref("first.pref", true);
            user_pref("second.pref", 123);
            user_pref("first.pref", false);
            "#,
        );
        let keys: Vec<&str> = result.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, vec!["first.pref", "second.pref", "first.pref"]);
        assert_eq!(result[1].value, PrefValue::int(123));
    }

    #[test]
    fn test_parse_empty_document() {
        assert!(parse_user_prefs("").is_empty());
        assert!(parse_user_prefs(r#"console.log("no prefs here");"#).is_empty());
    }

    #[test]
    fn test_parse_value_forms() {
        assert_eq!(parse_value(" true "), PrefValue::Bool(true));
        assert_eq!(parse_value("false"), PrefValue::Bool(false));
        assert_eq!(parse_value("'single'"), PrefValue::string("single"));
        assert_eq!(parse_value(r#""no \"escape\" processing""#), PrefValue::string(r#"no \"escape\" processing"#));
        assert_eq!(parse_value("1.5"), PrefValue::Number(1.5));
        assert_eq!(parse_value("-2"), PrefValue::int(-2));
        assert_eq!(parse_value("+7"), PrefValue::int(7));
        assert_eq!(parse_value("1e3"), PrefValue::int(1000));
        assert_eq!(parse_value("0x10"), PrefValue::int(16));
        assert!(parse_value("abc").is_nan());
        assert!(parse_value("inf").is_nan());
        assert!(parse_value("\"").is_nan());
        assert!(parse_value("\"mismatched'").is_nan());
    }

    #[test]
    fn test_parse_version_overflow_is_absent() {
        let result = parse_user_prefs(r#"user_pref("p", 1); // [FF99999999999+]"#);
        assert_eq!(result[0].version_added, None);
    }

    #[test]
    fn test_parse_true_string_is_not_bool() {
        let result = parse_user_prefs(r#"user_pref("p", "true"); // [DEFAULT: "1"]"#);
        assert_eq!(result[0].value, PrefValue::string("true"));
        assert_eq!(result[0].default.as_ref().unwrap().value, PrefValue::string("1"));
    }
}
