//! Legacy flat filter syntax adapter (spec §4.1 legacy syntax table).
//!
//! Rewrites the old `key:"value"` flag syntax into the current expression
//! grammar before lexing, so both syntaxes compile through the same path.
//! Grounded on `decision/src/custom_formats.rs`'s use of `regex::Regex` for
//! title-pattern rewriting.

use once_cell::sync::Lazy;
use regex::Regex;

static TAG_NEG: Lazy<Regex> = Lazy::new(|| Regex::new(r#"tag!:"([^"]*)""#).unwrap());
static TAG_POS: Lazy<Regex> = Lazy::new(|| Regex::new(r#"tag:"([^"]*)""#).unwrap());
static WATCHED_BY_NEG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"watched_by!:"([^"]*)""#).unwrap());
static WATCHED_BY_POS: Lazy<Regex> = Lazy::new(|| Regex::new(r#"watched_by:"([^"]*)""#).unwrap());
static WATCH_COUNT_BY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"watch_count_by:"([^"]*)"\s*(>=|<=|==|!=|>|<)\s*(\d+)"#).unwrap());
static WATCHED_BOOL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"watched:(true|false)"#).unwrap());
static WATCH_COUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"watch_count:\s*(>=|<=|==|!=|>|<)\s*(\d+)"#).unwrap());
static ADDED_BEFORE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"added_before:"([^"]*)""#).unwrap());
static ADDED_AFTER: Lazy<Regex> = Lazy::new(|| Regex::new(r#"added_after:"([^"]*)""#).unwrap());
static IMPORTED_BEFORE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"imported_before:"([^"]*)""#).unwrap());
static IMPORTED_AFTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"imported_after:"([^"]*)""#).unwrap());
static AND_KW: Lazy<Regex> = Lazy::new(|| Regex::new(r#"\bAND\b"#).unwrap());
static OR_KW: Lazy<Regex> = Lazy::new(|| Regex::new(r#"\bOR\b"#).unwrap());
static NOT_KW: Lazy<Regex> = Lazy::new(|| Regex::new(r#"\bNOT\b"#).unwrap());

/// Heuristic: a source string is treated as legacy syntax if it contains
/// any of the old flag keys. Current-syntax expressions never contain a
/// bare `key:"..."` pair, so this never misfires on the new grammar.
pub fn looks_legacy(source: &str) -> bool {
    [
        "tag:", "tag!:", "watched_by:", "watched_by!:", "watch_count_by:", "watched:",
        "watch_count:", "added_before:", "added_after:", "imported_before:", "imported_after:",
    ]
    .iter()
    .any(|needle| source.contains(needle))
}

/// Rewrites legacy syntax into the current expression grammar. Idempotent:
/// running it twice on already-rewritten output is a no-op, since none of
/// the replacement patterns match the rewritten text.
pub fn rewrite(source: &str) -> String {
    let mut out = source.to_string();
    out = WATCHED_BY_NEG
        .replace_all(&out, r#"not watchedBy("$1")"#)
        .into_owned();
    out = WATCHED_BY_POS
        .replace_all(&out, r#"watchedBy("$1")"#)
        .into_owned();
    out = TAG_NEG.replace_all(&out, r#"not hasTag("$1")"#).into_owned();
    out = TAG_POS.replace_all(&out, r#"hasTag("$1")"#).into_owned();
    out = WATCH_COUNT_BY
        .replace_all(&out, r#"watchCountBy("$1") $2 $3"#)
        .into_owned();
    out = WATCHED_BOOL.replace_all(&out, "Watched == $1").into_owned();
    out = WATCH_COUNT
        .replace_all(&out, "WatchCount $1 $2")
        .into_owned();
    out = ADDED_BEFORE
        .replace_all(&out, r#"Added < parseDate("$1")"#)
        .into_owned();
    out = ADDED_AFTER
        .replace_all(&out, r#"Added > parseDate("$1")"#)
        .into_owned();
    out = IMPORTED_BEFORE
        .replace_all(&out, r#"FileImported < parseDate("$1")"#)
        .into_owned();
    out = IMPORTED_AFTER
        .replace_all(&out, r#"FileImported > parseDate("$1")"#)
        .into_owned();
    out = AND_KW.replace_all(&out, "and").into_owned();
    out = OR_KW.replace_all(&out, "or").into_owned();
    out = NOT_KW.replace_all(&out, "not").into_owned();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_tag_and_bool_and_keywords() {
        let legacy = r#"tag:"4k" AND watched:false AND NOT tag!:"kids""#;
        let rewritten = rewrite(legacy);
        assert_eq!(
            rewritten,
            r#"hasTag("4k") and Watched == false and not not hasTag("kids")"#
        );
    }

    #[test]
    fn rewrites_watch_count_by() {
        let rewritten = rewrite(r#"watch_count_by:"alice" >= 2"#);
        assert_eq!(rewritten, r#"watchCountBy("alice") >= 2"#);
    }

    #[test]
    fn rewrite_is_idempotent() {
        let once = rewrite(r#"tag:"4k""#);
        let twice = rewrite(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn detects_legacy_syntax() {
        assert!(looks_legacy(r#"tag:"4k""#));
        assert!(!looks_legacy(r#"hasTag("4k")"#));
    }
}
